// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Global-to-local neuron index mapping.
//!
//! User-visible neuron indices are arbitrary `u32`s. The local index
//! space is the offset range `[0, max_idx - min_idx]`; indices the user
//! never added are holes, marked invalid. All storage is local-indexed;
//! every public API value is a global index.

use synfire_neural::types::{NeuronId, Result, SimError};

#[derive(Debug, Clone)]
pub struct Mapper {
    min_idx: u32,
    valid: Vec<bool>,
    count: u32,
}

impl Mapper {
    /// Resolve the local index space from the set of global indices.
    pub fn from_globals<I: IntoIterator<Item = NeuronId>>(globals: I) -> Self {
        let mut iter = globals.into_iter();
        let Some(first) = iter.next() else {
            return Self {
                min_idx: 0,
                valid: Vec::new(),
                count: 0,
            };
        };
        let mut min = first.0;
        let mut max = first.0;
        let mut seen = vec![first.0];
        for id in iter {
            min = min.min(id.0);
            max = max.max(id.0);
            seen.push(id.0);
        }
        let mut valid = vec![false; (max - min) as usize + 1];
        for idx in &seen {
            valid[(idx - min) as usize] = true;
        }
        Self {
            min_idx: min,
            valid,
            count: seen.len() as u32,
        }
    }

    /// Dense local index for a global one; fails for unknown neurons.
    pub fn local(&self, global: NeuronId) -> Result<usize> {
        let offset = global
            .0
            .checked_sub(self.min_idx)
            .map(|o| o as usize)
            .ok_or(SimError::UnknownNeuron(global))?;
        if self.valid.get(offset).copied().unwrap_or(false) {
            Ok(offset)
        } else {
            Err(SimError::UnknownNeuron(global))
        }
    }

    /// Global index for a local one. Valid for any slot in range,
    /// including holes (used for hole-stable RNG seeding).
    pub fn global(&self, local: usize) -> NeuronId {
        NeuronId(self.min_idx + local as u32)
    }

    /// Whether a local slot holds a neuron.
    pub fn is_valid(&self, local: usize) -> bool {
        self.valid.get(local).copied().unwrap_or(false)
    }

    /// Size of the local index space, holes included.
    pub fn len(&self) -> usize {
        self.valid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }

    /// Number of neurons actually present.
    pub fn neuron_count(&self) -> u32 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_indices() {
        let m = Mapper::from_globals((0..5).map(NeuronId));
        assert_eq!(m.len(), 5);
        assert_eq!(m.neuron_count(), 5);
        assert_eq!(m.local(NeuronId(3)).unwrap(), 3);
        assert_eq!(m.global(3), NeuronId(3));
    }

    #[test]
    fn test_offset_and_holes() {
        let m = Mapper::from_globals([NeuronId(10), NeuronId(12), NeuronId(15)]);
        assert_eq!(m.len(), 6);
        assert_eq!(m.neuron_count(), 3);
        assert_eq!(m.local(NeuronId(10)).unwrap(), 0);
        assert_eq!(m.local(NeuronId(15)).unwrap(), 5);
        assert!(m.local(NeuronId(11)).is_err());
        assert!(m.local(NeuronId(9)).is_err());
        assert!(m.local(NeuronId(16)).is_err());
        assert!(m.is_valid(2));
        assert!(!m.is_valid(1));
    }

    #[test]
    fn test_empty() {
        let m = Mapper::from_globals(std::iter::empty::<NeuronId>());
        assert!(m.is_empty());
        assert_eq!(m.neuron_count(), 0);
        assert!(m.local(NeuronId(0)).is_err());
    }
}
