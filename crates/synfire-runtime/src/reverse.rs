// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Reverse matrix: incoming plastic synapses per target neuron.
//!
//! Built from the plastic subset only; non-plastic synapses are never
//! indexed here. Entries are stored CSR-style by local target index, each
//! carrying enough of a forward reference (source, delay, row offset) to
//! locate the weight slot in the forward matrix. A fixed-point
//! accumulator parallel to the entries holds pending STDP weight deltas;
//! the shape is read-only after finalize, only the accumulator mutates.

use synfire_neural::fixed::Fix;

/// One incoming plastic synapse of a target.
#[derive(Debug, Clone, Copy)]
pub struct ReverseEntry {
    /// Local index of the presynaptic neuron.
    pub source: u32,
    pub delay: u32,
    /// Position of the forward terminal within row (source, delay).
    pub row_offset: u32,
    /// Sign class fixed at finalize from the construction-time weight;
    /// determines which STDP bound applies.
    pub inhibitory: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ReverseMatrix {
    /// CSR offsets, `target_slots + 1` entries.
    offsets: Vec<usize>,
    entries: Vec<ReverseEntry>,
    /// Pending weight deltas, parallel to `entries`.
    acc: Vec<Fix>,
}

impl ReverseMatrix {
    pub(crate) fn from_parts(offsets: Vec<usize>, entries: Vec<ReverseEntry>) -> Self {
        let acc = vec![0; entries.len()];
        Self {
            offsets,
            entries,
            acc,
        }
    }

    /// Incoming plastic synapses of a local target.
    #[inline(always)]
    pub fn incoming(&self, target_local: usize) -> &[ReverseEntry] {
        &self.entries[self.offsets[target_local]..self.offsets[target_local + 1]]
    }

    /// Entry-index range of a local target, for accumulator addressing.
    #[inline(always)]
    pub fn incoming_range(&self, target_local: usize) -> core::ops::Range<usize> {
        self.offsets[target_local]..self.offsets[target_local + 1]
    }

    #[inline(always)]
    pub fn entry(&self, index: usize) -> &ReverseEntry {
        &self.entries[index]
    }

    /// Add a pending delta for one entry (saturating; deltas share the
    /// weight format's headroom).
    #[inline(always)]
    pub fn add_delta(&mut self, index: usize, delta: Fix) {
        self.acc[index] = self.acc[index].saturating_add(delta);
    }

    /// Read and clear one entry's pending delta.
    #[inline(always)]
    pub fn take_delta(&mut self, index: usize) -> Fix {
        core::mem::take(&mut self.acc[index])
    }

    /// Clear all pending deltas without reading them.
    pub fn clear_deltas(&mut self) {
        self.acc.fill(0);
    }

    /// Total number of plastic synapses indexed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of local target slots covered.
    pub fn target_slots(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    #[cfg(test)]
    pub(crate) fn delta(&self, index: usize) -> Fix {
        self.acc[index]
    }
}
