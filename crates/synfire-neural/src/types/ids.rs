// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Identity types for neurons and synapses

use core::fmt;

/// Neuron index as assigned by the user at construction time.
///
/// Indices need not be contiguous; the runtime resolves them onto a dense
/// local index space when the network is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NeuronId(pub u32);

impl fmt::Display for NeuronId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Neuron({})", self.0)
    }
}

/// Opaque synapse identifier assigned at insertion.
///
/// Packs the source neuron index (high word) and a per-source insertion
/// ordinal (low word). The packing is an implementation detail; callers
/// should treat the value as opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SynapseId(pub u64);

impl SynapseId {
    pub(crate) const ORDINAL_BITS: u32 = 32;

    /// Pack a (source, per-source ordinal) pair.
    pub fn pack(source: NeuronId, ordinal: u32) -> Self {
        Self((u64::from(source.0) << Self::ORDINAL_BITS) | u64::from(ordinal))
    }

    /// Source neuron this synapse leaves from.
    pub fn source(self) -> NeuronId {
        NeuronId((self.0 >> Self::ORDINAL_BITS) as u32)
    }

    /// Insertion ordinal among the source's synapses.
    pub fn ordinal(self) -> u32 {
        (self.0 & 0xFFFF_FFFF) as u32
    }
}

impl fmt::Display for SynapseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Synapse({}:{})", self.source().0, self.ordinal())
    }
}
