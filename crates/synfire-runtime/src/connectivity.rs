// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Forward connectivity matrix.
//!
//! Key semantics:
//! - Dense row addressing: `rows[source_local * MAX_DELAY + (delay - 1)]`
//!   holds the contiguous terminals for that (source, delay) pair. Row
//!   access is O(1); a delivery scan is a linear walk.
//! - Insertion order within a row is preserved; it is the externally
//!   observable synapse-index order.
//! - A per-source delay-bit word (bit `d - 1` set iff any synapse of
//!   delay `d` exists) lets delivery skip empty delays without touching
//!   the rows.
//! - Terminals store local target indices and fixed-point weights; the
//!   parallel per-source [`SynapseInfo`] table keeps everything needed
//!   for introspection and for locating a weight slot from a synapse id.

use synfire_neural::fixed::Fix;
use synfire_neural::types::{NeuronId, Result, SimError, SynapseId};

/// Largest supported synapse delay in ms, sized so the recent-firing
/// window of a source fits in one 64-bit word.
pub const MAX_DELAY: u32 = 64;

/// One forward-matrix terminal: local target plus fixed-point weight.
#[derive(Debug, Clone, Copy)]
pub struct ForwardTerminal {
    pub target: u32,
    pub weight: Fix,
}

/// Per-synapse introspection record, ordinal-indexed per source.
#[derive(Debug, Clone, Copy)]
pub struct SynapseInfo {
    pub id: SynapseId,
    /// Global target index as passed at construction.
    pub target: NeuronId,
    pub delay: u32,
    pub plastic: bool,
    /// Position of the terminal within its (source, delay) row.
    pub row_offset: u32,
}

#[derive(Debug, Clone)]
pub struct ConnectivityMatrix {
    /// `neuron_slots * MAX_DELAY` rows, possibly empty.
    rows: Vec<Vec<ForwardTerminal>>,
    /// Outgoing-delay bits per local source.
    delay_bits: Vec<u64>,
    /// Introspection records per local source, in insertion order.
    aux: Vec<Vec<SynapseInfo>>,
    fbits: u32,
    max_delay: u32,
}

impl ConnectivityMatrix {
    pub(crate) fn from_parts(
        rows: Vec<Vec<ForwardTerminal>>,
        delay_bits: Vec<u64>,
        aux: Vec<Vec<SynapseInfo>>,
        fbits: u32,
        max_delay: u32,
    ) -> Self {
        debug_assert_eq!(rows.len(), delay_bits.len() * MAX_DELAY as usize);
        debug_assert_eq!(delay_bits.len(), aux.len());
        Self {
            rows,
            delay_bits,
            aux,
            fbits,
            max_delay,
        }
    }

    #[inline(always)]
    fn address_of(source_local: usize, delay: u32) -> usize {
        source_local * MAX_DELAY as usize + (delay - 1) as usize
    }

    /// Terminals of one (source, delay) row.
    #[inline(always)]
    pub fn row(&self, source_local: usize, delay: u32) -> &[ForwardTerminal] {
        &self.rows[Self::address_of(source_local, delay)]
    }

    /// Outgoing-delay bits for a local source.
    #[inline(always)]
    pub fn delay_bits(&self, source_local: usize) -> u64 {
        self.delay_bits[source_local]
    }

    /// Number of local source slots covered.
    pub fn source_slots(&self) -> usize {
        self.delay_bits.len()
    }

    /// Fraction width of the fixed-point weight format.
    pub fn fractional_bits(&self) -> u32 {
        self.fbits
    }

    /// Largest delay present in the network (0 when there are no
    /// synapses).
    pub fn max_delay(&self) -> u32 {
        self.max_delay
    }

    /// Delivery mask covering every deliverable spike age.
    pub fn valid_spikes_mask(&self) -> u64 {
        if self.max_delay >= 64 {
            u64::MAX
        } else {
            (1u64 << self.max_delay) - 1
        }
    }

    /// Fixed-point weight in a forward slot.
    #[inline(always)]
    pub fn weight_fx(&self, source_local: usize, delay: u32, row_offset: u32) -> Fix {
        self.rows[Self::address_of(source_local, delay)][row_offset as usize].weight
    }

    /// Overwrite a forward weight slot (plastic synapses only; callers
    /// uphold that).
    #[inline(always)]
    pub fn set_weight_fx(&mut self, source_local: usize, delay: u32, row_offset: u32, weight: Fix) {
        self.rows[Self::address_of(source_local, delay)][row_offset as usize].weight = weight;
    }

    /// Introspection records for a source, in insertion order.
    pub fn synapses_of(&self, source_local: usize) -> &[SynapseInfo] {
        &self.aux[source_local]
    }

    /// Resolve a synapse id's record given the source's local index.
    pub fn info(&self, source_local: usize, id: SynapseId) -> Result<&SynapseInfo> {
        self.aux[source_local]
            .get(id.ordinal() as usize)
            .ok_or(SimError::UnknownSynapse(id))
    }

    /// Total number of synapses.
    pub fn synapse_count(&self) -> u64 {
        self.aux.iter().map(|infos| infos.len() as u64).sum()
    }
}
