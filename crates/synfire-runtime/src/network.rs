// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Network construction.
//!
//! [`Network`] accumulates neurons and synapses in hash maps so the
//! population size need not be known up front; [`Network::finalize`]
//! resolves the dense local index space, validates every synapse
//! endpoint, chooses the fixed-point format from the largest weight and
//! assembles the forward and reverse matrices.
//!
//! Finalize is transactional: it borrows the builder, and on failure the
//! builder is left untouched and usable. Synapse terminals may refer to
//! neurons that have not been added yet; they are checked at finalize,
//! not at insertion.

use ahash::AHashMap;
use tracing::debug;

use synfire_neural::fixed;
use synfire_neural::models::IzhikevichParams;
use synfire_neural::types::{NeuronId, Result, SimError, SynapseId};

use crate::connectivity::{ConnectivityMatrix, ForwardTerminal, SynapseInfo, MAX_DELAY};
use crate::mapper::Mapper;
use crate::neuron_store::NeuronStore;
use crate::reverse::{ReverseEntry, ReverseMatrix};

#[derive(Debug, Clone, Copy)]
struct NeuronEntry {
    params: IzhikevichParams,
    u: f32,
    v: f32,
}

/// One synapse as recorded at insertion, ordinal-indexed per source.
#[derive(Debug, Clone, Copy)]
struct BuildRecord {
    target: u32,
    delay: u32,
    weight: f32,
    plastic: bool,
    /// Position within the (source, delay) row, assigned at insertion.
    row_offset: u32,
}

/// Per-source accumulator: rows keyed by delay referencing records by
/// ordinal, preserving insertion order within each row.
#[derive(Debug, Clone, Default)]
struct AxonBuilder {
    rows: AHashMap<u32, Vec<u32>>,
    records: Vec<BuildRecord>,
}

/// Mutable network under construction.
#[derive(Debug, Clone, Default)]
pub struct Network {
    neurons: AHashMap<u32, NeuronEntry>,
    axons: AHashMap<u32, AxonBuilder>,
    max_abs_weight: f32,
    max_delay: u32,
    synapse_count: u64,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one neuron. Fails if the index was already added.
    pub fn add_neuron(
        &mut self,
        idx: NeuronId,
        params: IzhikevichParams,
        u: f32,
        v: f32,
    ) -> Result<()> {
        if self.neurons.contains_key(&idx.0) {
            return Err(SimError::DuplicateNeuron(idx));
        }
        self.neurons.insert(idx.0, NeuronEntry { params, u, v });
        Ok(())
    }

    /// Add one synapse and return its id.
    ///
    /// The endpoints may refer to neurons not added yet; they are
    /// validated at finalize.
    pub fn add_synapse(
        &mut self,
        source: NeuronId,
        target: NeuronId,
        delay: u32,
        weight: f32,
        plastic: bool,
    ) -> Result<SynapseId> {
        if delay < 1 || delay > MAX_DELAY {
            return Err(SimError::InvalidDelay {
                delay,
                max: MAX_DELAY,
            });
        }
        let axon = self.axons.entry(source.0).or_default();
        let ordinal = axon.records.len() as u32;
        let row = axon.rows.entry(delay).or_default();
        let row_offset = row.len() as u32;
        row.push(ordinal);
        axon.records.push(BuildRecord {
            target: target.0,
            delay,
            weight,
            plastic,
            row_offset,
        });
        self.max_abs_weight = self.max_abs_weight.max(weight.abs());
        self.max_delay = self.max_delay.max(delay);
        self.synapse_count += 1;
        Ok(SynapseId::pack(source, ordinal))
    }

    /// Batched synapse insertion; all slices must have equal lengths.
    ///
    /// Validation happens before any insertion, so a failing batch leaves
    /// the builder unchanged.
    pub fn add_synapses(
        &mut self,
        source: NeuronId,
        targets: &[NeuronId],
        delays: &[u32],
        weights: &[f32],
        plastic: &[bool],
    ) -> Result<Vec<SynapseId>> {
        if targets.len() != delays.len()
            || targets.len() != weights.len()
            || targets.len() != plastic.len()
        {
            return Err(SimError::BatchLengthMismatch {
                targets: targets.len(),
                delays: delays.len(),
                weights: weights.len(),
                plastic: plastic.len(),
            });
        }
        if let Some(&delay) = delays.iter().find(|&&d| d < 1 || d > MAX_DELAY) {
            return Err(SimError::InvalidDelay {
                delay,
                max: MAX_DELAY,
            });
        }
        let mut ids = Vec::with_capacity(targets.len());
        for i in 0..targets.len() {
            ids.push(self.add_synapse(source, targets[i], delays[i], weights[i], plastic[i])?);
        }
        Ok(ids)
    }

    /// Number of distinct neuron indices added so far.
    pub fn neuron_count(&self) -> u32 {
        self.neurons.len() as u32
    }

    /// Number of synapses added so far.
    pub fn synapse_count(&self) -> u64 {
        self.synapse_count
    }

    /// Resolve indices, validate endpoints and assemble the immutable
    /// runtime form.
    pub fn finalize(&self) -> Result<FrozenNetwork> {
        let mapper = Mapper::from_globals(self.neurons.keys().map(|&idx| NeuronId(idx)));
        let slots = mapper.len();

        let mut neurons = NeuronStore::with_len(slots);
        for (&idx, entry) in &self.neurons {
            let local = mapper.local(NeuronId(idx))?;
            neurons.set(local, &entry.params, entry.u, entry.v);
        }

        // Validate every synapse endpoint before assembling anything.
        for (&source, axon) in &self.axons {
            mapper.local(NeuronId(source))?;
            for record in &axon.records {
                mapper.local(NeuronId(record.target))?;
            }
        }

        let fbits = fixed::fractional_bits(self.max_abs_weight);

        let row_count = slots * MAX_DELAY as usize;
        let mut rows: Vec<Vec<ForwardTerminal>> = Vec::new();
        rows.try_reserve_exact(row_count)
            .map_err(|_| SimError::Allocation {
                what: "forward matrix rows",
                bytes: row_count * core::mem::size_of::<Vec<ForwardTerminal>>(),
            })?;
        rows.resize_with(row_count, Vec::new);

        let mut delay_bits = vec![0u64; slots];
        let mut aux: Vec<Vec<SynapseInfo>> = vec![Vec::new(); slots];
        let mut incoming: Vec<Vec<ReverseEntry>> = vec![Vec::new(); slots];
        let mut plastic_count = 0u64;

        for source_local in 0..slots {
            let source = mapper.global(source_local);
            let Some(axon) = self.axons.get(&source.0) else {
                continue;
            };

            for (&delay, ordinals) in &axon.rows {
                let row = &mut rows[source_local * MAX_DELAY as usize + (delay - 1) as usize];
                row.reserve_exact(ordinals.len());
                for &ordinal in ordinals {
                    let record = &axon.records[ordinal as usize];
                    row.push(ForwardTerminal {
                        target: mapper.local(NeuronId(record.target))? as u32,
                        weight: fixed::to_fix(record.weight, fbits),
                    });
                }
                delay_bits[source_local] |= 1u64 << (delay - 1);
            }

            aux[source_local] = axon
                .records
                .iter()
                .enumerate()
                .map(|(ordinal, record)| SynapseInfo {
                    id: SynapseId::pack(source, ordinal as u32),
                    target: NeuronId(record.target),
                    delay: record.delay,
                    plastic: record.plastic,
                    row_offset: record.row_offset,
                })
                .collect();

            for record in &axon.records {
                if record.plastic {
                    let target_local = mapper.local(NeuronId(record.target))?;
                    incoming[target_local].push(ReverseEntry {
                        source: source_local as u32,
                        delay: record.delay,
                        row_offset: record.row_offset,
                        inhibitory: record.weight < 0.0,
                    });
                    plastic_count += 1;
                }
            }
        }

        let mut offsets = Vec::with_capacity(slots + 1);
        offsets.push(0);
        let mut entries = Vec::with_capacity(plastic_count as usize);
        for target_entries in incoming {
            entries.extend(target_entries);
            offsets.push(entries.len());
        }

        debug!(
            neurons = mapper.neuron_count(),
            synapses = self.synapse_count,
            plastic = plastic_count,
            fractional_bits = fbits,
            max_delay = self.max_delay,
            "network finalized"
        );

        Ok(FrozenNetwork {
            mapper,
            neurons,
            forward: ConnectivityMatrix::from_parts(rows, delay_bits, aux, fbits, self.max_delay),
            reverse: ReverseMatrix::from_parts(offsets, entries),
        })
    }
}

/// Immutable finalized network. Neuron state (`u`, `v`) and plastic
/// weights are the only parts that change afterwards, and only under the
/// simulation engine's control.
#[derive(Debug, Clone)]
pub struct FrozenNetwork {
    pub mapper: Mapper,
    pub neurons: NeuronStore,
    pub forward: ConnectivityMatrix,
    pub reverse: ReverseMatrix,
}

impl FrozenNetwork {
    pub fn neuron_count(&self) -> u32 {
        self.mapper.neuron_count()
    }

    pub fn fractional_bits(&self) -> u32 {
        self.forward.fractional_bits()
    }

    /// Resolve a synapse id to its source's local index and its record.
    pub fn synapse(&self, id: SynapseId) -> Result<(usize, &SynapseInfo)> {
        let source_local = self
            .mapper
            .local(id.source())
            .map_err(|_| SimError::UnknownSynapse(id))?;
        Ok((source_local, self.forward.info(source_local, id)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rs() -> IzhikevichParams {
        IzhikevichParams::regular_spiking()
    }

    fn two_neuron_network() -> Network {
        let mut net = Network::new();
        net.add_neuron(NeuronId(0), rs(), -13.0, -65.0).unwrap();
        net.add_neuron(NeuronId(1), rs(), -13.0, -65.0).unwrap();
        net
    }

    #[test]
    fn test_duplicate_neuron_rejected() {
        let mut net = two_neuron_network();
        let err = net.add_neuron(NeuronId(0), rs(), 0.0, 0.0).unwrap_err();
        assert!(matches!(err, SimError::DuplicateNeuron(NeuronId(0))));
        assert_eq!(net.neuron_count(), 2);
    }

    #[test]
    fn test_invalid_delay_leaves_builder_unchanged() {
        let mut net = two_neuron_network();
        for delay in [0, 65] {
            let err = net
                .add_synapse(NeuronId(0), NeuronId(1), delay, 1.0, false)
                .unwrap_err();
            assert!(matches!(err, SimError::InvalidDelay { .. }));
        }
        assert_eq!(net.synapse_count(), 0);
        assert!(net.finalize().is_ok());
    }

    #[test]
    fn test_batch_length_mismatch() {
        let mut net = two_neuron_network();
        let err = net
            .add_synapses(
                NeuronId(0),
                &[NeuronId(1)],
                &[1, 2],
                &[1.0],
                &[false],
            )
            .unwrap_err();
        assert!(matches!(err, SimError::BatchLengthMismatch { .. }));
        assert_eq!(net.synapse_count(), 0);
    }

    #[test]
    fn test_batch_bad_delay_inserts_nothing() {
        let mut net = two_neuron_network();
        let err = net
            .add_synapses(
                NeuronId(0),
                &[NeuronId(1), NeuronId(1)],
                &[1, 0],
                &[1.0, 2.0],
                &[false, false],
            )
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidDelay { delay: 0, .. }));
        assert_eq!(net.synapse_count(), 0);
    }

    #[test]
    fn test_finalize_is_transactional_on_unknown_target() {
        let mut net = two_neuron_network();
        net.add_synapse(NeuronId(0), NeuronId(7), 1, 1.0, false)
            .unwrap();
        let err = net.finalize().unwrap_err();
        assert!(matches!(err, SimError::UnknownNeuron(NeuronId(7))));

        // builder stays usable: add the missing neuron and retry
        net.add_neuron(NeuronId(7), rs(), -13.0, -65.0).unwrap();
        assert!(net.finalize().is_ok());
    }

    #[test]
    fn test_unknown_source_rejected_at_finalize() {
        let mut net = two_neuron_network();
        net.add_synapse(NeuronId(9), NeuronId(1), 1, 1.0, false)
            .unwrap();
        assert!(net.finalize().is_err());
    }

    #[test]
    fn test_forward_layout_preserves_insertion_order() {
        let mut net = two_neuron_network();
        net.add_neuron(NeuronId(2), rs(), -13.0, -65.0).unwrap();
        let a = net.add_synapse(NeuronId(0), NeuronId(1), 3, 1.0, false).unwrap();
        let b = net.add_synapse(NeuronId(0), NeuronId(2), 3, 2.0, false).unwrap();
        let c = net.add_synapse(NeuronId(0), NeuronId(1), 1, 3.0, true).unwrap();
        let frozen = net.finalize().unwrap();

        let row = frozen.forward.row(0, 3);
        assert_eq!(row.len(), 2);
        assert_eq!(row[0].target, 1);
        assert_eq!(row[1].target, 2);
        assert_eq!(frozen.forward.row(0, 1).len(), 1);
        assert_eq!(frozen.forward.delay_bits(0), (1 << 2) | (1 << 0));
        assert_eq!(frozen.forward.delay_bits(1), 0);

        let infos = frozen.forward.synapses_of(0);
        assert_eq!(infos.len(), 3);
        assert_eq!(infos[0].id, a);
        assert_eq!(infos[1].id, b);
        assert_eq!(infos[2].id, c);
        assert_eq!(infos[1].row_offset, 1);
        assert!(infos[2].plastic);
    }

    #[test]
    fn test_reverse_holds_only_plastic() {
        let mut net = two_neuron_network();
        net.add_synapse(NeuronId(0), NeuronId(1), 1, 1.0, false)
            .unwrap();
        net.add_synapse(NeuronId(0), NeuronId(1), 2, -2.0, true)
            .unwrap();
        net.add_synapse(NeuronId(1), NeuronId(0), 4, 3.0, true)
            .unwrap();
        let frozen = net.finalize().unwrap();

        assert_eq!(frozen.reverse.len(), 2);
        let incoming = frozen.reverse.incoming(1);
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].source, 0);
        assert_eq!(incoming[0].delay, 2);
        assert!(incoming[0].inhibitory);
        assert_eq!(frozen.reverse.incoming(0).len(), 1);
        assert!(!frozen.reverse.incoming(0)[0].inhibitory);
    }

    #[test]
    fn test_fractional_bits_follow_max_weight() {
        let mut net = two_neuron_network();
        net.add_synapse(NeuronId(0), NeuronId(1), 1, 20.0, false)
            .unwrap();
        net.add_synapse(NeuronId(1), NeuronId(0), 1, -0.5, false)
            .unwrap();
        let frozen = net.finalize().unwrap();
        // ceil(log2(20)) = 5 so 31 - 5 - 5 = 21
        assert_eq!(frozen.fractional_bits(), 21);
    }

    #[test]
    fn test_sparse_indices_round_trip() {
        let mut net = Network::new();
        net.add_neuron(NeuronId(100), rs(), -13.0, -65.0).unwrap();
        net.add_neuron(NeuronId(200), rs(), -13.0, -65.0).unwrap();
        let id = net
            .add_synapse(NeuronId(100), NeuronId(200), 5, 1.5, false)
            .unwrap();
        let frozen = net.finalize().unwrap();

        assert_eq!(frozen.neuron_count(), 2);
        let (source_local, info) = frozen.synapse(id).unwrap();
        assert_eq!(source_local, 0);
        assert_eq!(info.target, NeuronId(200));
        assert_eq!(info.delay, 5);

        let bad = frozen.synapse(SynapseId::pack(NeuronId(100), 9)).unwrap_err();
        assert!(matches!(bad, SimError::UnknownSynapse(_)));
    }

    #[test]
    fn test_empty_network_finalizes() {
        let frozen = Network::new().finalize().unwrap();
        assert_eq!(frozen.neuron_count(), 0);
        assert_eq!(frozen.forward.synapse_count(), 0);
    }
}
