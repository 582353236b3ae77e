// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! CPU backend.
//!
//! Owns the frozen network plus all per-cycle state: the recent-firing
//! registers, the current accumulator, the per-neuron RNGs and the
//! firing buffer. A step runs deliver -> update -> STDP accumulate; the
//! register shift inside update separates the two history views
//! (delivery reads the previous cycle's bits, STDP reads the shifted
//! ones).

use synfire_neural::fixed::{self, Fix};
use synfire_neural::rng::NeuronRng;
use synfire_neural::stdp::StdpProcess;
use synfire_neural::types::{NeuronId, Result, SimError, SynapseId};
use synfire_runtime::{FrozenNetwork, Network};

use crate::config::SimulationConfig;
use crate::timer::Timer;
use crate::{delivery, dynamics, stdp_engine};

use super::{FiringBatch, FiringEvent, SimulationBackend};

pub struct CpuBackend {
    description: String,
    net: FrozenNetwork,
    stdp: Option<StdpProcess>,
    pool: Option<rayon::ThreadPool>,

    /// Recent-firing shift register per local neuron slot.
    history: Vec<u64>,
    /// Accumulated input current per local neuron slot, zeroed by the
    /// membrane update each cycle.
    current: Vec<Fix>,
    fired: Vec<bool>,
    fstim: Vec<bool>,
    rngs: Vec<NeuronRng>,

    firing_buffer: Vec<FiringEvent>,
    last_flush: u64,
    saturations: u64,
    timer: Timer,
}

impl CpuBackend {
    pub(crate) fn new(network: &Network, config: &SimulationConfig, threads: i32) -> Result<Self> {
        let net = network.finalize()?;
        let slots = net.mapper.len();

        let stdp = config
            .stdp()
            .map(|function| StdpProcess::new(function, net.fractional_bits()));
        if let Some(process) = &stdp {
            validate_plastic_bounds(&net, process)?;
        }

        let thread_count = resolve_threads(threads);
        let pool = if thread_count > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(thread_count)
                    .build()
                    .map_err(|e| SimError::Unknown(format!("worker pool: {}", e)))?,
            )
        } else {
            None
        };

        let mut current = Vec::new();
        current
            .try_reserve_exact(slots)
            .map_err(|_| SimError::Allocation {
                what: "current accumulator",
                bytes: slots * core::mem::size_of::<Fix>(),
            })?;
        current.resize(slots, 0);

        // RNGs are seeded from global indices so the noise stream of a
        // neuron does not depend on which other neurons exist.
        let rngs = (0..slots)
            .map(|local| NeuronRng::from_index(net.mapper.global(local).0))
            .collect();

        Ok(Self {
            description: format!(
                "cpu ({} thread{})",
                thread_count,
                if thread_count == 1 { "" } else { "s" }
            ),
            net,
            stdp,
            pool,
            history: vec![0; slots],
            current,
            fired: vec![false; slots],
            fstim: vec![false; slots],
            rngs,
            firing_buffer: Vec::new(),
            last_flush: 0,
            saturations: 0,
            timer: Timer::start(),
        })
    }
}

fn resolve_threads(threads: i32) -> usize {
    if threads < 1 {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    } else {
        threads as usize
    }
}

/// Plastic weights must start within the STDP bounds; checked in fixed
/// point so the comparison matches what the simulation will store.
fn validate_plastic_bounds(net: &FrozenNetwork, process: &StdpProcess) -> Result<()> {
    let fbits = net.fractional_bits();
    let min_fx = fixed::to_fix(process.min_weight(), fbits);
    let max_fx = fixed::to_fix(process.max_weight(), fbits);
    for source_local in 0..net.mapper.len() {
        for info in net.forward.synapses_of(source_local) {
            if !info.plastic {
                continue;
            }
            let weight_fx = net.forward.weight_fx(source_local, info.delay, info.row_offset);
            if weight_fx < min_fx || weight_fx > max_fx {
                return Err(SimError::WeightOutOfBounds {
                    id: info.id,
                    weight: fixed::to_float(weight_fx, fbits),
                    min: process.min_weight(),
                    max: process.max_weight(),
                });
            }
        }
    }
    Ok(())
}

impl SimulationBackend for CpuBackend {
    fn description(&self) -> &str {
        &self.description
    }

    fn step(&mut self, fstim: &[NeuronId]) -> Result<Vec<NeuronId>> {
        // Resolve the stimulus fully before touching any state, so a bad
        // index leaves the simulation exactly as it was.
        let mut forced = Vec::with_capacity(fstim.len());
        for &neuron in fstim {
            forced.push(self.net.mapper.local(neuron)?);
        }
        for &local in &forced {
            self.fstim[local] = true;
        }

        self.saturations += delivery::deliver(
            &self.net.forward,
            &self.history,
            &mut self.current,
            self.pool.as_ref(),
        );

        let fbits = self.net.fractional_bits();
        dynamics::update(
            &mut self.net.neurons,
            &mut self.history,
            &mut self.current,
            &mut self.fired,
            &self.fstim,
            &mut self.rngs,
            fbits,
            self.pool.as_ref(),
        );

        if let Some(process) = &self.stdp {
            stdp_engine::accumulate(process, &self.history, &mut self.net.reverse);
        }

        let cycle = self.timer.elapsed_simulation();
        let mut fired_now = Vec::new();
        for (local, &has_fired) in self.fired.iter().enumerate() {
            if has_fired {
                let neuron = self.net.mapper.global(local);
                fired_now.push(neuron);
                self.firing_buffer.push(FiringEvent { cycle, neuron });
            }
        }

        self.timer.tick();
        for &local in &forced {
            self.fstim[local] = false;
        }
        Ok(fired_now)
    }

    fn apply_stdp(&mut self, reward: f32) -> Result<()> {
        // Without STDP configured this is a documented no-op.
        let Some(process) = &self.stdp else {
            return Ok(());
        };
        stdp_engine::apply(process, reward, &mut self.net.forward, &mut self.net.reverse);
        Ok(())
    }

    fn neuron_count(&self) -> u32 {
        self.net.neuron_count()
    }

    fn get_membrane_potential(&self, neuron: NeuronId) -> Result<f32> {
        let local = self.net.mapper.local(neuron)?;
        Ok(self.net.neurons.v[local])
    }

    fn get_synapses_of(&self, source: NeuronId) -> Result<Vec<SynapseId>> {
        let local = self.net.mapper.local(source)?;
        Ok(self
            .net
            .forward
            .synapses_of(local)
            .iter()
            .map(|info| info.id)
            .collect())
    }

    fn get_targets(&self, ids: &[SynapseId]) -> Result<Vec<NeuronId>> {
        ids.iter()
            .map(|&id| self.net.synapse(id).map(|(_, info)| info.target))
            .collect()
    }

    fn get_delays(&self, ids: &[SynapseId]) -> Result<Vec<u32>> {
        ids.iter()
            .map(|&id| self.net.synapse(id).map(|(_, info)| info.delay))
            .collect()
    }

    fn get_weights(&self, ids: &[SynapseId]) -> Result<Vec<f32>> {
        let fbits = self.net.fractional_bits();
        ids.iter()
            .map(|&id| {
                self.net.synapse(id).map(|(source_local, info)| {
                    fixed::to_float(
                        self.net
                            .forward
                            .weight_fx(source_local, info.delay, info.row_offset),
                        fbits,
                    )
                })
            })
            .collect()
    }

    fn get_plastic(&self, ids: &[SynapseId]) -> Result<Vec<bool>> {
        ids.iter()
            .map(|&id| self.net.synapse(id).map(|(_, info)| info.plastic))
            .collect()
    }

    fn read_firing(&mut self) -> FiringBatch {
        let now = self.timer.elapsed_simulation();
        let cycles = now.saturating_sub(self.last_flush);
        self.last_flush = now;
        FiringBatch {
            cycles,
            events: core::mem::take(&mut self.firing_buffer),
        }
    }

    fn elapsed_simulation(&self) -> u64 {
        self.timer.elapsed_simulation()
    }

    fn elapsed_wallclock(&self) -> u64 {
        self.timer.elapsed_wallclock()
    }

    fn reset_timer(&mut self) {
        self.timer.reset();
        self.last_flush = 0;
    }

    fn saturation_count(&self) -> u64 {
        self.saturations
    }
}
