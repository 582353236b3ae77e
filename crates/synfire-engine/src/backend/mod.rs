// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Simulation Backend Abstraction
//!
//! A finalized network runs behind the [`SimulationBackend`] trait so the
//! stepping API stays independent of the compute substrate. This build
//! carries the CPU backend; asking for CUDA fails cleanly at creation
//! time rather than at first use.
//!
//! [`create`] is the sole factory: it finalizes the builder, validates
//! the configuration against the frozen network and returns a boxed
//! backend.

mod cpu;

pub use cpu::CpuBackend;

use tracing::debug;

use synfire_neural::types::{NeuronId, Result, SimError, SynapseId};
use synfire_runtime::Network;

use crate::config::{BackendType, SimulationConfig};

/// One recorded firing: which neuron fired at which cycle (in simulated
/// milliseconds since the last timer reset).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiringEvent {
    pub cycle: u64,
    pub neuron: NeuronId,
}

/// Drained firing history returned by
/// [`SimulationBackend::read_firing`].
#[derive(Debug, Clone, Default)]
pub struct FiringBatch {
    /// Number of cycles the batch spans (since the previous drain).
    pub cycles: u64,
    /// Firings in chronological order.
    pub events: Vec<FiringEvent>,
}

/// A running simulation.
///
/// `step` is the only operation that advances simulated time; it runs to
/// completion before returning and no operation yields control mid-step.
/// For a fixed seed, input sequence and thread count, outputs are
/// deterministic; this implementation is additionally bit-identical
/// across thread counts while the current accumulator never saturates.
pub trait SimulationBackend: Send {
    /// Concrete backend and resolved resources, for logging.
    fn description(&self) -> &str;

    /// Advance one millisecond. Neurons listed in `fstim` are forced to
    /// fire this cycle regardless of membrane state. Returns the indices
    /// of all neurons that fired.
    fn step(&mut self, fstim: &[NeuronId]) -> Result<Vec<NeuronId>>;

    /// Fold accumulated STDP deltas into the plastic weights, scaled by
    /// `reward`. A reward of zero clears the accumulators without
    /// changing any weight. No-op when STDP is not configured.
    fn apply_stdp(&mut self, reward: f32) -> Result<()>;

    fn neuron_count(&self) -> u32;

    /// Current membrane potential of one neuron.
    fn get_membrane_potential(&self, neuron: NeuronId) -> Result<f32>;

    /// Ids of all synapses leaving `source`, in insertion order.
    fn get_synapses_of(&self, source: NeuronId) -> Result<Vec<SynapseId>>;

    fn get_targets(&self, ids: &[SynapseId]) -> Result<Vec<NeuronId>>;
    fn get_delays(&self, ids: &[SynapseId]) -> Result<Vec<u32>>;
    fn get_weights(&self, ids: &[SynapseId]) -> Result<Vec<f32>>;
    fn get_plastic(&self, ids: &[SynapseId]) -> Result<Vec<bool>>;

    /// Drain the buffered firing history accumulated since the previous
    /// drain (or since creation).
    fn read_firing(&mut self) -> FiringBatch;

    /// Simulated milliseconds since the last timer reset.
    fn elapsed_simulation(&self) -> u64;

    /// Wallclock milliseconds since the last timer reset.
    fn elapsed_wallclock(&self) -> u64;

    fn reset_timer(&mut self);

    /// Number of saturated current additions since creation. Nonzero
    /// means the fixed-point headroom was exceeded and sums silently
    /// clipped.
    fn saturation_count(&self) -> u64;
}

impl std::fmt::Debug for dyn SimulationBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Build a simulation from a network under construction.
///
/// Finalizes the builder (leaving it usable on failure) and validates
/// plastic weights against the STDP bounds when STDP is configured.
pub fn create(
    network: &Network,
    config: &SimulationConfig,
) -> Result<Box<dyn SimulationBackend>> {
    match config.backend() {
        BackendType::Cpu { threads } => {
            let backend = CpuBackend::new(network, config, threads)?;
            debug!(description = backend.description(), "backend created");
            Ok(Box::new(backend))
        }
        BackendType::Cuda { device } => Err(SimError::Unsupported(format!(
            "CUDA backend (device {}) is not compiled into this build",
            device
        ))),
    }
}
