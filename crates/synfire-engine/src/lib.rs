// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Synfire Engine
//!
//! Discrete-time spiking-neural-network simulation over a finalized
//! network: millisecond steps of spike delivery, sub-stepped Izhikevich
//! integration with thalamic noise, and optional STDP.
//!
//! ## Step anatomy
//! 1. **Deliver**: walk each source's recent-firing register against its
//!    outgoing-delay bits; accumulate fixed-point weights into the
//!    per-target current buffer.
//! 2. **Update**: integrate every neuron (4 x 0.25 ms), OR in forced
//!    firings, shift the firing registers, reset fired neurons.
//! 3. **Accumulate STDP** (when configured): correlate pre arrivals with
//!    the postsynaptic firing now in the middle of the window.
//!
//! `apply_stdp(reward)` folds the accumulated deltas into the plastic
//! weights under sign-preserving bounds; a zero reward clears them.
//!
//! ## Determinism
//! Fixed seed + fixed inputs + fixed thread count give identical output;
//! results are also bit-identical across thread counts while the
//! saturating current accumulator never saturates (partial sums combine
//! in a canonical order).

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod backend;
pub mod config;
pub mod delivery;
pub mod dynamics;
pub mod stdp_engine;
pub mod timer;

pub use backend::{create, CpuBackend, FiringBatch, FiringEvent, SimulationBackend};
pub use config::{BackendType, SimulationConfig};

// The construction-time API, re-exported so most callers need only this
// crate.
pub use synfire_neural::models::IzhikevichParams;
pub use synfire_neural::types::{ErrorKind, NeuronId, Result, SimError, SynapseId};
pub use synfire_runtime::Network;
