// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Synfire Neural Computation (Platform-Agnostic)
//!
//! ALL neural computation in one place:
//! - **Types**: Core type definitions (`NeuronId`, `SynapseId`, errors)
//! - **Fixed**: `Q(31-f).f` fixed-point weights and saturating current sums
//! - **Rng**: Per-neuron deterministic RNG with Gaussian sampling
//! - **Models**: Izhikevich membrane dynamics
//! - **Stdp**: Spike-timing-dependent plasticity windows and curve lookups
//!
//! Everything here is pure computation over plain data; storage and
//! simulation orchestration live in `synfire-runtime` and
//! `synfire-engine`.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod fixed;
pub mod models;
pub mod rng;
pub mod stdp;
pub mod types;

pub use models::{advance_membrane, reset_after_fire, IzhikevichParams};
pub use rng::NeuronRng;
pub use stdp::{StdpFunction, StdpProcess};
pub use types::{ErrorKind, NeuronId, Result, SimError, SynapseId};
