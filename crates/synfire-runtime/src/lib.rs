// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Synfire Runtime Storage
//!
//! Owns the data the simulation engine runs over:
//! - [`Network`]: mutable construction-time builder
//! - [`FrozenNetwork`]: immutable finalized form
//! - [`NeuronStore`]: struct-of-arrays neuron parameters and state
//! - [`ConnectivityMatrix`]: dense forward matrix indexed by
//!   (source, delay)
//! - [`ReverseMatrix`]: per-target incoming plastic synapses for STDP
//!
//! After [`Network::finalize`] the set of neurons, synapses, delays and
//! plastic flags is frozen; only plastic weights and neuron state change
//! during simulation.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod connectivity;
pub mod mapper;
pub mod network;
pub mod neuron_store;
pub mod reverse;

pub use connectivity::{ConnectivityMatrix, ForwardTerminal, SynapseInfo, MAX_DELAY};
pub use mapper::Mapper;
pub use network::{FrozenNetwork, Network};
pub use neuron_store::NeuronStore;
pub use reverse::{ReverseEntry, ReverseMatrix};
