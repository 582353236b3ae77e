// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Core type definitions

pub mod error;
pub mod ids;

pub use error::{ErrorKind, Result, SimError};
pub use ids::{NeuronId, SynapseId};
