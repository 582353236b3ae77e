// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Neuron models
//!
//! The simulator integrates Izhikevich dynamics exclusively; other models
//! are out of scope by design.

pub mod izhikevich;

pub use izhikevich::{
    advance_membrane, reset_after_fire, IzhikevichParams, FIRING_THRESHOLD, SUBSTEPS, SUBSTEP_DT,
};
