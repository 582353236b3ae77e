// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for simulator operations.
//!
//! Every fallible operation returns [`SimError`]. Variants carry the
//! concrete values that violated a contract; [`SimError::kind`] maps each
//! variant onto the coarse taxonomy surfaced to callers.

use super::ids::{NeuronId, SynapseId};

#[derive(Debug, Clone, thiserror::Error)]
pub enum SimError {
    #[error("synapse delay {delay} outside [1, {max}]")]
    InvalidDelay { delay: u32, max: u32 },

    #[error("neuron {0} added twice")]
    DuplicateNeuron(NeuronId),

    #[error("neuron {0} does not exist")]
    UnknownNeuron(NeuronId),

    #[error("synapse {0} does not exist")]
    UnknownSynapse(SynapseId),

    #[error(
        "batch arrays must have equal lengths: targets={targets}, delays={delays}, weights={weights}, plastic={plastic}"
    )]
    BatchLengthMismatch {
        targets: usize,
        delays: usize,
        weights: usize,
        plastic: usize,
    },

    #[error("invalid STDP function: {0}")]
    InvalidStdpFunction(String),

    #[error("plastic synapse {id} weight {weight} outside STDP bounds [{min}, {max}]")]
    WeightOutOfBounds {
        id: SynapseId,
        weight: f32,
        min: f32,
        max: f32,
    },

    #[error("operation not supported: {0}")]
    Unsupported(String),

    #[error("failed to allocate {what} ({bytes} bytes)")]
    Allocation { what: &'static str, bytes: usize },

    #[error("internal invariant violated: {0}")]
    Logic(String),

    #[error("unknown failure: {0}")]
    Unknown(String),
}

/// Coarse failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Unsupported,
    Allocation,
    Logic,
    Unknown,
}

impl SimError {
    /// Which class of failure this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SimError::InvalidDelay { .. }
            | SimError::DuplicateNeuron(_)
            | SimError::UnknownNeuron(_)
            | SimError::UnknownSynapse(_)
            | SimError::BatchLengthMismatch { .. }
            | SimError::InvalidStdpFunction(_)
            | SimError::WeightOutOfBounds { .. } => ErrorKind::InvalidInput,
            SimError::Unsupported(_) => ErrorKind::Unsupported,
            SimError::Allocation { .. } => ErrorKind::Allocation,
            SimError::Logic(_) => ErrorKind::Logic,
            SimError::Unknown(_) => ErrorKind::Unknown,
        }
    }
}

pub type Result<T> = core::result::Result<T, SimError>;
