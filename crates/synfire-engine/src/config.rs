// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Simulation configuration: backend choice and optional STDP.

use core::fmt;
use std::str::FromStr;

use synfire_neural::stdp::StdpFunction;
use synfire_neural::types::{Result, SimError};

/// Backend selection for [`crate::backend::create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// CPU backend. `threads < 1` means choose from hardware concurrency.
    Cpu { threads: i32 },
    /// CUDA backend; not compiled into this build and reported as
    /// unsupported at creation time.
    Cuda { device: i32 },
}

impl Default for BackendType {
    fn default() -> Self {
        Self::Cpu { threads: -1 }
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendType::Cpu { .. } => write!(f, "cpu"),
            BackendType::Cuda { .. } => write!(f, "cuda"),
        }
    }
}

impl FromStr for BackendType {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(BackendType::Cpu { threads: -1 }),
            "cuda" => Ok(BackendType::Cuda { device: 0 }),
            other => Err(SimError::Unsupported(format!(
                "unknown backend '{}'",
                other
            ))),
        }
    }
}

/// Configuration handed to the backend factory.
#[derive(Debug, Clone, Default)]
pub struct SimulationConfig {
    backend: BackendType,
    stdp: Option<StdpFunction>,
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable STDP with the given sampled curve and weight bounds.
    pub fn set_stdp_function(
        &mut self,
        prefire: Vec<f32>,
        postfire: Vec<f32>,
        min_weight: f32,
        max_weight: f32,
    ) -> Result<()> {
        self.stdp = Some(StdpFunction::new(prefire, postfire, min_weight, max_weight)?);
        Ok(())
    }

    /// Select the CPU backend. `threads = -1` picks the hardware
    /// concurrency at creation time.
    pub fn set_cpu_backend(&mut self, threads: i32) {
        self.backend = BackendType::Cpu { threads };
    }

    /// Select the CUDA backend; creation will fail cleanly since this
    /// build does not carry it.
    pub fn set_cuda_backend(&mut self, device: i32) {
        self.backend = BackendType::Cuda { device };
    }

    pub fn backend(&self) -> BackendType {
        self.backend
    }

    pub fn stdp(&self) -> Option<&StdpFunction> {
        self.stdp.as_ref()
    }

    /// Human-readable description of the configured backend.
    pub fn backend_description(&self) -> String {
        match self.backend {
            BackendType::Cpu { threads } if threads < 1 => "cpu (auto threads)".to_string(),
            BackendType::Cpu { threads } => format!("cpu ({} threads)", threads),
            BackendType::Cuda { device } => format!("cuda (device {})", device),
        }
    }
}
