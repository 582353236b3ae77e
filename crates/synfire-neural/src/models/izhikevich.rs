// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Izhikevich Neuron Model
//!
//! ## Model Dynamics
//!
//! ```text
//! Membrane update (per 1 ms cycle, four 0.25 ms sub-steps):
//!     v' = v + dt * ((0.04*v + 5)*v + 140 - u + I)
//!     u' = u + dt * (a * (b*v' - u))
//!
//!     Where:
//!     - v = membrane potential (mV)
//!     - u = membrane recovery variable
//!     - I = synaptic current + thalamic noise for this cycle
//!
//! Firing check (after each sub-step):
//!     if v >= 30 mV: FIRE, skip remaining sub-steps this cycle
//!
//! After-spike reset:
//!     v <- c
//!     u <- u + d
//! ```
//!
//! A neuron fires at most once per cycle; the integrator stops early for
//! a fired neuron so the spike peak is not integrated past threshold.

/// Firing threshold in mV.
pub const FIRING_THRESHOLD: f32 = 30.0;

/// Number of integration sub-steps per 1 ms cycle.
pub const SUBSTEPS: u32 = 4;

/// Sub-step width in ms.
pub const SUBSTEP_DT: f32 = 0.25;

/// Izhikevich model parameters for one neuron.
///
/// `sigma` is the standard deviation of the per-cycle Gaussian thalamic
/// noise current; zero disables noise for the neuron.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IzhikevichParams {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub sigma: f32,
}

impl IzhikevichParams {
    pub fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self {
            a,
            b,
            c,
            d,
            sigma: 0.0,
        }
    }

    pub fn with_sigma(mut self, sigma: f32) -> Self {
        self.sigma = sigma;
        self
    }

    /// Regular spiking cortical excitatory cell.
    pub fn regular_spiking() -> Self {
        Self::new(0.02, 0.2, -65.0, 8.0)
    }

    /// Fast spiking cortical inhibitory interneuron.
    pub fn fast_spiking() -> Self {
        Self::new(0.1, 0.2, -65.0, 2.0)
    }

    /// Chattering cell.
    pub fn chattering() -> Self {
        Self::new(0.02, 0.2, -50.0, 2.0)
    }

    /// Conventional initial state: v at the reset potential, u = b*v.
    pub fn initial_state(&self) -> (f32, f32) {
        (self.b * self.c, self.c)
    }
}

impl Default for IzhikevichParams {
    fn default() -> Self {
        Self::regular_spiking()
    }
}

/// Advance one neuron by one 1 ms cycle under input current `i_total`.
///
/// Returns true iff the neuron crossed threshold during a sub-step.
/// State is left at the threshold-crossing values; the caller applies
/// [`reset_after_fire`] (after OR-ing in any forced firing).
#[inline(always)]
pub fn advance_membrane(a: f32, b: f32, v: &mut f32, u: &mut f32, i_total: f32) -> bool {
    let mut fired = false;
    for _ in 0..SUBSTEPS {
        if !fired {
            *v += SUBSTEP_DT * ((0.04 * *v + 5.0) * *v + 140.0 - *u + i_total);
            *u += SUBSTEP_DT * (a * (b * *v - *u));
            fired = *v >= FIRING_THRESHOLD;
        }
    }
    fired
}

/// After-spike reset: `v <- c`, `u <- u + d`.
#[inline(always)]
pub fn reset_after_fire(c: f32, d: f32, v: &mut f32, u: &mut f32) {
    *v = c;
    *u += d;
}
