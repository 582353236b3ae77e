// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Spike-timing-dependent plasticity windows and curve lookups.
//!
//! Key semantics:
//! - The STDP window is laid over the 64-bit recent-firing register. Bit
//!   position `post_window` is the postsynaptic firing cycle; bits above
//!   it are older (prefire side), bits below are newer (postfire side).
//! - `prefire[i]` is the curve value for a presynaptic arrival `i` ms
//!   before (or at) the postsynaptic firing; `postfire[i]` for an arrival
//!   `i + 1` ms after it, counting from the firing cycle.
//! - Per synapse and cycle, at most one curve sample applies: the firing
//!   closest to the postsynaptic spike wins, and an exact tie goes to the
//!   prefire side.
//!
//! [`StdpFunction`] is the user-supplied description; [`StdpProcess`] is
//! the finalized form sampled into the simulation's fixed-point format.

use crate::fixed::{self, Fix};
use crate::types::{Result, SimError};

/// Width of the recent-firing register, and so the widest STDP window.
pub const MAX_WINDOW: u32 = 64;

/// User-supplied STDP description: sampled curve plus weight bounds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StdpFunction {
    prefire: Vec<f32>,
    postfire: Vec<f32>,
    min_weight: f32,
    max_weight: f32,
}

impl StdpFunction {
    /// Validate and build an STDP function.
    ///
    /// `prefire` and `postfire` sample the curve at integer millisecond
    /// offsets starting closest to the postsynaptic firing. Requires
    /// `prefire.len() + postfire.len() <= 64`, a non-empty window,
    /// `min_weight <= 0` and `max_weight >= 0`.
    pub fn new(
        prefire: Vec<f32>,
        postfire: Vec<f32>,
        min_weight: f32,
        max_weight: f32,
    ) -> Result<Self> {
        let pre = prefire.len();
        let post = postfire.len();
        if pre + post == 0 {
            return Err(SimError::InvalidStdpFunction(
                "window is empty: prefire and postfire both have zero samples".into(),
            ));
        }
        if pre + post > MAX_WINDOW as usize {
            return Err(SimError::InvalidStdpFunction(format!(
                "window of {} samples exceeds the {}-cycle firing register",
                pre + post,
                MAX_WINDOW
            )));
        }
        if post > (MAX_WINDOW - 1) as usize {
            return Err(SimError::InvalidStdpFunction(format!(
                "postfire window of {} samples leaves no register bit for the firing cycle",
                post
            )));
        }
        if !(min_weight <= 0.0) {
            return Err(SimError::InvalidStdpFunction(format!(
                "min_weight {} must be <= 0",
                min_weight
            )));
        }
        if !(max_weight >= 0.0) {
            return Err(SimError::InvalidStdpFunction(format!(
                "max_weight {} must be >= 0",
                max_weight
            )));
        }
        if prefire.iter().chain(postfire.iter()).any(|v| !v.is_finite()) {
            return Err(SimError::InvalidStdpFunction(
                "curve samples must be finite".into(),
            ));
        }
        Ok(Self {
            prefire,
            postfire,
            min_weight,
            max_weight,
        })
    }

    pub fn pre_window(&self) -> u32 {
        self.prefire.len() as u32
    }

    pub fn post_window(&self) -> u32 {
        self.postfire.len() as u32
    }

    pub fn min_weight(&self) -> f32 {
        self.min_weight
    }

    pub fn max_weight(&self) -> f32 {
        self.max_weight
    }
}

/// STDP function finalized against a concrete fixed-point format.
///
/// Carries the derived bit masks and the curve sampled in fixed point, so
/// the per-cycle accumulation works purely on integers.
#[derive(Debug, Clone)]
pub struct StdpProcess {
    prefire_fx: Vec<Fix>,
    postfire_fx: Vec<Fix>,
    pre_mask: u64,
    post_mask: u64,
    post_window: u32,
    min_weight: f32,
    max_weight: f32,
}

impl StdpProcess {
    pub fn new(function: &StdpFunction, fbits: u32) -> Self {
        let post_window = function.post_window();

        let mut pre_mask = 0u64;
        for (i, &value) in function.prefire.iter().enumerate() {
            if value != 0.0 {
                pre_mask |= 1u64 << (post_window + i as u32);
            }
        }
        let mut post_mask = 0u64;
        for (i, &value) in function.postfire.iter().enumerate() {
            if value != 0.0 {
                post_mask |= 1u64 << (post_window - 1 - i as u32);
            }
        }

        Self {
            prefire_fx: function
                .prefire
                .iter()
                .map(|&v| fixed::to_fix(v, fbits))
                .collect(),
            postfire_fx: function
                .postfire
                .iter()
                .map(|&v| fixed::to_fix(v, fbits))
                .collect(),
            pre_mask,
            post_mask,
            post_window,
            min_weight: function.min_weight,
            max_weight: function.max_weight,
        }
    }

    /// Register bit marking a postsynaptic firing in the middle of the
    /// window, i.e. `post_window` cycles ago.
    pub fn post_bit(&self) -> u64 {
        1u64 << self.post_window
    }

    pub fn min_weight(&self) -> f32 {
        self.min_weight
    }

    pub fn max_weight(&self) -> f32 {
        self.max_weight
    }

    /// Smallest dt with a prefire-side arrival, if any.
    ///
    /// `arrivals` is the presynaptic firing register shifted by the
    /// synapse delay, so bit `post_window + dt` is an arrival dt cycles
    /// before the postsynaptic firing.
    pub fn closest_pre(&self, arrivals: u64) -> Option<u32> {
        let valid = arrivals & self.pre_mask;
        if valid == 0 {
            None
        } else {
            Some((valid >> self.post_window).trailing_zeros())
        }
    }

    /// Smallest dt with a postfire-side arrival, if any.
    ///
    /// Bit `post_window - 1 - dt` is an arrival dt + 1 cycles after the
    /// postsynaptic firing; the closest one is the highest set bit.
    pub fn closest_post(&self, arrivals: u64) -> Option<u32> {
        let valid = arrivals & self.post_mask;
        if valid == 0 || self.post_window == 0 {
            None
        } else {
            Some((valid << (MAX_WINDOW - self.post_window)).leading_zeros())
        }
    }

    pub fn lookup_pre(&self, dt: u32) -> Fix {
        self.prefire_fx[dt as usize]
    }

    pub fn lookup_post(&self, dt: u32) -> Fix {
        self.postfire_fx[dt as usize]
    }

    /// The single curve sample that applies for this arrival pattern:
    /// closest firing wins, exact ties go to the prefire side. Zero when
    /// no masked arrival exists.
    pub fn weight_delta(&self, arrivals: u64) -> Fix {
        match (self.closest_pre(arrivals), self.closest_post(arrivals)) {
            (Some(pre_dt), Some(post_dt)) => {
                if pre_dt <= post_dt {
                    self.lookup_pre(pre_dt)
                } else {
                    self.lookup_post(post_dt)
                }
            }
            (Some(pre_dt), None) => self.lookup_pre(pre_dt),
            (None, Some(post_dt)) => self.lookup_post(post_dt),
            (None, None) => 0,
        }
    }
}
