// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Membrane update.
//!
//! Consumes the current accumulator (zeroing it), adds Gaussian thalamic
//! noise where configured, integrates the Izhikevich dynamics in four
//! 0.25 ms sub-steps, ORs in forced firings, shifts the recent-firing
//! register and applies the after-spike reset.
//!
//! The register shift happens here, after delivery has read the previous
//! cycle's history; the STDP accumulator runs after the shift and sees
//! the updated register.
//!
//! Every neuron's update is independent (state, RNG and history are all
//! per-neuron), so the parallel path is a plain zipped iteration over the
//! columns; it computes exactly what the sequential path computes.

use rayon::prelude::*;

use synfire_neural::fixed::{self, Fix};
use synfire_neural::models::{advance_membrane, reset_after_fire};
use synfire_neural::rng::NeuronRng;
use synfire_runtime::NeuronStore;

/// Below this many neuron slots the sequential path wins.
const PAR_THRESHOLD: usize = 4096;

/// Advance every neuron by one cycle.
pub fn update(
    store: &mut NeuronStore,
    history: &mut [u64],
    current: &mut [Fix],
    fired: &mut [bool],
    fstim: &[bool],
    rngs: &mut [NeuronRng],
    fbits: u32,
    pool: Option<&rayon::ThreadPool>,
) {
    let NeuronStore {
        a,
        b,
        c,
        d,
        sigma,
        u,
        v,
        valid,
    } = store;
    let (a, b, c, d) = (a.as_slice(), b.as_slice(), c.as_slice(), d.as_slice());
    let sigma = sigma.as_slice();
    let valid = valid.as_slice();

    match pool {
        Some(pool) if valid.len() >= PAR_THRESHOLD => pool.install(|| {
            v.par_iter_mut()
                .zip(u.par_iter_mut())
                .zip(fired.par_iter_mut())
                .zip(history.par_iter_mut())
                .zip(rngs.par_iter_mut())
                .zip(current.par_iter_mut())
                .enumerate()
                .for_each(|(n, (((((v_n, u_n), fired_n), history_n), rng_n), current_n))| {
                    update_one(
                        a[n], b[n], c[n], d[n], sigma[n], valid[n], fstim[n], v_n, u_n, fired_n,
                        history_n, rng_n, current_n, fbits,
                    );
                })
        }),
        _ => {
            for n in 0..valid.len() {
                update_one(
                    a[n],
                    b[n],
                    c[n],
                    d[n],
                    sigma[n],
                    valid[n],
                    fstim[n],
                    &mut v[n],
                    &mut u[n],
                    &mut fired[n],
                    &mut history[n],
                    &mut rngs[n],
                    &mut current[n],
                    fbits,
                );
            }
        }
    }
}

#[inline(always)]
#[allow(clippy::too_many_arguments)]
fn update_one(
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    sigma: f32,
    valid: bool,
    forced: bool,
    v: &mut f32,
    u: &mut f32,
    fired: &mut bool,
    history: &mut u64,
    rng: &mut NeuronRng,
    current: &mut Fix,
    fbits: u32,
) {
    if !valid {
        *fired = false;
        return;
    }

    let mut i_total = fixed::to_float(*current, fbits);
    *current = 0;
    if sigma != 0.0 {
        i_total += sigma * rng.gaussian();
    }

    let mut has_fired = advance_membrane(a, b, v, u, i_total);
    has_fired |= forced;
    *history = (*history << 1) | u64::from(has_fired);
    if has_fired {
        reset_after_fire(c, d, v, u);
    }
    debug_assert!(
        v.is_finite() && u.is_finite(),
        "membrane state became non-finite"
    );
    *fired = has_fired;
}
