// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Spike delivery.
//!
//! For every source, the recent-firing register is masked to the
//! deliverable age range and to the source's outgoing-delay bits; each
//! surviving bit names a delay whose forward row is walked, adding the
//! fixed-point weights into the per-target current accumulator with
//! saturating addition.
//!
//! Key semantics:
//! - A spike fired at cycle `t` reaches its targets at exactly `t + d`.
//! - Spikes older than the network's max delay stay in the register (the
//!   STDP window still needs them) but are masked out of delivery.
//! - The parallel path partitions sources into fixed-size chunks, each
//!   accumulating into its own buffer; partials are reduced in chunk
//!   order. The chunk size is independent of the thread count, so results
//!   are bit-identical across thread counts until saturation occurs.

use std::sync::OnceLock;

use rayon::prelude::*;
use tracing::trace;

use synfire_neural::fixed::{self, Fix};
use synfire_runtime::ConnectivityMatrix;

/// Sources per parallel chunk. Fixed (not derived from the thread count)
/// to keep the reduction order canonical.
const SOURCE_CHUNK: usize = 1024;

/// Below this many source slots the sequential path wins.
const PAR_THRESHOLD: usize = 4096;

/// Runtime-gated tracing for per-row delivery events.
/// Enable with SYNFIRE_TRACE_DELIVERY=1.
fn delivery_trace_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        std::env::var("SYNFIRE_TRACE_DELIVERY")
            .ok()
            .as_deref()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}

/// Deliver all due spikes into `current`. Returns the number of
/// saturated additions (zero in a well-headroomed network).
pub fn deliver(
    forward: &ConnectivityMatrix,
    history: &[u64],
    current: &mut [Fix],
    pool: Option<&rayon::ThreadPool>,
) -> u64 {
    match pool {
        Some(pool) if history.len() >= PAR_THRESHOLD => {
            deliver_parallel(forward, history, current, pool)
        }
        _ => deliver_range(forward, history, 0..history.len(), current),
    }
}

/// Walk one source range, accumulating into `current` (indexed by local
/// target over the full population).
fn deliver_range(
    forward: &ConnectivityMatrix,
    history: &[u64],
    sources: core::ops::Range<usize>,
    current: &mut [Fix],
) -> u64 {
    let valid_spikes = forward.valid_spikes_mask();
    let mut saturations = 0u64;

    for source in sources {
        let mut events = history[source] & valid_spikes & forward.delay_bits(source);
        while events != 0 {
            let delay = events.trailing_zeros() + 1;
            let row = forward.row(source, delay);
            if delivery_trace_enabled() {
                trace!(source, delay, terminals = row.len(), "delivering spikes");
            }
            for terminal in row {
                let slot = &mut current[terminal.target as usize];
                let (sum, saturated) = fixed::sat_add(*slot, terminal.weight);
                *slot = sum;
                saturations += u64::from(saturated);
            }
            events &= events - 1;
        }
    }

    saturations
}

fn deliver_parallel(
    forward: &ConnectivityMatrix,
    history: &[u64],
    current: &mut [Fix],
    pool: &rayon::ThreadPool,
) -> u64 {
    let slots = history.len();
    let chunk_count = slots.div_ceil(SOURCE_CHUNK);

    let partials: Vec<(Vec<Fix>, u64)> = pool.install(|| {
        (0..chunk_count)
            .into_par_iter()
            .map(|chunk| {
                let start = chunk * SOURCE_CHUNK;
                let end = (start + SOURCE_CHUNK).min(slots);
                let mut partial = vec![0; slots];
                let saturations = deliver_range(forward, history, start..end, &mut partial);
                (partial, saturations)
            })
            .collect()
    });

    // Reduce in chunk order: the canonical order that makes the result
    // independent of how chunks were scheduled.
    let mut saturations = 0u64;
    for (partial, chunk_saturations) in partials {
        saturations += chunk_saturations;
        for (slot, add) in current.iter_mut().zip(partial) {
            if add != 0 {
                let (sum, saturated) = fixed::sat_add(*slot, add);
                *slot = sum;
                saturations += u64::from(saturated);
            }
        }
    }

    saturations
}
