// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! STDP accumulation and bounded application.
//!
//! Key semantics:
//! - Accumulation runs every cycle after the history shift. A target is
//!   processed only when its register shows a firing exactly
//!   `post_window` cycles ago (the middle of the window); each incoming
//!   plastic synapse then contributes at most one curve sample, chosen
//!   closest-wins with exact ties going to the prefire side.
//! - `apply(reward)` folds the pending deltas into the forward weights:
//!   `w <- clamp(w + reward * dw)`, clamped sign-preservingly
//!   (excitatory synapses move within [0, max_weight], inhibitory within
//!   [min_weight, 0]); a weight never crosses zero. All accumulators are
//!   reset afterwards.
//! - `apply(0.0)` is the idiom for clearing accumulators without
//!   touching weights.

use synfire_neural::fixed;
use synfire_neural::stdp::StdpProcess;
use synfire_runtime::{ConnectivityMatrix, ReverseMatrix};

/// Accumulate weight deltas for every target that fired in the middle of
/// the STDP window this cycle.
pub fn accumulate(process: &StdpProcess, history: &[u64], reverse: &mut ReverseMatrix) {
    let post_bit = process.post_bit();

    for target in 0..reverse.target_slots() {
        if history[target] & post_bit == 0 {
            continue;
        }
        for index in reverse.incoming_range(target) {
            let entry = *reverse.entry(index);
            // Align presynaptic firings into the target's window frame:
            // after the shift by the synapse delay, each bit is an
            // arrival age at the target.
            let arrivals = history[entry.source as usize]
                .checked_shr(entry.delay)
                .unwrap_or(0);
            let delta = process.weight_delta(arrivals);
            if delta != 0 {
                reverse.add_delta(index, delta);
            }
        }
    }
}

/// Fold pending deltas into the forward weights, scaled by `reward`, and
/// reset all accumulators.
pub fn apply(
    process: &StdpProcess,
    reward: f32,
    forward: &mut ConnectivityMatrix,
    reverse: &mut ReverseMatrix,
) {
    if reward == 0.0 {
        reverse.clear_deltas();
        return;
    }

    let fbits = forward.fractional_bits();
    for index in 0..reverse.len() {
        let delta_fx = reverse.take_delta(index);
        if delta_fx == 0 {
            continue;
        }
        let entry = *reverse.entry(index);
        let source = entry.source as usize;
        let weight = fixed::to_float(forward.weight_fx(source, entry.delay, entry.row_offset), fbits);
        let moved = weight + reward * fixed::to_float(delta_fx, fbits);
        let bounded = if entry.inhibitory {
            moved.clamp(process.min_weight(), 0.0)
        } else {
            moved.clamp(0.0, process.max_weight())
        };
        forward.set_weight_fx(
            source,
            entry.delay,
            entry.row_offset,
            fixed::to_fix(bounded, fbits),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synfire_neural::models::IzhikevichParams;
    use synfire_neural::stdp::StdpFunction;
    use synfire_neural::types::NeuronId;
    use synfire_runtime::{FrozenNetwork, Network};

    fn plastic_pair(weight: f32) -> FrozenNetwork {
        let mut net = Network::new();
        let params = IzhikevichParams::regular_spiking();
        net.add_neuron(NeuronId(0), params, -13.0, -65.0).unwrap();
        net.add_neuron(NeuronId(1), params, -13.0, -65.0).unwrap();
        net.add_synapse(NeuronId(0), NeuronId(1), 1, weight, true)
            .unwrap();
        net.finalize().unwrap()
    }

    fn process(frozen: &FrozenNetwork) -> StdpProcess {
        let f = StdpFunction::new(vec![1.0, 0.5, 0.25], vec![-1.0, -0.5], -10.0, 10.0).unwrap();
        StdpProcess::new(&f, frozen.fractional_bits())
    }

    #[test]
    fn test_accumulate_requires_post_bit() {
        let mut frozen = plastic_pair(1.0);
        let p = process(&frozen);

        // target's firing not yet in the middle of the window
        let history = vec![0b1000u64, 0b10];
        accumulate(&p, &history, &mut frozen.reverse);
        apply(&p, 1.0, &mut frozen.forward, &mut frozen.reverse);
        let fbits = frozen.fractional_bits();
        let w = fixed::to_float(frozen.forward.weight_fx(0, 1, 0), fbits);
        assert!((w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_coincident_arrival_potentiates() {
        let mut frozen = plastic_pair(1.0);
        let p = process(&frozen);
        let fbits = frozen.fractional_bits();

        // post (neuron 1) fired post_window = 2 cycles ago: bit 2.
        // pre (neuron 0) fired 3 cycles ago: bit 3; with delay 1 the
        // arrival aligns with the postsynaptic firing (dt = 0).
        let history = vec![0b1000u64, 0b100];
        accumulate(&p, &history, &mut frozen.reverse);
        apply(&p, 1.0, &mut frozen.forward, &mut frozen.reverse);

        let w = fixed::to_float(frozen.forward.weight_fx(0, 1, 0), fbits);
        assert!((w - 2.0).abs() < 1e-4, "weight {}", w);
    }

    #[test]
    fn test_zero_reward_clears_without_changing_weights() {
        let mut frozen = plastic_pair(1.0);
        let p = process(&frozen);
        let fbits = frozen.fractional_bits();

        let history = vec![0b1000u64, 0b100];
        accumulate(&p, &history, &mut frozen.reverse);
        apply(&p, 0.0, &mut frozen.forward, &mut frozen.reverse);
        let w = fixed::to_float(frozen.forward.weight_fx(0, 1, 0), fbits);
        assert!((w - 1.0).abs() < 1e-4);

        // accumulators were cleared: a later rewarded apply changes nothing
        apply(&p, 1.0, &mut frozen.forward, &mut frozen.reverse);
        let w = fixed::to_float(frozen.forward.weight_fx(0, 1, 0), fbits);
        assert!((w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_excitatory_weight_clamped_at_bounds() {
        let mut frozen = plastic_pair(9.8);
        let p = process(&frozen);
        let fbits = frozen.fractional_bits();

        let history = vec![0b1000u64, 0b100];
        accumulate(&p, &history, &mut frozen.reverse);
        apply(&p, 1.0, &mut frozen.forward, &mut frozen.reverse);
        let w = fixed::to_float(frozen.forward.weight_fx(0, 1, 0), fbits);
        assert!((w - 10.0).abs() < 1e-4, "potentiation bound, got {}", w);
    }

    #[test]
    fn test_excitatory_weight_never_goes_negative() {
        let mut frozen = plastic_pair(0.3);
        let p = process(&frozen);
        let fbits = frozen.fractional_bits();

        // pre arrival one cycle after the post firing: depression -0.5
        let history = vec![0b10u64, 0b100];
        accumulate(&p, &history, &mut frozen.reverse);
        apply(&p, 1.0, &mut frozen.forward, &mut frozen.reverse);
        let w = fixed::to_float(frozen.forward.weight_fx(0, 1, 0), fbits);
        assert_eq!(w, 0.0, "depression floors at zero, got {}", w);
    }

    #[test]
    fn test_inhibitory_weight_keeps_sign() {
        let mut frozen = plastic_pair(-0.5);
        let p = process(&frozen);
        let fbits = frozen.fractional_bits();

        // potentiation sample +1.0 would push the weight positive;
        // the sign-preserving clamp caps it at zero
        let history = vec![0b1000u64, 0b100];
        accumulate(&p, &history, &mut frozen.reverse);
        apply(&p, 1.0, &mut frozen.forward, &mut frozen.reverse);
        let w = fixed::to_float(frozen.forward.weight_fx(0, 1, 0), fbits);
        assert_eq!(w, 0.0);

        // and the inhibitory bound caps movement the other way
        let mut frozen = plastic_pair(-9.8);
        let history = vec![0b10u64, 0b100];
        accumulate(&p, &history, &mut frozen.reverse);
        apply(&p, 1.0, &mut frozen.forward, &mut frozen.reverse);
        let w = fixed::to_float(frozen.forward.weight_fx(0, 1, 0), fbits);
        assert!((w - -10.0).abs() < 1e-4, "inhibitory bound, got {}", w);
    }
}
