// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Determinism guarantees: identical runs reproduce bit-identical firing
//! sequences, including across thread counts (which exercises the
//! chunked parallel delivery path on larger populations).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use synfire_engine::{create, IzhikevichParams, NeuronId, SimulationConfig};
use synfire_runtime::Network;

/// Randomized but seeded network: a mix of noisy excitatory and
/// inhibitory neurons with random delayed fan-out.
fn random_network(neurons: u32, fan_out: usize, seed: u64) -> Network {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut net = Network::new();

    for idx in 0..neurons {
        let excitatory = rng.gen::<f32>() < 0.8;
        let params = if excitatory {
            IzhikevichParams::regular_spiking().with_sigma(5.0)
        } else {
            IzhikevichParams::fast_spiking().with_sigma(2.0)
        };
        let (u, v) = params.initial_state();
        net.add_neuron(NeuronId(idx), params, u, v).unwrap();
    }

    for source in 0..neurons {
        for _ in 0..fan_out {
            let target = NeuronId(rng.gen_range(0..neurons));
            let delay = rng.gen_range(1..=20);
            let weight = if rng.gen::<f32>() < 0.8 {
                rng.gen::<f32>() * 0.5
            } else {
                -rng.gen::<f32>()
            };
            net.add_synapse(NeuronId(source), target, delay, weight, false)
                .unwrap();
        }
    }
    net
}

fn run(net: &Network, threads: i32, steps: u64) -> Vec<Vec<NeuronId>> {
    let mut config = SimulationConfig::new();
    config.set_cpu_backend(threads);
    let mut sim = create(net, &config).unwrap();

    let neurons = sim.neuron_count();
    let mut all_fired = Vec::with_capacity(steps as usize);
    for cycle in 0..steps {
        // rotating forced stimulus keeps the network active
        let fstim = vec![NeuronId((cycle % u64::from(neurons)) as u32)];
        all_fired.push(sim.step(&fstim).unwrap());
    }
    all_fired
}

#[test]
fn test_identical_runs_reproduce() {
    let net = random_network(300, 20, 42);
    let first = run(&net, 1, 100);
    let second = run(&net, 1, 100);
    assert_eq!(first, second);
}

#[test]
fn test_deterministic_across_thread_counts() {
    // Large enough to take the parallel delivery and update paths.
    let net = random_network(4500, 10, 7);
    let single = run(&net, 1, 60);
    let quad = run(&net, 4, 60);
    assert_eq!(single, quad);

    let auto = run(&net, -1, 60);
    assert_eq!(single, auto);
}

#[test]
fn test_forced_neuron_always_fires() {
    let net = random_network(200, 15, 11);
    let mut config = SimulationConfig::new();
    config.set_cpu_backend(1);
    let mut sim = create(&net, &config).unwrap();

    for cycle in 0..100u64 {
        let forced = NeuronId((cycle % 200) as u32);
        let fired = sim.step(&[forced]).unwrap();
        assert!(fired.contains(&forced), "cycle {}: {:?} missing", cycle, forced);
        for neuron in fired {
            assert!(neuron.0 < 200);
        }
    }
}

#[test]
fn test_firing_lists_are_sorted_and_unique() {
    let net = random_network(300, 20, 3);
    let mut sim = create(&net, &SimulationConfig::new()).unwrap();
    for cycle in 0..50u64 {
        let fired = sim.step(&[NeuronId((cycle % 300) as u32)]).unwrap();
        for pair in fired.windows(2) {
            assert!(pair[0].0 < pair[1].0);
        }
    }
}
