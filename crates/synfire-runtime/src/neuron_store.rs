// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Struct-of-arrays neuron storage.
//!
//! Seven parallel columns over the dense local index space plus a
//! validity bitmap. Parameters (`a`, `b`, `c`, `d`, `sigma`) are
//! immutable after finalize; only the state columns (`u`, `v`) are
//! written during simulation, and only by the membrane updater.

use synfire_neural::models::IzhikevichParams;

#[derive(Debug, Clone, Default)]
pub struct NeuronStore {
    pub a: Vec<f32>,
    pub b: Vec<f32>,
    pub c: Vec<f32>,
    pub d: Vec<f32>,
    pub sigma: Vec<f32>,

    /// Membrane recovery variable (state).
    pub u: Vec<f32>,
    /// Membrane potential (state).
    pub v: Vec<f32>,

    pub valid: Vec<bool>,
}

impl NeuronStore {
    /// Zero-filled store covering `len` local slots, all invalid.
    pub fn with_len(len: usize) -> Self {
        Self {
            a: vec![0.0; len],
            b: vec![0.0; len],
            c: vec![0.0; len],
            d: vec![0.0; len],
            sigma: vec![0.0; len],
            u: vec![0.0; len],
            v: vec![0.0; len],
            valid: vec![false; len],
        }
    }

    /// Populate one local slot.
    pub fn set(&mut self, local: usize, params: &IzhikevichParams, u: f32, v: f32) {
        self.a[local] = params.a;
        self.b[local] = params.b;
        self.c[local] = params.c;
        self.d[local] = params.d;
        self.sigma[local] = params.sigma;
        self.u[local] = u;
        self.v[local] = v;
        self.valid[local] = true;
    }

    /// Size of the local index space, holes included.
    pub fn len(&self) -> usize {
        self.valid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_populates_columns() {
        let mut store = NeuronStore::with_len(3);
        let params = IzhikevichParams::regular_spiking().with_sigma(5.0);
        store.set(1, &params, -13.0, -65.0);

        assert!(!store.valid[0]);
        assert!(store.valid[1]);
        assert_eq!(store.a[1], 0.02);
        assert_eq!(store.sigma[1], 5.0);
        assert_eq!(store.u[1], -13.0);
        assert_eq!(store.v[1], -65.0);
        assert_eq!(store.len(), 3);
    }
}
