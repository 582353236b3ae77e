// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Simulation and wallclock timing.
//!
//! Simulated time advances one millisecond per step; wallclock time is
//! measured from the same reset point.

use std::time::Instant;

#[derive(Debug, Clone)]
pub struct Timer {
    cycles: u64,
    wall_start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            cycles: 0,
            wall_start: Instant::now(),
        }
    }

    /// Advance simulated time by one cycle.
    pub fn tick(&mut self) {
        self.cycles += 1;
    }

    /// Simulated milliseconds since the last reset.
    pub fn elapsed_simulation(&self) -> u64 {
        self.cycles
    }

    /// Wallclock milliseconds since the last reset.
    pub fn elapsed_wallclock(&self) -> u64 {
        self.wall_start.elapsed().as_millis() as u64
    }

    pub fn reset(&mut self) {
        self.cycles = 0;
        self.wall_start = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_time_counts_ticks() {
        let mut timer = Timer::start();
        assert_eq!(timer.elapsed_simulation(), 0);
        for _ in 0..5 {
            timer.tick();
        }
        assert_eq!(timer.elapsed_simulation(), 5);
        timer.reset();
        assert_eq!(timer.elapsed_simulation(), 0);
    }
}
