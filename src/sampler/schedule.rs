//! Annealing schedule.
//!
//! The schedule holds one multiplicative factor per iteration; the sweep
//! multiplies every log-weight by it. It has three phases:
//!
//! 1. **Cool-down** over the first `N - round(N·plateau)` iterations: a
//!    logistic curve from `start_temp` down to `stop_temp`, stored as
//!    `1 / temperature` (so factors climb from `0.5` to `1` by default).
//! 2. **Plateau** at `1 / stop_temp`.
//! 3. **Reheat ramp** over the last `(steps - 1)·inc` iterations, with
//!    `inc = N / reheat_divisions`: at every multiple of `inc` the factor
//!    steps to the next power of `reheat_base` (> 1, sharpening the
//!    distribution) and holds in between. Runs shorter than
//!    `reheat_divisions` iterations have `inc = 0` and skip the ramp.

use crate::config::AnnealConfig;

/// Per-iteration annealing factors.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureSchedule {
    factors: Vec<f64>,
}

impl TemperatureSchedule {
    /// Build the schedule for a run of `iterations` sweeps.
    pub fn build(iterations: usize, config: &AnnealConfig) -> Self {
        let mut factors = vec![1.0 / config.stop_temp; iterations];

        let plateau = (iterations as f64 * config.plateau_fraction).round() as usize;
        let anneal_iters = iterations.saturating_sub(plateau);
        if anneal_iters > 0 {
            let logistic = |x: f64| 1.0 / (1.0 + (config.steepness * (x - config.midpoint)).exp());
            let s0 = logistic(0.0);
            let s1 = logistic(1.0);
            for (i, factor) in factors.iter_mut().take(anneal_iters).enumerate() {
                let s = logistic(i as f64 / anneal_iters as f64);
                let temp = (config.start_temp - config.stop_temp) * (s - s1) / (s0 - s1)
                    + config.stop_temp;
                *factor = 1.0 / temp;
            }
        }

        let inc = iterations / config.reheat_divisions.max(1);
        if inc > 0 && config.reheat_steps > 0 {
            let reheat: Vec<f64> = (1..=config.reheat_steps)
                .map(|p| config.reheat_base.powi(p as i32))
                .collect();
            let start = iterations.saturating_sub((config.reheat_steps - 1) * inc);
            let mut next = 0;
            for i in start..iterations {
                if i % inc == 0 {
                    factors[i] = reheat[next.min(reheat.len() - 1)];
                    next += 1;
                } else if i > 0 {
                    factors[i] = factors[i - 1];
                }
            }
        }

        Self { factors }
    }

    /// Factor for 1-based iteration `iteration`.
    #[inline]
    pub fn get(&self, iteration: usize) -> f64 {
        self.factors[iteration - 1]
    }

    /// All factors, 0-based.
    pub fn as_slice(&self) -> &[f64] {
        &self.factors
    }

    /// Number of iterations covered.
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    /// Whether the schedule covers no iterations.
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}
