//! Categorical draws from unnormalised log-weights.
//!
//! The Gibbs sweep produces one log-weight per cluster, often far below
//! `-100` once a type carries many feature tokens. Two ways of getting back to
//! linear space are offered (see [`LogSampling`]); both then draw by the
//! cumulative method: the first index whose running sum exceeds
//! `u ~ U[0, total)`.

use crate::config::LogSampling;
use rand::Rng;

/// Below this maximum, [`LogSampling::Rescaled`] divides before `exp`.
const FLUSH_THRESHOLD: f64 = -100.0;

/// Reusable categorical sampler with its own scratch buffer.
#[derive(Debug, Clone)]
pub struct CategoricalSampler {
    mode: LogSampling,
    weights: Vec<f64>,
}

impl CategoricalSampler {
    /// Create a sampler using the given log-to-linear strategy.
    pub fn new(mode: LogSampling) -> Self {
        Self {
            mode,
            weights: Vec::new(),
        }
    }

    /// Draw an index in `[0, log_weights.len())` with probability proportional
    /// to `exp(weight)` (after rescaling, for [`LogSampling::Rescaled`]).
    ///
    /// If every weight underflows (or the input holds NaNs) the arg-max index
    /// is returned instead.
    pub fn draw<R: Rng + ?Sized>(&mut self, log_weights: &[f64], rng: &mut R) -> usize {
        debug_assert!(!log_weights.is_empty());
        to_linear(log_weights, self.mode, &mut self.weights);
        sample_cumulative(&self.weights, rng).unwrap_or_else(|| argmax(log_weights))
    }
}

/// Exponentiate `log_weights` into `out` according to `mode`.
pub fn to_linear(log_weights: &[f64], mode: LogSampling, out: &mut Vec<f64>) {
    out.clear();
    match mode {
        LogSampling::Rescaled => {
            // min starts at zero, so the divisor is always >= 1.
            let mut min = 0.0f64;
            let mut max = f64::NEG_INFINITY;
            for &w in log_weights {
                if w < min {
                    min = w;
                }
                if w > max {
                    max = w;
                }
            }
            if max < FLUSH_THRESHOLD {
                let div = min / FLUSH_THRESHOLD;
                out.extend(log_weights.iter().map(|&w| (w / div).exp()));
            } else {
                out.extend(log_weights.iter().map(|&w| w.exp()));
            }
        }
        LogSampling::LogSumExp => {
            let max = log_weights
                .iter()
                .cloned()
                .fold(f64::NEG_INFINITY, f64::max);
            if max.is_finite() {
                out.extend(log_weights.iter().map(|&w| (w - max).exp()));
            } else {
                out.extend(log_weights.iter().map(|_| 0.0));
            }
        }
    }
}

/// Cumulative-sum draw over non-negative weights.
///
/// Returns `None` when the total is zero or not finite.
pub fn sample_cumulative<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return None;
    }

    let u = rng.random::<f64>() * total;
    let mut cumsum = 0.0;
    let mut last_positive = 0;
    for (i, &w) in weights.iter().enumerate() {
        cumsum += w;
        if w > 0.0 {
            last_positive = i;
        }
        if cumsum > u {
            return Some(i);
        }
    }
    // Rounding left u at or above the final running sum.
    Some(last_positive)
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
