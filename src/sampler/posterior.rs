//! Collapsed prior and likelihood terms.
//!
//! With the mixture weights and emission distributions integrated out, every
//! probability is a Polya-urn ratio of counts plus concentration:
//!
//! ```text
//! prior(c)       = (n_c + α) / (N - 1 + K·α)
//! emission(f|c)  = (m_cf + j + β_f) / (M_c + d + F·β_f)
//! ```
//!
//! where `j` counts the units of feature `f` already drawn for this type and
//! `d` all units drawn for this type in the channel. A type's own tokens are
//! therefore exchangeable draws without replacement.
//!
//! [`score_clusters`] evaluates these for one detached type against every
//! cluster (the inner loop of a sweep). [`LogPosterior::compute`] replays the
//! whole assignment in word-type order from empty counts; it is O(N·F) and is
//! only used for best-state tracking and hyperparameter acceptance.

use super::hyper::{FeatureHyper, Hyperparameters};
use super::stats::SufficientStats;
use crate::features::{Channel, FeatureSet};
use ndarray::Array2;

/// Log prior plus the per-channel log likelihoods of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct LogPosterior {
    /// Log prior of the assignment.
    pub prior: f64,
    /// Log likelihood of each channel, in [`FeatureSet`] order.
    pub channels: Vec<f64>,
}

impl LogPosterior {
    /// Replay `assignment` from empty counts.
    pub fn compute(
        features: &FeatureSet,
        assignment: &[usize],
        k: usize,
        hyper: &Hyperparameters,
    ) -> Self {
        let prior = total_log_prior(assignment, k, hyper.class);
        let channels = features
            .channels()
            .iter()
            .zip(&hyper.features)
            .map(|(ch, h)| channel_log_likelihood(ch, assignment, k, h))
            .collect();
        Self { prior, channels }
    }

    /// Sum of all channel log likelihoods.
    pub fn likelihood(&self) -> f64 {
        self.channels.iter().sum()
    }

    /// Log posterior (up to a constant).
    pub fn total(&self) -> f64 {
        self.prior + self.likelihood()
    }
}

/// Score every cluster for a type that has already been removed from `stats`.
///
/// `out[c]` receives `ln prior(c) + Σ_channels ln likelihood(t | c)`.
pub fn score_clusters(
    features: &FeatureSet,
    stats: &SufficientStats,
    hyper: &Hyperparameters,
    word_type: usize,
    out: &mut Vec<f64>,
) {
    let k = stats.k();
    let n = stats.num_types();
    out.clear();
    out.extend((0..k).map(|c| {
        let prior = log_prior_term(stats.types_per_class()[c], n, k, hyper.class);
        let likelihood: f64 = features
            .channels()
            .iter()
            .enumerate()
            .map(|(i, ch)| {
                candidate_log_likelihood(ch, stats, i, &hyper.features[i], word_type, c)
            })
            .sum();
        prior + likelihood
    }));
}

/// `ln((n_c + α) / (N - 1 + K·α))` for a type detached from an `N`-type corpus.
#[inline]
pub fn log_prior_term(types_in_class: usize, num_types: usize, k: usize, alpha: f64) -> f64 {
    let denom = (num_types as f64 - 1.0) + k as f64 * alpha;
    ((types_in_class as f64 + alpha) / denom).ln()
}

/// Log likelihood of one type's tokens in channel `index` under cluster `c`.
///
/// Types with no tokens in the channel score exactly `0.0`.
pub fn candidate_log_likelihood(
    channel: &Channel,
    stats: &SufficientStats,
    index: usize,
    hyper: &FeatureHyper,
    word_type: usize,
    c: usize,
) -> f64 {
    let counts = stats.channel(index);
    let n_features = channel.num_features();
    let total = counts.class_totals[c] as f64;
    let mut drawn = 0.0;
    let mut ll = 0.0;

    for &(f, n) in channel.support(word_type) {
        let beta = hyper.beta(f, n_features);
        let numer = counts.features_per_class[[c, f]] as f64 + beta;
        let denom = total + n_features as f64 * beta;
        for j in 0..n {
            ll += ((numer + j as f64) / (denom + drawn)).ln();
            drawn += 1.0;
        }
    }
    ll
}

/// Sequential log prior of a whole assignment.
///
/// Each type is counted before its own term, so the first type in a cluster
/// contributes `ln((1 + α) / (1 + K·α))`.
pub fn total_log_prior(assignment: &[usize], k: usize, alpha: f64) -> f64 {
    let mut per_class = vec![0usize; k];
    let k_alpha = k as f64 * alpha;
    let mut prior = 0.0;
    for (seen, &c) in assignment.iter().enumerate() {
        per_class[c] += 1;
        prior += ((per_class[c] as f64 + alpha) / ((seen + 1) as f64 + k_alpha)).ln();
    }
    prior
}

/// Sequential log likelihood of one channel under a whole assignment.
pub fn channel_log_likelihood(
    channel: &Channel,
    assignment: &[usize],
    k: usize,
    hyper: &FeatureHyper,
) -> f64 {
    let n_features = channel.num_features();
    let mut cum = Array2::<u64>::zeros((k, n_features));
    let mut cum_total = vec![0u64; k];
    let mut ll = 0.0;

    for (t, &c) in assignment.iter().enumerate() {
        cum_total[c] += channel.row_total(t);
        let total = cum_total[c] as f64;
        let mut drawn = 0.0;
        for &(f, n) in channel.support(t) {
            cum[[c, f]] += n as u64;
            let beta = hyper.beta(f, n_features);
            let numer = cum[[c, f]] as f64 + beta;
            let denom = total + n_features as f64 * beta;
            for j in 0..n {
                ll += ((numer + j as f64) / (denom + drawn)).ln();
                drawn += 1.0;
            }
        }
    }
    ll
}

/// Sequential log likelihood summed over channels.
pub fn total_log_likelihood(
    features: &FeatureSet,
    assignment: &[usize],
    k: usize,
    hypers: &[FeatureHyper],
) -> f64 {
    features
        .channels()
        .iter()
        .zip(hypers)
        .map(|(ch, h)| channel_log_likelihood(ch, assignment, k, h))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HyperShape, SamplerConfig};

    fn features(rows: &[Vec<u32>]) -> FeatureSet {
        FeatureSet::new(vec![Channel::from_rows("ctx", rows).unwrap()]).unwrap()
    }

    fn tied(alpha: f64, beta: f64, channels: usize) -> Hyperparameters {
        Hyperparameters {
            class: alpha,
            features: vec![FeatureHyper::Tied(beta); channels],
        }
    }

    #[test]
    fn test_prior_term_single_class_is_zero() {
        // K = 1: (N - 1 + α) / (N - 1 + α)
        assert!(log_prior_term(4, 5, 1, 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_candidate_score_by_hand() {
        // Type 0 has 2 tokens of feature 0; cluster 0 holds type 1 with
        // feature counts [1, 1].
        let fs = features(&[vec![2, 0], vec![1, 1]]);
        let mut stats = SufficientStats::from_assignment(&fs, 2, vec![1, 0]).unwrap();
        let removed = stats.remove(&fs, 0);
        let hyper = tied(0.5, 0.1, 1);

        let mut scores = Vec::new();
        score_clusters(&fs, &stats, &hyper, 0, &mut scores);

        let prior0 = ((1.0 + 0.5) / (1.0 + 2.0 * 0.5) as f64).ln();
        let like0 = ((1.0 + 0.1) / (2.0 + 0.2) as f64).ln() + ((2.0 + 0.1) / (3.0 + 0.2) as f64).ln();
        let prior1 = ((0.0 + 0.5) / (1.0 + 2.0 * 0.5) as f64).ln();
        let like1 = (0.1 / 0.2f64).ln() + (1.1 / 1.2f64).ln();
        assert!((scores[0] - (prior0 + like0)).abs() < 1e-12);
        assert!((scores[1] - (prior1 + like1)).abs() < 1e-12);

        stats.add(&fs, removed, 1);
    }

    #[test]
    fn test_zero_count_type_scores_cleanly() {
        let fs = features(&[vec![0, 0, 0], vec![1, 2, 0]]);
        let mut stats = SufficientStats::from_assignment(&fs, 3, vec![0, 1]).unwrap();
        let removed = stats.remove(&fs, 0);
        let hyper = tied(0.1, 0.1, 1);
        for c in 0..3 {
            let ll = candidate_log_likelihood(&fs.channels()[0], &stats, 0, &hyper.features[0], 0, c);
            assert_eq!(ll, 0.0);
        }
        let mut scores = Vec::new();
        score_clusters(&fs, &stats, &hyper, 0, &mut scores);
        assert!(scores.iter().all(|s| s.is_finite()));
        stats.add(&fs, removed, 0);
    }

    #[test]
    fn test_total_prior_by_hand() {
        let alpha = 0.2;
        let prior = total_log_prior(&[0, 0, 1], 2, alpha);
        let expected = ((1.0 + alpha) / (1.0 + 0.4) as f64).ln()
            + ((2.0 + alpha) / (2.0 + 0.4) as f64).ln()
            + ((1.0 + alpha) / (3.0 + 0.4) as f64).ln();
        assert!((prior - expected).abs() < 1e-12);
    }

    #[test]
    fn test_channel_likelihood_by_hand() {
        let fs = features(&[vec![1, 1], vec![0, 1]]);
        let beta = 0.5;
        let ll = channel_log_likelihood(&fs.channels()[0], &[0, 0], 1, &FeatureHyper::Tied(beta));
        // type 0: total 2; f0 cum 1 -> (1+.5)/(2+1); f1 cum 1 -> (1+.5)/(2+1+1)
        // type 1: total 3; f1 cum 2 -> (2+.5)/(3+1)
        let expected = (1.5f64 / 3.0).ln() + (1.5f64 / 4.0).ln() + (2.5f64 / 4.0).ln();
        assert!((ll - expected).abs() < 1e-12);
    }

    #[test]
    fn test_posterior_sums_parts() {
        let fs = features(&[vec![1, 0], vec![0, 3], vec![2, 2]]);
        let config = SamplerConfig::new(2).with_hyper_shape(HyperShape::Tied);
        let hyper = Hyperparameters::initial(&config, &fs);
        let lp = LogPosterior::compute(&fs, &[0, 1, 0], 2, &hyper);
        let prior = total_log_prior(&[0, 1, 0], 2, hyper.class);
        let like = total_log_likelihood(&fs, &[0, 1, 0], 2, &hyper.features);
        assert!((lp.total() - (prior + like)).abs() < 1e-12);
        assert!(lp.total() < 0.0);
    }

    #[test]
    fn test_untied_two_way_uses_null_beta_for_last_feature() {
        let fs = features(&[vec![0, 1]]);
        let h = FeatureHyper::UntiedTwoWay {
            normal: 0.1,
            null: 0.7,
        };
        let ll = channel_log_likelihood(&fs.channels()[0], &[0], 1, &h);
        let expected = ((1.0 + 0.7) / (1.0 + 2.0 * 0.7) as f64).ln();
        assert!((ll - expected).abs() < 1e-12);
    }
}
