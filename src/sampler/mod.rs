//! Bayesian multinomial mixture sampler for word-class induction.
//!
//! Word types are clustered by their feature counts. Each cluster `c` has a
//! multinomial over the features of every channel, drawn from a symmetric
//! (or untied) Dirichlet with concentration β; cluster weights come from a
//! Dirichlet with concentration α. Both are integrated out, so the only
//! sampled state is the assignment `z` of types to clusters.
//!
//! ## Update
//!
//! For each word type in turn the type is removed from the counts, every
//! cluster is scored with the collapsed conditional
//!
//! ```text
//! P(z_t = c | z_-t) ∝ (n_c + α) · Π_channels Π_tokens (m_cf + j + β_f) / (M_c + d + F·β_f)
//! ```
//!
//! the scores are multiplied by the annealing factor, a cluster is drawn,
//! and the type is added back.
//!
//! ## Annealing
//!
//! A logistic cool-down from temperature 2 to 1 over the first half of the
//! run, a plateau, then a short ramp of sharpening factors (`1.11^k`) at the
//! end. See [`TemperatureSchedule`].
//!
//! ## Hyperparameters
//!
//! α and every β are resampled by Metropolis-Hastings random walks every
//! few iterations. See [`HyperResampler`].
//!
//! ## Usage
//!
//! ```rust
//! use tagmix::{Channel, FeatureSet, SamplerConfig, TagInducer};
//!
//! let context = Channel::from_rows(
//!     "context",
//!     &[vec![3, 0, 1], vec![2, 0, 1], vec![0, 4, 1], vec![0, 3, 1]],
//! )
//! .unwrap();
//! let features = FeatureSet::new(vec![context]).unwrap();
//!
//! let config = SamplerConfig::new(2).with_iterations(50).with_seed(7);
//! let outcome = TagInducer::new(config).run_with(&features, &mut ()).unwrap();
//! assert_eq!(outcome.assignment().len(), 4);
//! ```
//!
//! ## References
//!
//! - Christodoulopoulos, Goldwater & Steedman (2011). "A Bayesian mixture
//!   model for part-of-speech induction using multiple features"
//! - Goldwater & Griffiths (2007). "A fully Bayesian approach to
//!   unsupervised part-of-speech tagging"

mod categorical;
mod gibbs;
mod hyper;
mod observer;
mod posterior;
mod schedule;
mod stats;

pub use categorical::{sample_cumulative, to_linear, CategoricalSampler};
pub use gibbs::{Chain, Outcome, TagInducer};
pub use hyper::{FeatureHyper, HyperResampler, Hyperparameters, ResampleStats, MIN_CONCENTRATION};
pub use observer::{IterationReport, LogObserver, SamplerObserver, WriterObserver};
pub use posterior::{
    candidate_log_likelihood, channel_log_likelihood, log_prior_term, score_clusters,
    total_log_likelihood, total_log_prior, LogPosterior,
};
pub use schedule::TemperatureSchedule;
pub use stats::{ChannelCounts, Removed, SufficientStats};
