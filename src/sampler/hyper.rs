//! Dirichlet concentration parameters and their Metropolis-Hastings updates.
//!
//! Follows the random-walk sampler of Goldwater & Griffiths (2007): each
//! concentration `x` gets a proposal `x' ~ N(x, (r·x)²)`. Because the step
//! size scales with the current value the walk is asymmetric, so the
//! acceptance ratio carries the Hastings correction:
//!
//! ```text
//! ratio = [ p(z | x') / p(z | x) · q(x | x') / q(x' | x) ] ^ T
//! ```
//!
//! with `T` the current annealing factor. Everything is evaluated in log
//! space. Proposals at or below [`MIN_CONCENTRATION`] are rejected outright.
//!
//! `p(z | x)` is either the posterior from before the round
//! ([`MhReference::Fixed`], the default) or the posterior under the values
//! accepted so far ([`MhReference::Current`]).

use super::posterior::{channel_log_likelihood, total_log_prior, LogPosterior};
use crate::config::{HyperShape, MhReference, SamplerConfig};
use crate::features::FeatureSet;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::fmt;

/// Smallest concentration a proposal may take.
pub const MIN_CONCENTRATION: f64 = 1e-12;

/// Emission concentration(s) of one feature channel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FeatureHyper {
    /// One β shared by every feature.
    Tied(f64),
    /// `normal` for every feature but the last, `null` for the trailing NULL
    /// feature.
    UntiedTwoWay {
        /// Concentration of ordinary features.
        normal: f64,
        /// Concentration of the NULL feature.
        null: f64,
    },
    /// One β per feature.
    UntiedFull(Vec<f64>),
}

impl FeatureHyper {
    /// Build the layout chosen by `shape`, every component set to `value`.
    pub fn from_shape(shape: HyperShape, value: f64, n_features: usize) -> Self {
        match shape {
            HyperShape::Tied => FeatureHyper::Tied(value),
            HyperShape::UntiedTwoWay => FeatureHyper::UntiedTwoWay {
                normal: value,
                null: value,
            },
            HyperShape::UntiedFull => FeatureHyper::UntiedFull(vec![value; n_features]),
        }
    }

    /// Concentration of `feature` in a channel with `n_features` features.
    #[inline]
    pub fn beta(&self, feature: usize, n_features: usize) -> f64 {
        match self {
            FeatureHyper::Tied(b) => *b,
            FeatureHyper::UntiedTwoWay { normal, null } => {
                if feature + 1 == n_features {
                    *null
                } else {
                    *normal
                }
            }
            FeatureHyper::UntiedFull(bs) => bs[feature],
        }
    }

    /// Number of independently resampled components.
    pub fn len(&self) -> usize {
        match self {
            FeatureHyper::Tied(_) => 1,
            FeatureHyper::UntiedTwoWay { .. } => 2,
            FeatureHyper::UntiedFull(bs) => bs.len(),
        }
    }

    /// Whether there are no components (an empty untied vector).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value of component `i`.
    pub fn component(&self, i: usize) -> f64 {
        match self {
            FeatureHyper::Tied(b) => *b,
            FeatureHyper::UntiedTwoWay { normal, null } => {
                if i == 0 {
                    *normal
                } else {
                    *null
                }
            }
            FeatureHyper::UntiedFull(bs) => bs[i],
        }
    }

    /// Copy with component `i` replaced.
    pub fn with_component(&self, i: usize, value: f64) -> Self {
        let mut next = self.clone();
        match &mut next {
            FeatureHyper::Tied(b) => *b = value,
            FeatureHyper::UntiedTwoWay { normal, null } => {
                if i == 0 {
                    *normal = value;
                } else {
                    *null = value;
                }
            }
            FeatureHyper::UntiedFull(bs) => bs[i] = value,
        }
        next
    }

    /// Whether every component is strictly positive and finite.
    pub fn is_valid(&self) -> bool {
        (0..self.len()).all(|i| {
            let v = self.component(i);
            v.is_finite() && v > 0.0
        })
    }
}

impl fmt::Display for FeatureHyper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureHyper::Tied(b) => write!(f, "{b}"),
            FeatureHyper::UntiedTwoWay { normal, null } => write!(f, "[{normal}, {null}]"),
            FeatureHyper::UntiedFull(bs) => {
                write!(f, "[")?;
                for (i, b) in bs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{b}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Class concentration plus one [`FeatureHyper`] per channel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hyperparameters {
    /// α: concentration of the cluster-assignment prior.
    pub class: f64,
    /// β per channel, in [`FeatureSet`] order.
    pub features: Vec<FeatureHyper>,
}

impl Hyperparameters {
    /// Initial values from the configuration.
    pub fn initial(config: &SamplerConfig, features: &FeatureSet) -> Self {
        Self {
            class: config.initial_class_hyper,
            features: features
                .channels()
                .iter()
                .map(|ch| {
                    FeatureHyper::from_shape(
                        config.hyper_shape,
                        config.initial_feature_hyper,
                        ch.num_features(),
                    )
                })
                .collect(),
        }
    }

    /// Whether α and every β are strictly positive and finite.
    pub fn is_valid(&self) -> bool {
        self.class.is_finite() && self.class > 0.0 && self.features.iter().all(|h| h.is_valid())
    }
}

/// Acceptance counts of one resampling round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResampleStats {
    /// Proposals drawn.
    pub proposed: usize,
    /// Proposals accepted.
    pub accepted: usize,
    /// Proposals rejected for being non-positive or non-finite.
    pub invalid: usize,
}

/// Metropolis-Hastings resampler for [`Hyperparameters`].
#[derive(Debug, Clone)]
pub struct HyperResampler {
    /// Proposal standard deviation as a fraction of the current value.
    ratio: f64,
    /// Sweeps over all components per round.
    sweeps: usize,
    reference: MhReference,
}

impl HyperResampler {
    /// Create a resampler.
    pub fn new(ratio: f64, sweeps: usize) -> Self {
        Self {
            ratio,
            sweeps,
            reference: MhReference::Fixed,
        }
    }

    /// Set the posterior proposals are compared against.
    pub fn with_reference(mut self, reference: MhReference) -> Self {
        self.reference = reference;
        self
    }

    /// Resampler configured from a [`SamplerConfig`].
    pub fn from_config(config: &SamplerConfig) -> Self {
        Self::new(config.proposal_ratio, config.hyper_sweeps)
            .with_reference(config.mh_reference)
    }

    /// Run the configured number of sweeps in place.
    ///
    /// `current` must be the log posterior of `assignment` under `hyper`; the
    /// returned value is the log posterior under the updated `hyper`. Each
    /// sweep proposes α, then every component of every channel in order.
    #[allow(clippy::too_many_arguments)]
    pub fn resample<R: Rng + ?Sized>(
        &self,
        features: &FeatureSet,
        assignment: &[usize],
        k: usize,
        hyper: &mut Hyperparameters,
        current: LogPosterior,
        temperature: f64,
        rng: &mut R,
    ) -> (LogPosterior, ResampleStats) {
        let fixed = current.total();
        let mut current = current;
        let mut stats = ResampleStats::default();

        for _ in 0..self.sweeps {
            // Class concentration: only the prior depends on α.
            stats.proposed += 1;
            match self.propose(hyper.class, rng) {
                Some(alpha) => {
                    let prior = total_log_prior(assignment, k, alpha);
                    let proposed = current.total() - current.prior + prior;
                    let log_ratio = (proposed - self.reference_total(fixed, &current))
                        + self.log_hastings(hyper.class, alpha);
                    if accept(log_ratio, temperature, rng) {
                        log::trace!("hyperClass {} -> {}", hyper.class, alpha);
                        hyper.class = alpha;
                        current.prior = prior;
                        stats.accepted += 1;
                    }
                }
                None => stats.invalid += 1,
            }

            // Feature concentrations: only their own channel changes.
            for (i, channel) in features.channels().iter().enumerate() {
                for component in 0..hyper.features[i].len() {
                    stats.proposed += 1;
                    let old = hyper.features[i].component(component);
                    let Some(new) = self.propose(old, rng) else {
                        stats.invalid += 1;
                        continue;
                    };
                    let candidate = hyper.features[i].with_component(component, new);
                    let ll = channel_log_likelihood(channel, assignment, k, &candidate);
                    let proposed = current.total() - current.channels[i] + ll;
                    let log_ratio = (proposed - self.reference_total(fixed, &current))
                        + self.log_hastings(old, new);
                    if accept(log_ratio, temperature, rng) {
                        log::trace!(
                            "hyperFeats[{}][{}] {} -> {}",
                            channel.name(),
                            component,
                            old,
                            new
                        );
                        hyper.features[i] = candidate;
                        current.channels[i] = ll;
                        stats.accepted += 1;
                    }
                }
            }
        }

        (current, stats)
    }

    fn reference_total(&self, fixed: f64, current: &LogPosterior) -> f64 {
        match self.reference {
            MhReference::Fixed => fixed,
            MhReference::Current => current.total(),
        }
    }

    /// Draw `x' ~ N(x, (ratio·x)²)`, or `None` if it is not a usable
    /// concentration.
    fn propose<R: Rng + ?Sized>(&self, current: f64, rng: &mut R) -> Option<f64> {
        let normal = Normal::new(current, current * self.ratio).ok()?;
        let proposal = normal.sample(rng);
        if proposal.is_finite() && proposal > MIN_CONCENTRATION {
            Some(proposal)
        } else {
            log::trace!("rejected non-positive proposal {proposal} (from {current})");
            None
        }
    }

    /// `ln q(old | new) - ln q(new | old)`.
    fn log_hastings(&self, old: f64, new: f64) -> f64 {
        log_normal_density(old, new, new * self.ratio) - log_normal_density(new, old, old * self.ratio)
    }
}

/// Tempered MH acceptance: accept if `ratio^T >= 1` or `u < ratio^T`.
fn accept<R: Rng + ?Sized>(log_ratio: f64, temperature: f64, rng: &mut R) -> bool {
    let tempered = log_ratio * temperature;
    if tempered.is_nan() {
        return false;
    }
    tempered >= 0.0 || rng.random::<f64>().ln() < tempered
}

/// Log density of `N(mean, sd²)` at `x`.
fn log_normal_density(x: f64, mean: f64, sd: f64) -> f64 {
    let z = (x - mean) / sd;
    -0.5 * z * z - sd.ln() - 0.5 * (2.0 * std::f64::consts::PI).ln()
}
