//! Sampler configuration.
//!
//! A [`SamplerConfig`] is built once with the consuming `with_*` builder and
//! then only read. Nothing in the crate keeps process-wide settings.

use crate::error::{Error, Result};

/// How the per-channel feature concentrations are parameterised.
///
/// Chosen once here; the chain turns it into one
/// [`FeatureHyper`](crate::sampler::FeatureHyper) per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HyperShape {
    /// One symmetric concentration per channel.
    #[default]
    Tied,
    /// One concentration for ordinary features and one for the channel's
    /// trailing NULL feature.
    UntiedTwoWay,
    /// One concentration per feature.
    UntiedFull,
}

/// Strategy used to turn log-weights into a categorical draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LogSampling {
    /// Exponentiate directly, rescaling by `min / -100` when every weight is
    /// below `-100`. Matches the published experiments.
    #[default]
    Rescaled,
    /// Subtract the maximum before exponentiating.
    LogSumExp,
}

/// What a hyperparameter proposal is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MhReference {
    /// The log posterior from before the round, for every proposal of every
    /// sweep. Matches the published experiments.
    #[default]
    Fixed,
    /// The log posterior under the hyperparameters accepted so far.
    Current,
}

/// Constants of the annealing schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnnealConfig {
    /// Temperature at the start of the cool-down.
    pub start_temp: f64,
    /// Temperature at the end of the cool-down.
    pub stop_temp: f64,
    /// Logistic steepness.
    pub steepness: f64,
    /// Logistic midpoint, as a fraction of the cool-down length.
    pub midpoint: f64,
    /// Fraction of the run *not* spent cooling down (rounded).
    pub plateau_fraction: f64,
    /// Base of the multiplicative reheat factors.
    pub reheat_base: f64,
    /// Number of precomputed reheat factors.
    pub reheat_steps: usize,
    /// The reheat step length is `iterations / reheat_divisions`.
    pub reheat_divisions: usize,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            start_temp: 2.0,
            stop_temp: 1.0,
            steepness: 10.0,
            midpoint: 0.2,
            plateau_fraction: 0.5,
            reheat_base: 1.11,
            reheat_steps: 5,
            reheat_divisions: 20,
        }
    }
}

/// Immutable configuration for a [`TagInducer`](crate::sampler::TagInducer).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SamplerConfig {
    /// Number of clusters (K).
    pub n_classes: usize,
    /// Number of full sweeps.
    pub iterations: usize,
    /// Random seed. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Initial Dirichlet concentration of the class prior.
    pub initial_class_hyper: f64,
    /// Initial concentration of every feature emission distribution.
    pub initial_feature_hyper: f64,
    /// Tied or untied feature concentrations.
    pub hyper_shape: HyperShape,
    /// Recompute the posterior and resample hyperparameters every this many
    /// iterations.
    pub hyper_interval: usize,
    /// Metropolis-Hastings sweeps per resampling round.
    pub hyper_sweeps: usize,
    /// Proposal standard deviation as a fraction of the current value.
    pub proposal_ratio: f64,
    /// Categorical draw strategy.
    pub log_sampling: LogSampling,
    /// Reference posterior of the hyperparameter acceptance test.
    pub mh_reference: MhReference,
    /// Annealing schedule constants.
    pub anneal: AnnealConfig,
}

impl SamplerConfig {
    /// Create a configuration for `n_classes` clusters with default settings.
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            iterations: 1000,
            seed: None,
            initial_class_hyper: 0.1,
            initial_feature_hyper: 0.1,
            hyper_shape: HyperShape::Tied,
            hyper_interval: 5,
            hyper_sweeps: 5,
            proposal_ratio: 0.1,
            log_sampling: LogSampling::Rescaled,
            mh_reference: MhReference::Fixed,
            anneal: AnnealConfig::default(),
        }
    }

    /// Set number of sweeps.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set initial class and feature concentrations.
    pub fn with_initial_hypers(mut self, class: f64, features: f64) -> Self {
        self.initial_class_hyper = class;
        self.initial_feature_hyper = features;
        self
    }

    /// Set the feature concentration layout.
    pub fn with_hyper_shape(mut self, shape: HyperShape) -> Self {
        self.hyper_shape = shape;
        self
    }

    /// Set how often (in iterations) hyperparameters are resampled.
    pub fn with_hyper_interval(mut self, interval: usize) -> Self {
        self.hyper_interval = interval;
        self
    }

    /// Set the number of MH sweeps per resampling round.
    pub fn with_hyper_sweeps(mut self, sweeps: usize) -> Self {
        self.hyper_sweeps = sweeps;
        self
    }

    /// Set the categorical draw strategy.
    pub fn with_log_sampling(mut self, log_sampling: LogSampling) -> Self {
        self.log_sampling = log_sampling;
        self
    }

    /// Set the reference posterior of the hyperparameter acceptance test.
    pub fn with_mh_reference(mut self, mh_reference: MhReference) -> Self {
        self.mh_reference = mh_reference;
        self
    }

    /// Replace the annealing constants.
    pub fn with_anneal(mut self, anneal: AnnealConfig) -> Self {
        self.anneal = anneal;
        self
    }

    /// Check every field before a chain is built.
    pub fn validate(&self) -> Result<()> {
        if self.n_classes == 0 {
            return Err(Error::InvalidClusterCount {
                requested: 0,
                n_items: 0,
            });
        }
        if self.iterations == 0 {
            return Err(Error::InvalidParameter {
                name: "iterations",
                message: "must be > 0",
            });
        }
        if !(self.initial_class_hyper.is_finite() && self.initial_class_hyper > 0.0) {
            return Err(Error::InvalidParameter {
                name: "initial_class_hyper",
                message: "must be finite and > 0",
            });
        }
        if !(self.initial_feature_hyper.is_finite() && self.initial_feature_hyper > 0.0) {
            return Err(Error::InvalidParameter {
                name: "initial_feature_hyper",
                message: "must be finite and > 0",
            });
        }
        if self.hyper_interval == 0 {
            return Err(Error::InvalidParameter {
                name: "hyper_interval",
                message: "must be > 0",
            });
        }
        if !(self.proposal_ratio.is_finite() && self.proposal_ratio > 0.0) {
            return Err(Error::InvalidParameter {
                name: "proposal_ratio",
                message: "must be finite and > 0",
            });
        }
        let a = &self.anneal;
        if !(a.start_temp > 0.0 && a.stop_temp > 0.0) {
            return Err(Error::InvalidParameter {
                name: "anneal",
                message: "temperatures must be > 0",
            });
        }
        if !(0.0..=1.0).contains(&a.plateau_fraction) {
            return Err(Error::InvalidParameter {
                name: "anneal.plateau_fraction",
                message: "must lie in [0, 1]",
            });
        }
        if a.reheat_divisions == 0 {
            return Err(Error::InvalidParameter {
                name: "anneal.reheat_divisions",
                message: "must be > 0",
            });
        }
        Ok(())
    }
}
