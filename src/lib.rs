//! # tagmix
//!
//! Unsupervised word-class (part-of-speech) induction with a Bayesian
//! multinomial mixture over word types, fitted by collapsed Gibbs sampling
//! with simulated annealing and Metropolis-Hastings hyperparameter inference.
//!
//! The core is the [`sampler`]. Around it sit an in-memory [`corpus`] that
//! builds the standard feature channels and the gold-standard [`metrics`]
//! used to score an induced tagging.
//!
//! ```rust
//! use tagmix::{Corpus, CorpusOptions, SamplerConfig, TagInducer};
//!
//! let sentences = vec![
//!     vec!["the", "dog", "barks"],
//!     vec!["a", "cat", "sleeps"],
//!     vec!["the", "cat", "barks"],
//! ];
//! let tags = vec![
//!     vec!["DT", "NN", "VB"],
//!     vec!["DT", "NN", "VB"],
//!     vec!["DT", "NN", "VB"],
//! ];
//! let corpus =
//!     Corpus::from_sentences(&sentences, Some(tags.as_slice()), CorpusOptions::default()).unwrap();
//! let features = corpus.feature_set().unwrap();
//!
//! let inducer = TagInducer::new(SamplerConfig::new(3).with_iterations(50).with_seed(1))
//!     .with_gold(corpus.gold_standard().unwrap());
//! let outcome = inducer.run_with(&features, &mut ()).unwrap();
//! assert_eq!(outcome.assignment().len(), corpus.num_types());
//! assert!(outcome.evaluation().is_some());
//! ```

pub mod config;
pub mod corpus;
/// Error types used across `tagmix`.
pub mod error;
pub mod features;
pub mod metrics;
pub mod sampler;
pub mod traits;

pub use config::{AnnealConfig, HyperShape, LogSampling, MhReference, SamplerConfig};
pub use corpus::{Corpus, CorpusOptions};
pub use error::{Error, Result};
pub use features::{Channel, FeatureSet};
pub use metrics::{
    completeness, evaluate, homogeneity, many_to_one, v_measure, variation_of_information,
    ContingencyTable, Evaluation, GoldStandard,
};
pub use sampler::{
    Chain, FeatureHyper, Hyperparameters, IterationReport, LogObserver, Outcome,
    SamplerObserver, TagInducer, WriterObserver,
};
pub use traits::Clustering;
