//! Clustering traits.

use crate::error::Result;
use crate::features::FeatureSet;

/// Trait for hard clustering of word types.
pub trait Clustering {
    /// Fit the model to the feature channels and return cluster assignments.
    ///
    /// Returns one cluster label per word type.
    fn fit_predict(&self, features: &FeatureSet) -> Result<Vec<usize>>;

    /// Get the number of clusters.
    fn n_clusters(&self) -> usize;
}
