//! Sufficient statistics for the collapsed mixture.
//!
//! Tracks the cluster assignment of every word type together with the counts
//! the collapsed conditionals need:
//!
//! - `types_per_class[c]`: word types currently in cluster `c`
//! - per channel, `features_per_class[c, f]`: feature tokens of `f` summed
//!   over the types in `c`, and its row totals `class_totals[c]`
//!
//! Updates are O(non-zero features of one type). A single type's update must
//! go `remove` → score → sample → `add` before the next type is touched; the
//! [`Removed`] token returned by `remove` is the only way to call `add`.

use crate::error::{Error, Result};
use crate::features::FeatureSet;
use ndarray::Array2;

/// Per-channel cluster × feature counts.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelCounts {
    /// `K × F` feature-token counts.
    pub features_per_class: Array2<u64>,
    /// Row totals of `features_per_class`.
    pub class_totals: Vec<u64>,
}

/// A word type that has been taken out of the counts.
///
/// Produced by [`SufficientStats::remove`] and consumed by
/// [`SufficientStats::add`]. It cannot be cloned, so a type is re-added
/// exactly once.
#[must_use = "a removed word type must be re-added with SufficientStats::add"]
#[derive(Debug)]
pub struct Removed {
    word_type: usize,
    previous: usize,
}

impl Removed {
    /// The detached word type.
    pub fn word_type(&self) -> usize {
        self.word_type
    }

    /// The cluster it was removed from.
    pub fn previous(&self) -> usize {
        self.previous
    }
}

/// Assignment plus the counts derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct SufficientStats {
    /// Number of clusters.
    k: usize,
    /// Cluster of each word type.
    assignment: Vec<usize>,
    /// Word types per cluster.
    types_per_class: Vec<usize>,
    /// One entry per channel, in [`FeatureSet`] order.
    channels: Vec<ChannelCounts>,
}

impl SufficientStats {
    /// Build statistics from scratch for a given assignment.
    pub fn from_assignment(features: &FeatureSet, k: usize, assignment: Vec<usize>) -> Result<Self> {
        if assignment.len() != features.num_types() {
            return Err(Error::DimensionMismatch {
                expected: features.num_types(),
                found: assignment.len(),
            });
        }
        if let Some(&bad) = assignment.iter().find(|&&c| c >= k) {
            return Err(Error::InvalidClusterCount {
                requested: bad + 1,
                n_items: k,
            });
        }
        Ok(Self::tally(features, k, assignment))
    }

    fn tally(features: &FeatureSet, k: usize, assignment: Vec<usize>) -> Self {
        let mut types_per_class = vec![0usize; k];
        let mut channels: Vec<ChannelCounts> = features
            .channels()
            .iter()
            .map(|ch| ChannelCounts {
                features_per_class: Array2::zeros((k, ch.num_features())),
                class_totals: vec![0; k],
            })
            .collect();

        for (t, &c) in assignment.iter().enumerate() {
            types_per_class[c] += 1;
            for (counts, ch) in channels.iter_mut().zip(features.channels()) {
                for &(f, n) in ch.support(t) {
                    counts.features_per_class[[c, f]] += n as u64;
                }
                counts.class_totals[c] += ch.row_total(t);
            }
        }

        Self {
            k,
            assignment,
            types_per_class,
            channels,
        }
    }

    /// Take `word_type` out of every count.
    ///
    /// Its entry in the assignment keeps the old cluster until [`add`](Self::add).
    pub fn remove(&mut self, features: &FeatureSet, word_type: usize) -> Removed {
        let c = self.assignment[word_type];
        self.types_per_class[c] -= 1;
        for (counts, ch) in self.channels.iter_mut().zip(features.channels()) {
            for &(f, n) in ch.support(word_type) {
                counts.features_per_class[[c, f]] -= n as u64;
            }
            counts.class_totals[c] -= ch.row_total(word_type);
        }
        Removed {
            word_type,
            previous: c,
        }
    }

    /// Put a removed word type back, into `cluster`.
    pub fn add(&mut self, features: &FeatureSet, removed: Removed, cluster: usize) {
        debug_assert!(cluster < self.k);
        let t = removed.word_type;
        self.types_per_class[cluster] += 1;
        for (counts, ch) in self.channels.iter_mut().zip(features.channels()) {
            for &(f, n) in ch.support(t) {
                counts.features_per_class[[cluster, f]] += n as u64;
            }
            counts.class_totals[cluster] += ch.row_total(t);
        }
        self.assignment[t] = cluster;
    }

    /// Number of clusters.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of word types.
    pub fn num_types(&self) -> usize {
        self.assignment.len()
    }

    /// Current cluster of every word type.
    pub fn assignment(&self) -> &[usize] {
        &self.assignment
    }

    /// Word types per cluster.
    pub fn types_per_class(&self) -> &[usize] {
        &self.types_per_class
    }

    /// Counts for channel `index` (in [`FeatureSet`] order).
    pub fn channel(&self, index: usize) -> &ChannelCounts {
        &self.channels[index]
    }

    /// Recount from scratch and compare.
    pub fn check_consistency(&self, features: &FeatureSet) -> Result<()> {
        let fresh = Self::tally(features, self.k, self.assignment.clone());
        if fresh.types_per_class != self.types_per_class {
            return Err(Error::Inconsistent(format!(
                "types per class {:?}, expected {:?}",
                self.types_per_class, fresh.types_per_class
            )));
        }
        for (i, (have, want)) in self.channels.iter().zip(&fresh.channels).enumerate() {
            if have != want {
                return Err(Error::Inconsistent(format!(
                    "feature counts of channel '{}'",
                    features.channels()[i].name()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Channel;
    use proptest::prelude::*;

    fn toy_features() -> FeatureSet {
        let ctx = Channel::from_rows(
            "context",
            &[vec![2, 0, 1], vec![0, 3, 0], vec![1, 1, 1], vec![0, 0, 0]],
        )
        .unwrap();
        let shape = Channel::from_rows("shape", &[vec![1, 0], vec![0, 1], vec![1, 0], vec![0, 1]])
            .unwrap();
        FeatureSet::new(vec![ctx, shape]).unwrap()
    }

    #[test]
    fn test_from_assignment_counts() {
        let features = toy_features();
        let stats = SufficientStats::from_assignment(&features, 2, vec![0, 1, 0, 1]).unwrap();
        assert_eq!(stats.types_per_class(), &[2, 2]);
        let ctx = stats.channel(0);
        assert_eq!(ctx.features_per_class[[0, 0]], 3);
        assert_eq!(ctx.features_per_class[[0, 2]], 2);
        assert_eq!(ctx.features_per_class[[1, 1]], 3);
        assert_eq!(ctx.class_totals, vec![6, 3]);
        assert!(stats.check_consistency(&features).is_ok());
    }

    #[test]
    fn test_remove_then_add_elsewhere() {
        let features = toy_features();
        let mut stats = SufficientStats::from_assignment(&features, 3, vec![0, 1, 0, 1]).unwrap();
        let removed = stats.remove(&features, 2);
        assert_eq!(removed.previous(), 0);
        assert_eq!(stats.types_per_class(), &[1, 2, 0]);
        assert_eq!(stats.channel(0).class_totals, vec![3, 3, 0]);
        stats.add(&features, removed, 2);
        assert_eq!(stats.assignment(), &[0, 1, 2, 1]);
        assert_eq!(stats.types_per_class(), &[1, 2, 1]);
        assert!(stats.check_consistency(&features).is_ok());
    }

    #[test]
    fn test_out_of_range_assignment_rejected() {
        let features = toy_features();
        assert!(SufficientStats::from_assignment(&features, 2, vec![0, 1, 2, 0]).is_err());
        assert!(SufficientStats::from_assignment(&features, 2, vec![0, 1]).is_err());
    }

    #[test]
    fn test_inconsistency_detected() {
        let features = toy_features();
        let mut stats = SufficientStats::from_assignment(&features, 2, vec![0, 1, 0, 1]).unwrap();
        stats.types_per_class[0] += 1;
        assert!(matches!(
            stats.check_consistency(&features),
            Err(Error::Inconsistent(_))
        ));
    }

    proptest! {
        #[test]
        fn remove_add_same_cluster_is_identity(
            assignment in proptest::collection::vec(0usize..3, 4),
            t in 0usize..4,
        ) {
            let features = toy_features();
            let original = SufficientStats::from_assignment(&features, 3, assignment).unwrap();
            let mut stats = original.clone();
            let removed = stats.remove(&features, t);
            let back = removed.previous();
            stats.add(&features, removed, back);
            prop_assert_eq!(stats, original);
        }

        #[test]
        fn arbitrary_moves_stay_consistent(
            assignment in proptest::collection::vec(0usize..4, 4),
            moves in proptest::collection::vec((0usize..4, 0usize..4), 0..30),
        ) {
            let features = toy_features();
            let mut stats = SufficientStats::from_assignment(&features, 4, assignment).unwrap();
            for (t, c) in moves {
                let removed = stats.remove(&features, t);
                stats.add(&features, removed, c);
            }
            prop_assert!(stats.check_consistency(&features).is_ok());
            prop_assert_eq!(stats.types_per_class().iter().sum::<usize>(), 4);
        }
    }
}
