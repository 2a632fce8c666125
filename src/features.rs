//! Per-word-type feature channels.
//!
//! A channel is a `num_types × n_features` matrix of non-negative counts: how
//! often each feature fired for each word type. The sampler only ever reads
//! channels; they are validated once, here, before any chain exists.

use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1};

/// One named feature channel.
#[derive(Debug, Clone)]
pub struct Channel {
    name: String,
    counts: Array2<u32>,
    /// Row sums of `counts`.
    row_totals: Vec<u64>,
    /// Non-zero `(feature, count)` pairs per word type, in feature order.
    support: Vec<Vec<(usize, u32)>>,
}

impl Channel {
    /// Wrap a dense count matrix (rows are word types).
    pub fn new(name: impl Into<String>, counts: Array2<u32>) -> Result<Self> {
        let name = name.into();
        if counts.ncols() == 0 {
            return Err(Error::InvalidParameter {
                name: "channel",
                message: "must have at least one feature",
            });
        }

        let row_totals = counts
            .rows()
            .into_iter()
            .map(|row| row.iter().map(|&c| c as u64).sum())
            .collect();
        let support = counts
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(_, &c)| c > 0)
                    .map(|(f, &c)| (f, c))
                    .collect()
            })
            .collect();

        Ok(Self {
            name,
            counts,
            row_totals,
            support,
        })
    }

    /// Build a channel from ragged-checked rows.
    pub fn from_rows(name: impl Into<String>, rows: &[Vec<u32>]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::EmptyInput);
        }
        let width = rows[0].len();
        let mut flat = Vec::with_capacity(rows.len() * width);
        for row in rows {
            if row.len() != width {
                return Err(Error::DimensionMismatch {
                    expected: width,
                    found: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }
        let counts = Array2::from_shape_vec((rows.len(), width), flat)
            .map_err(|e| Error::Other(e.to_string()))?;
        Self::new(name, counts)
    }

    /// Channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of word types (rows).
    pub fn num_types(&self) -> usize {
        self.counts.nrows()
    }

    /// Number of features (columns).
    pub fn num_features(&self) -> usize {
        self.counts.ncols()
    }

    /// Dense counts for one word type.
    pub fn row(&self, word_type: usize) -> ArrayView1<'_, u32> {
        self.counts.row(word_type)
    }

    /// Total feature tokens for one word type.
    #[inline]
    pub fn row_total(&self, word_type: usize) -> u64 {
        self.row_totals[word_type]
    }

    /// Non-zero `(feature, count)` pairs for one word type.
    #[inline]
    pub fn support(&self, word_type: usize) -> &[(usize, u32)] {
        &self.support[word_type]
    }

    /// Column sums over all word types.
    pub fn feature_totals(&self) -> Vec<u64> {
        let mut totals = vec![0u64; self.num_features()];
        for row in self.counts.rows() {
            for (t, &c) in totals.iter_mut().zip(row.iter()) {
                *t += c as u64;
            }
        }
        totals
    }

    /// Dense count matrix.
    pub fn counts(&self) -> &Array2<u32> {
        &self.counts
    }
}

/// All feature channels of a run, sharing one word-type index.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    channels: Vec<Channel>,
    num_types: usize,
}

impl FeatureSet {
    /// Validate and bundle channels.
    ///
    /// Fails when no channel is given, when two channels share a name, or
    /// when channels disagree on the number of word types.
    pub fn new(channels: Vec<Channel>) -> Result<Self> {
        let first = channels.first().ok_or(Error::EmptyInput)?;
        let num_types = first.num_types();
        if num_types == 0 {
            return Err(Error::EmptyInput);
        }

        for (i, channel) in channels.iter().enumerate() {
            if channel.num_types() != num_types {
                return Err(Error::ShapeMismatch {
                    expected: format!("{num_types} word types"),
                    actual: format!(
                        "{} word types in channel '{}'",
                        channel.num_types(),
                        channel.name()
                    ),
                });
            }
            if channels[..i].iter().any(|c| c.name() == channel.name()) {
                return Err(Error::DuplicateChannel(channel.name().to_string()));
            }
        }

        Ok(Self {
            channels,
            num_types,
        })
    }

    /// Number of word types.
    pub fn num_types(&self) -> usize {
        self.num_types
    }

    /// Channels in insertion order.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Look a channel up by name.
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name() == name)
    }
}
