//! Gold-standard evaluation of an induced tagging.
//!
//! Every measure compares a token-level cluster sequence against gold tags
//! through one cluster × tag co-occurrence table.
//!
//! | Metric | Range | Best | Notes |
//! |--------|-------|------|-------|
//! | [`many_to_one`] | [0, 100] | 100 | Each cluster mapped to its most frequent tag |
//! | [`homogeneity`] | [0, 100] | 100 | Each cluster holds one tag |
//! | [`completeness`] | [0, 100] | 100 | Each tag lands in one cluster |
//! | [`v_measure`] | [0, 100] | 100 | Harmonic mean of the two above |
//! | [`variation_of_information`] | [0, ∞) bits | 0 | `H(C|T) + H(T|C)` |
//!
//! Entropies are in bits. When the tag entropy is zero homogeneity is taken
//! to be 100; when the cluster entropy is zero completeness is 100; when both
//! homogeneity and completeness are zero the V-measure is 0.
//!
//! ```rust
//! use tagmix::metrics::{many_to_one, v_measure};
//!
//! let pred = [0, 0, 1, 1];
//! let gold = [3, 3, 5, 5];
//! assert!((many_to_one(&pred, &gold) - 100.0).abs() < 1e-9);
//! assert!((v_measure(&pred, &gold) - 100.0).abs() < 1e-9);
//! ```
//!
//! # References
//!
//! - Rosenberg & Hirschberg (2007). "V-Measure"
//! - Meilă (2007). "Comparing clusterings: an information based distance"
//! - Christodoulopoulos, Goldwater & Steedman (2010). "Two decades of
//!   unsupervised POS induction: how far have we come?"

use crate::error::{Error, Result};
use ndarray::Array2;
use std::fmt;

const ZERO_ENTROPY: f64 = 1e-10;

/// Cluster × tag co-occurrence counts over a token sequence.
#[derive(Debug, Clone)]
pub struct ContingencyTable {
    cooc: Array2<usize>,
    cluster_counts: Vec<usize>,
    tag_counts: Vec<usize>,
    total: usize,
}

impl ContingencyTable {
    /// Count co-occurrences of `pred[i]` and `gold[i]`.
    ///
    /// Labels are used as indices, so both sequences should be densely coded.
    pub fn new(pred: &[usize], gold: &[usize]) -> Result<Self> {
        if pred.is_empty() {
            return Err(Error::EmptyInput);
        }
        if pred.len() != gold.len() {
            return Err(Error::DimensionMismatch {
                expected: gold.len(),
                found: pred.len(),
            });
        }

        let n_clusters = pred.iter().max().map_or(0, |&m| m + 1);
        let n_tags = gold.iter().max().map_or(0, |&m| m + 1);
        let mut cooc = Array2::zeros((n_clusters, n_tags));
        let mut cluster_counts = vec![0; n_clusters];
        let mut tag_counts = vec![0; n_tags];
        for (&c, &t) in pred.iter().zip(gold) {
            cooc[[c, t]] += 1;
            cluster_counts[c] += 1;
            tag_counts[t] += 1;
        }

        Ok(Self {
            cooc,
            cluster_counts,
            tag_counts,
            total: pred.len(),
        })
    }

    /// Number of tokens.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Percentage of tokens whose cluster's most frequent tag is their own.
    pub fn many_to_one(&self) -> f64 {
        let correct: usize = self
            .cooc
            .rows()
            .into_iter()
            .map(|row| row.iter().copied().max().unwrap_or(0))
            .sum();
        correct as f64 / self.total as f64 * 100.0
    }

    /// `H(C)` in bits.
    pub fn cluster_entropy(&self) -> f64 {
        entropy(&self.cluster_counts, self.total)
    }

    /// `H(T)` in bits.
    pub fn tag_entropy(&self) -> f64 {
        entropy(&self.tag_counts, self.total)
    }

    /// `I(C; T)` in bits.
    pub fn mutual_information(&self) -> f64 {
        let n = self.total as f64;
        let mut mi = 0.0;
        for ((c, t), &count) in self.cooc.indexed_iter() {
            if count == 0 {
                continue;
            }
            let p = count as f64 / n;
            let p_c = self.cluster_counts[c] as f64 / n;
            let p_t = self.tag_counts[t] as f64 / n;
            mi += p * (p / (p_c * p_t)).log2();
        }
        mi
    }

    /// `1 - H(T|C) / H(T)`, as a percentage.
    pub fn homogeneity(&self) -> f64 {
        self.parts().homogeneity * 100.0
    }

    /// `1 - H(C|T) / H(C)`, as a percentage.
    pub fn completeness(&self) -> f64 {
        self.parts().completeness * 100.0
    }

    /// Harmonic mean of homogeneity and completeness, as a percentage.
    pub fn v_measure(&self) -> f64 {
        self.parts().v_measure * 100.0
    }

    /// `H(C|T) + H(T|C)` in bits.
    pub fn variation_of_information(&self) -> f64 {
        let mi = self.mutual_information();
        (self.cluster_entropy() - mi) + (self.tag_entropy() - mi)
    }

    /// All measures at once.
    pub fn evaluation(&self) -> Evaluation {
        let parts = self.parts();
        Evaluation {
            many_to_one: self.many_to_one(),
            v_measure: parts.v_measure * 100.0,
            homogeneity: parts.homogeneity * 100.0,
            completeness: parts.completeness * 100.0,
            variation_of_information: self.variation_of_information(),
        }
    }

    fn parts(&self) -> VParts {
        let h_c = self.cluster_entropy();
        let h_t = self.tag_entropy();
        let mi = self.mutual_information();

        let homogeneity = if h_t < ZERO_ENTROPY {
            1.0
        } else {
            1.0 - (h_t - mi) / h_t
        };
        let completeness = if h_c < ZERO_ENTROPY {
            1.0
        } else {
            1.0 - (h_c - mi) / h_c
        };
        let v_measure = if homogeneity + completeness < ZERO_ENTROPY {
            0.0
        } else {
            2.0 * homogeneity * completeness / (homogeneity + completeness)
        };

        VParts {
            homogeneity,
            completeness,
            v_measure,
        }
    }
}

struct VParts {
    homogeneity: f64,
    completeness: f64,
    v_measure: f64,
}

fn entropy(counts: &[usize], total: usize) -> f64 {
    let n = total as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            -p * p.log2()
        })
        .sum()
}

/// Scores of one tagging against the gold standard.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Evaluation {
    /// Many-to-one accuracy (percent).
    pub many_to_one: f64,
    /// V-measure (percent).
    pub v_measure: f64,
    /// Homogeneity (percent).
    pub homogeneity: f64,
    /// Completeness (percent).
    pub completeness: f64,
    /// Variation of information (bits).
    pub variation_of_information: f64,
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "M-1:\t{:.2}", self.many_to_one)?;
        writeln!(f, "VI:\t{:.2}", self.variation_of_information)?;
        writeln!(f, "VM:\t{:.2}", self.v_measure)?;
        writeln!(f, "VM-Homogeneity:\t{:.2}", self.homogeneity)?;
        write!(f, "VM-Completeness:\t{:.2}", self.completeness)
    }
}

/// Build the table once and compute every measure.
pub fn evaluate(pred: &[usize], gold: &[usize]) -> Result<Evaluation> {
    Ok(ContingencyTable::new(pred, gold)?.evaluation())
}

/// Many-to-one accuracy (percent). Returns 0 on empty or mismatched input.
pub fn many_to_one(pred: &[usize], gold: &[usize]) -> f64 {
    ContingencyTable::new(pred, gold).map_or(0.0, |t| t.many_to_one())
}

/// Homogeneity (percent). Returns 0 on empty or mismatched input.
pub fn homogeneity(pred: &[usize], gold: &[usize]) -> f64 {
    ContingencyTable::new(pred, gold).map_or(0.0, |t| t.homogeneity())
}

/// Completeness (percent). Returns 0 on empty or mismatched input.
pub fn completeness(pred: &[usize], gold: &[usize]) -> f64 {
    ContingencyTable::new(pred, gold).map_or(0.0, |t| t.completeness())
}

/// V-measure (percent). Returns 0 on empty or mismatched input.
pub fn v_measure(pred: &[usize], gold: &[usize]) -> f64 {
    ContingencyTable::new(pred, gold).map_or(0.0, |t| t.v_measure())
}

/// Variation of information in bits. Returns 0 on empty or mismatched input.
pub fn variation_of_information(pred: &[usize], gold: &[usize]) -> f64 {
    ContingencyTable::new(pred, gold).map_or(0.0, |t| t.variation_of_information())
}

/// Gold tags for every token, plus the token → word type map needed to
/// expand a per-type assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct GoldStandard {
    token_types: Vec<usize>,
    tags: Vec<usize>,
}

impl GoldStandard {
    /// `token_types[i]` is the word type of token `i`, `tags[i]` its coded
    /// gold tag.
    pub fn new(token_types: Vec<usize>, tags: Vec<usize>) -> Result<Self> {
        if tags.is_empty() {
            return Err(Error::EmptyInput);
        }
        if token_types.len() != tags.len() {
            return Err(Error::DimensionMismatch {
                expected: tags.len(),
                found: token_types.len(),
            });
        }
        Ok(Self { token_types, tags })
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether there are no tokens.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Coded gold tags, one per token.
    pub fn tags(&self) -> &[usize] {
        &self.tags
    }

    /// Expand a per-type assignment to tokens.
    pub fn token_assignments(&self, assignment: &[usize]) -> Result<Vec<usize>> {
        self.token_types
            .iter()
            .map(|&t| {
                assignment.get(t).copied().ok_or(Error::DimensionMismatch {
                    expected: t + 1,
                    found: assignment.len(),
                })
            })
            .collect()
    }

    /// Score a per-type assignment.
    pub fn evaluate(&self, assignment: &[usize]) -> Result<Evaluation> {
        let pred = self.token_assignments(assignment)?;
        evaluate(&pred, &self.tags)
    }
}
