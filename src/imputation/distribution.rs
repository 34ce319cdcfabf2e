//! Smoothed category distributions and their keys

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Values of the stratify columns for one group, in stratify order.
///
/// `None` stands for a missing key value; such rows form a group of their own.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey(Vec<Option<String>>);

impl GroupKey {
    pub fn new(values: Vec<Option<String>>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[Option<String>] {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match value {
                Some(v) => write!(f, "{}", v)?,
                None => write!(f, "<missing>")?,
            }
        }
        write!(f, ")")
    }
}

/// Selects the stored distribution that applies to a cell
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DistributionKey {
    /// Unstratified distribution of a column
    Global { column: String },
    /// Distribution of a column restricted to one group
    Grouped { group: GroupKey, column: String },
}

impl DistributionKey {
    pub fn global(column: impl Into<String>) -> Self {
        DistributionKey::Global { column: column.into() }
    }

    pub fn grouped(group: GroupKey, column: impl Into<String>) -> Self {
        DistributionKey::Grouped {
            group,
            column: column.into(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            DistributionKey::Global { column } | DistributionKey::Grouped { column, .. } => column,
        }
    }
}

/// Distinct non-missing values in sorted order
pub fn build_vocabulary<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    values
        .into_iter()
        .flatten()
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Laplace-smoothed categorical distribution over a fixed vocabulary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothedDistribution {
    categories: Vec<String>,
    counts: Vec<u64>,
    probabilities: Vec<f64>,
}

impl SmoothedDistribution {
    /// Count `values` against `vocabulary`, add `alpha` to every count and normalize.
    ///
    /// Missing values and values outside the vocabulary are not counted. When the
    /// smoothed total is zero (no observations and `alpha == 0`) every probability
    /// is zero and the distribution has no support.
    pub fn fit<'a, I>(vocabulary: &[String], values: I, alpha: f64) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let index: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, category)| (category.as_str(), i))
            .collect();

        let mut counts = vec![0u64; vocabulary.len()];
        for value in values.into_iter().flatten() {
            if let Some(&i) = index.get(value) {
                counts[i] += 1;
            }
        }

        let total: f64 = counts.iter().map(|&c| c as f64 + alpha).sum();
        let probabilities = counts
            .iter()
            .map(|&c| if total > 0.0 { (c as f64 + alpha) / total } else { 0.0 })
            .collect();

        Self {
            categories: vocabulary.to_vec(),
            counts,
            probabilities,
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Raw observation counts, parallel to [`categories`](Self::categories)
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Smoothed probability of `category`, if it is in the vocabulary
    pub fn probability(&self, category: &str) -> Option<f64> {
        self.categories
            .iter()
            .position(|c| c == category)
            .map(|i| self.probabilities[i])
    }

    /// Whether at least one category can be drawn
    pub fn has_support(&self) -> bool {
        self.probabilities.iter().any(|&p| p > 0.0)
    }

    /// Draw `n` categories independently with replacement.
    ///
    /// Returns `None` when the distribution has no support.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Option<Vec<&str>> {
        let weights = WeightedIndex::new(&self.probabilities).ok()?;
        Some(
            (0..n)
                .map(|_| self.categories[weights.sample(rng)].as_str())
                .collect(),
        )
    }
}
