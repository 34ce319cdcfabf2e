//! Imputer configuration

use crate::error::{ImputeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Columns used to partition rows before fitting distributions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StratifyOn {
    /// One distribution per column over all rows
    #[default]
    None,
    /// Stratify on a single column
    Column(String),
    /// Stratify on the combination of several columns, in order
    Columns(Vec<String>),
}

impl StratifyOn {
    /// Stratify column names; empty means no stratification
    pub fn columns(&self) -> &[String] {
        match self {
            StratifyOn::None => &[],
            StratifyOn::Column(column) => std::slice::from_ref(column),
            StratifyOn::Columns(columns) => columns,
        }
    }

    pub fn is_stratified(&self) -> bool {
        !self.columns().is_empty()
    }
}

impl From<&str> for StratifyOn {
    fn from(column: &str) -> Self {
        StratifyOn::Column(column.to_string())
    }
}

impl From<String> for StratifyOn {
    fn from(column: String) -> Self {
        StratifyOn::Column(column)
    }
}

impl From<Vec<String>> for StratifyOn {
    fn from(columns: Vec<String>) -> Self {
        StratifyOn::Columns(columns)
    }
}

impl From<&[&str]> for StratifyOn {
    fn from(columns: &[&str]) -> Self {
        StratifyOn::Columns(columns.iter().map(|c| c.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for StratifyOn {
    fn from(columns: [&str; N]) -> Self {
        StratifyOn::from(&columns[..])
    }
}

/// Configuration for [`CategoryDistributionImputer`](super::CategoryDistributionImputer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputerConfig {
    /// Columns whose value combinations define the sampling groups
    pub stratify_on: StratifyOn,

    /// Laplace smoothing constant added to every category count
    pub alpha: f64,

    /// Random seed for reproducible draws
    pub random_state: Option<u64>,
}

impl Default for ImputerConfig {
    fn default() -> Self {
        Self {
            stratify_on: StratifyOn::None,
            alpha: 1.0,
            random_state: None,
        }
    }
}

impl ImputerConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the smoothing constant
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Builder method to set the random seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Builder method to set the stratify columns
    pub fn with_stratify_on(mut self, stratify_on: impl Into<StratifyOn>) -> Self {
        self.stratify_on = stratify_on.into();
        self
    }

    /// Check parameter values
    pub fn validate(&self) -> Result<()> {
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(ImputeError::ConfigError(format!(
                "alpha must be a non-negative finite number, got {}",
                self.alpha
            )));
        }

        let mut seen = HashSet::new();
        for column in self.stratify_on.columns() {
            if !seen.insert(column.as_str()) {
                return Err(ImputeError::ConfigError(format!(
                    "stratify column {} listed more than once",
                    column
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ImputerConfig::default();
        assert_eq!(config.alpha, 1.0);
        assert_eq!(config.random_state, None);
        assert!(!config.stratify_on.is_stratified());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = ImputerConfig::new()
            .with_alpha(0.5)
            .with_random_state(7)
            .with_stratify_on(["region", "segment"]);

        assert_eq!(config.alpha, 0.5);
        assert_eq!(config.random_state, Some(7));
        assert_eq!(config.stratify_on.columns(), &["region", "segment"]);
    }

    #[test]
    fn test_single_column_stratify() {
        let stratify = StratifyOn::from("region");
        assert_eq!(stratify.columns(), &["region"]);
        assert!(stratify.is_stratified());

        let empty = StratifyOn::Columns(Vec::new());
        assert!(!empty.is_stratified());
    }

    #[test]
    fn test_negative_alpha_rejected() {
        let config = ImputerConfig::new().with_alpha(-0.1);
        assert!(matches!(config.validate(), Err(ImputeError::ConfigError(_))));

        let config = ImputerConfig::new().with_alpha(f64::NAN);
        assert!(matches!(config.validate(), Err(ImputeError::ConfigError(_))));
    }

    #[test]
    fn test_duplicate_stratify_rejected() {
        let config = ImputerConfig::new().with_stratify_on(["g", "g"]);
        assert!(matches!(config.validate(), Err(ImputeError::ConfigError(_))));
    }
}
