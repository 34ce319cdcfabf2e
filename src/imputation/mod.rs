//! Categorical imputation module
//!
//! Provides random imputation of missing categorical values:
//! - Laplace-smoothed category distributions per column
//! - Optional stratification by one or more key columns
//! - Reproducible draws from a seeded generator

mod category;
mod config;
mod distribution;

pub use category::CategoryDistributionImputer;
pub use config::{ImputerConfig, StratifyOn};
pub use distribution::{build_vocabulary, DistributionKey, GroupKey, SmoothedDistribution};

use crate::error::Result;
use crate::table::{DataRef, Imputed};

/// Trait for imputers
pub trait Imputer: Send + Sync {
    /// Fit the imputer on data with missing values
    fn fit(&mut self, data: DataRef<'_>) -> Result<()>;

    /// Transform data by imputing missing values
    fn transform(&self, data: DataRef<'_>) -> Result<Imputed>;

    /// Fit and transform in one step
    fn fit_transform(&mut self, data: DataRef<'_>) -> Result<Imputed> {
        self.fit(data)?;
        self.transform(data)
    }
}

/// Check if a cell is missing
#[inline]
pub fn is_missing(value: Option<&str>) -> bool {
    value.is_none()
}
