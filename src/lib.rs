//! Category Impute - random imputation of missing categorical values
//!
//! Missing cells are filled with draws from the empirical category distribution
//! of their column, smoothed with an additive (Laplace) constant so rare
//! categories keep a non-zero chance. Distributions can be conditioned on one
//! or more stratify columns, in which case each group of rows draws from its
//! own distribution.
//!
//! # Modules
//!
//! - [`imputation`] - the imputer, its configuration and fitted distributions
//! - [`table`] - table access over polars frames and input/output shapes
//! - [`error`] - error type and result alias
//!
//! # Example
//!
//! ```ignore
//! use category_impute::prelude::*;
//! use polars::prelude::*;
//!
//! let df = df!(
//!     "region" => &["n", "n", "s", "s"],
//!     "color" => &[Some("red"), None, Some("blue"), None],
//! )?;
//!
//! let mut imputer = CategoryDistributionImputer::new()
//!     .with_stratify_on("region")
//!     .with_random_state(42);
//! let filled = imputer.fit_transform(&df)?.into_frame();
//! ```

pub mod error;
pub mod imputation;
pub mod table;

pub use error::{ImputeError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{ImputeError, Result};
    pub use crate::imputation::{
        CategoryDistributionImputer, DistributionKey, GroupKey, Imputer, ImputerConfig,
        SmoothedDistribution, StratifyOn,
    };
    pub use crate::table::{CategoricalTable, DataRef, Imputed};
}
