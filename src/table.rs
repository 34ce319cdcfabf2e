//! Table access for categorical imputation
//!
//! The imputer only needs a handful of operations from its tabular container:
//! column names, a per-cell categorical view with missingness, null counts and
//! writing back a filled column. [`CategoricalTable`] captures those, and is
//! implemented once for polars [`DataFrame`].
//!
//! Cells are handled through their string rendering. Supported dtypes are
//! strings, categoricals and enums, booleans, integers and floats; anything
//! else is rejected with [`ImputeError::DataError`]. When a column is written
//! back only previously missing cells take the new values and the column keeps
//! its original dtype.

use crate::error::{ImputeError, Result};
use crate::imputation::GroupKey;
use polars::prelude::*;
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Categorical view of a single column; `None` marks a missing cell
pub type CategoryColumn = Vec<Option<String>>;

/// Minimal table interface used by the imputer
pub trait CategoricalTable {
    /// Column names in table order
    fn column_names(&self) -> Vec<String>;

    /// Number of rows
    fn n_rows(&self) -> usize;

    /// Number of missing cells in a column
    fn null_count(&self, name: &str) -> Result<usize>;

    /// Categorical view of a column
    fn categorical_column(&self, name: &str) -> Result<CategoryColumn>;

    /// Replace a column with `values`, keeping every non-missing original cell
    fn replace_categorical(&mut self, name: &str, values: &[Option<String>]) -> Result<()>;
}

/// Partition row indices by the values of already rendered key columns.
///
/// Rows with a missing key value are grouped under `None` in that position,
/// so they form their own group rather than being dropped.
pub fn group_rows(key_columns: &[&CategoryColumn], n_rows: usize) -> BTreeMap<GroupKey, Vec<usize>> {
    let mut groups: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
    for row in 0..n_rows {
        let values = key_columns.iter().map(|col| col[row].clone()).collect();
        groups.entry(GroupKey::new(values)).or_default().push(row);
    }
    groups
}

fn is_supported_dtype(dtype: &DataType) -> bool {
    dtype.is_integer()
        || dtype.is_float()
        || matches!(
            dtype,
            DataType::String
                | DataType::Boolean
                | DataType::Null
                | DataType::Categorical(_, _)
                | DataType::Enum(_, _)
        )
}

/// Cast a merged string column back to `dtype`
fn restore_dtype(merged: Series, dtype: &DataType) -> Result<Series> {
    let restored = match dtype {
        DataType::String => merged,
        // The original rev map cannot be reused; a fresh one is built from the values
        DataType::Categorical(_, ordering) => merged.cast(&DataType::Categorical(None, *ordering))?,
        DataType::Boolean => {
            let flags = merged
                .str()?
                .into_iter()
                .map(|v| match v {
                    None => Ok(None),
                    Some("true") => Ok(Some(true)),
                    Some("false") => Ok(Some(false)),
                    Some(other) => Err(ImputeError::DataError(format!(
                        "Cannot restore boolean from category '{}' in column {}",
                        other,
                        merged.name()
                    ))),
                })
                .collect::<Result<Vec<Option<bool>>>>()?;
            Series::new(merged.name().clone(), flags)
        }
        _ => merged.strict_cast(dtype)?,
    };
    Ok(restored)
}

impl CategoricalTable for DataFrame {
    fn column_names(&self) -> Vec<String> {
        self.get_columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect()
    }

    fn n_rows(&self) -> usize {
        self.height()
    }

    fn null_count(&self, name: &str) -> Result<usize> {
        let column = self
            .column(name)
            .map_err(|_| ImputeError::FeatureNotFound(name.to_string()))?;
        Ok(column.null_count())
    }

    fn categorical_column(&self, name: &str) -> Result<CategoryColumn> {
        let column = self
            .column(name)
            .map_err(|_| ImputeError::FeatureNotFound(name.to_string()))?;
        if !is_supported_dtype(column.dtype()) {
            return Err(ImputeError::DataError(format!(
                "Column {} has unsupported dtype {}",
                name,
                column.dtype()
            )));
        }
        let rendered = column.as_materialized_series().cast(&DataType::String)?;
        let ca = rendered.str()?;

        Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect())
    }

    fn replace_categorical(&mut self, name: &str, values: &[Option<String>]) -> Result<()> {
        let original = self
            .column(name)
            .map_err(|_| ImputeError::FeatureNotFound(name.to_string()))?
            .as_materialized_series()
            .clone();

        // Merge in string space, then restore the dtype
        let ca: StringChunked = values.iter().map(|v| v.as_deref()).collect();
        let filled = ca.with_name(original.name().clone()).into_series();
        let rendered = original.cast(&DataType::String)?;
        let merged = rendered.zip_with(&original.is_not_null(), &filled)?;

        let restored = restore_dtype(merged, original.dtype())?;
        self.with_column(restored)?;
        Ok(())
    }
}

/// Borrowed fit/transform input: a table or a single column
#[derive(Debug, Clone, Copy)]
pub enum DataRef<'a> {
    Frame(&'a DataFrame),
    Series(&'a Series),
}

impl<'a> DataRef<'a> {
    /// View the input as a table; a single column becomes a one-column frame
    pub fn to_frame(self) -> Cow<'a, DataFrame> {
        match self {
            DataRef::Frame(df) => Cow::Borrowed(df),
            DataRef::Series(series) => Cow::Owned(series.clone().into_frame()),
        }
    }
}

impl<'a> From<&'a DataFrame> for DataRef<'a> {
    fn from(df: &'a DataFrame) -> Self {
        DataRef::Frame(df)
    }
}

impl<'a> From<&'a Series> for DataRef<'a> {
    fn from(series: &'a Series) -> Self {
        DataRef::Series(series)
    }
}

/// Transform output.
///
/// A result with exactly one column is returned unwrapped as a [`Series`].
#[derive(Debug, Clone)]
pub enum Imputed {
    Frame(DataFrame),
    Series(Series),
}

impl Imputed {
    pub(crate) fn from_frame(df: DataFrame) -> Self {
        if df.width() == 1 {
            let series = df.get_columns()[0].as_materialized_series().clone();
            Imputed::Series(series)
        } else {
            Imputed::Frame(df)
        }
    }

    pub fn is_series(&self) -> bool {
        matches!(self, Imputed::Series(_))
    }

    pub fn as_frame(&self) -> Option<&DataFrame> {
        match self {
            Imputed::Frame(df) => Some(df),
            Imputed::Series(_) => None,
        }
    }

    pub fn as_series(&self) -> Option<&Series> {
        match self {
            Imputed::Series(series) => Some(series),
            Imputed::Frame(_) => None,
        }
    }

    /// Convert into a table regardless of shape
    pub fn into_frame(self) -> DataFrame {
        match self {
            Imputed::Frame(df) => df,
            Imputed::Series(series) => series.into_frame(),
        }
    }

    pub fn into_series(self) -> Option<Series> {
        match self {
            Imputed::Series(series) => Some(series),
            Imputed::Frame(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_df() -> DataFrame {
        df!(
            "g" => &[Some("x"), Some("y"), None, Some("x")],
            "c" => &[Some("a"), None, Some("b"), Some("a")],
        )
        .unwrap()
    }

    #[test]
    fn test_categorical_column_marks_missing() {
        let df = sample_df();
        let col = df.categorical_column("c").unwrap();
        assert_eq!(
            col,
            vec![Some("a".to_string()), None, Some("b".to_string()), Some("a".to_string())]
        );
    }

    #[test]
    fn test_categorical_column_unknown() {
        let df = sample_df();
        assert!(matches!(
            df.categorical_column("nope"),
            Err(ImputeError::FeatureNotFound(_))
        ));
    }

    #[test]
    fn test_group_rows_keeps_missing_group() {
        let df = sample_df();
        let keys = df.categorical_column("g").unwrap();
        let groups = group_rows(&[&keys], df.height());

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[&GroupKey::new(vec![Some("x".to_string())])], vec![0, 3]);
        assert_eq!(groups[&GroupKey::new(vec![Some("y".to_string())])], vec![1]);
        assert_eq!(groups[&GroupKey::new(vec![None])], vec![2]);
    }

    #[test]
    fn test_replace_categorical_restores_dtype() {
        let mut df = df!("n" => &[Some(1i64), None, Some(3)]).unwrap();
        let values = vec![Some("1".to_string()), Some("3".to_string()), Some("3".to_string())];
        df.replace_categorical("n", &values).unwrap();

        let col = df.column("n").unwrap();
        assert_eq!(col.dtype(), &DataType::Int64);
        let ca = col.i64().unwrap();
        assert_eq!(ca.get(0), Some(1));
        assert_eq!(ca.get(1), Some(3));
        assert_eq!(ca.get(2), Some(3));
    }

    #[test]
    fn test_replace_categorical_restores_boolean() {
        let mut df = df!("flag" => &[Some(true), None, Some(false)]).unwrap();
        let values = vec![Some("true".to_string()), Some("false".to_string()), Some("false".to_string())];
        df.replace_categorical("flag", &values).unwrap();

        let col = df.column("flag").unwrap();
        assert_eq!(col.dtype(), &DataType::Boolean);
        let ca = col.bool().unwrap();
        assert_eq!(ca.get(0), Some(true));
        assert_eq!(ca.get(1), Some(false));
        assert_eq!(ca.get(2), Some(false));
    }

    #[test]
    fn test_replace_categorical_restores_categorical() {
        let series = Series::new("c".into(), &[Some("a"), None, Some("b")])
            .cast(&DataType::Categorical(None, CategoricalOrdering::Physical))
            .unwrap();
        let mut df = series.into_frame();
        let values = vec![Some("a".to_string()), Some("b".to_string()), Some("b".to_string())];
        df.replace_categorical("c", &values).unwrap();

        assert!(matches!(
            df.column("c").unwrap().dtype(),
            DataType::Categorical(_, _)
        ));
        let col = df.categorical_column("c").unwrap();
        assert_eq!(
            col,
            vec![Some("a".to_string()), Some("b".to_string()), Some("b".to_string())]
        );
    }

    #[test]
    fn test_null_count() {
        let df = sample_df();
        assert_eq!(CategoricalTable::null_count(&df, "c").unwrap(), 1);
        assert!(matches!(
            CategoricalTable::null_count(&df, "nope"),
            Err(ImputeError::FeatureNotFound(_))
        ));
    }

    #[test]
    fn test_unsupported_dtype_rejected() {
        let dates = Series::new("d".into(), &[Some(1i32), None])
            .cast(&DataType::Date)
            .unwrap();
        let df = dates.into_frame();
        assert!(matches!(
            df.categorical_column("d"),
            Err(ImputeError::DataError(_))
        ));
    }

    #[test]
    fn test_replace_categorical_keeps_observed_cells() {
        let mut df = sample_df();
        // Only the missing cell may change, whatever the replacement holds elsewhere
        let values = vec![Some("z".to_string()), Some("b".to_string()), None, None];
        df.replace_categorical("c", &values).unwrap();

        let col = df.categorical_column("c").unwrap();
        assert_eq!(
            col,
            vec![
                Some("a".to_string()),
                Some("b".to_string()),
                Some("b".to_string()),
                Some("a".to_string())
            ]
        );
    }

    #[test]
    fn test_imputed_unwraps_single_column() {
        let df = df!("c" => &["a", "b"]).unwrap();
        let out = Imputed::from_frame(df);
        assert!(out.is_series());
        assert_eq!(out.as_series().unwrap().name().as_str(), "c");

        let wide = Imputed::from_frame(sample_df());
        assert!(!wide.is_series());
        assert_eq!(wide.into_frame().width(), 2);
    }

    #[test]
    fn test_series_input_becomes_frame() {
        let series = Series::new("c".into(), &[Some("a"), None]);
        let data = DataRef::from(&series);
        let frame = data.to_frame();
        assert_eq!(frame.width(), 1);
        assert_eq!(frame.height(), 2);
    }
}
