//! Random categorical imputation from smoothed category distributions

use super::config::{ImputerConfig, StratifyOn};
use super::distribution::{build_vocabulary, DistributionKey, GroupKey, SmoothedDistribution};
use super::{is_missing, Imputer};
use crate::error::{ImputeError, Result};
use crate::table::{group_rows, CategoricalTable, CategoryColumn, DataRef, Imputed};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Imputer that fills missing categorical cells with random draws.
///
/// `fit` records, for every column, the vocabulary of observed categories and a
/// Laplace-smoothed distribution over it. With stratification enabled one
/// distribution is stored per observed group and column, always over the
/// column's full vocabulary so sparse groups can still draw any category.
///
/// `transform` re-seeds its generator from `random_state` on every call, so a
/// fixed seed gives identical output for identical input.
///
/// Missing cells in a group that was never seen during fit are left missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDistributionImputer {
    config: ImputerConfig,
    #[serde(with = "distribution_entries")]
    distributions: HashMap<DistributionKey, SmoothedDistribution>,
    vocabularies: BTreeMap<String, Vec<String>>,
    feature_names: Vec<String>,
    groups: Vec<GroupKey>,
    is_fitted: bool,
}

impl CategoryDistributionImputer {
    /// Create a new imputer with default configuration
    pub fn new() -> Self {
        Self::with_config(ImputerConfig::default())
    }

    /// Create a new imputer with custom configuration
    pub fn with_config(config: ImputerConfig) -> Self {
        Self {
            config,
            distributions: HashMap::new(),
            vocabularies: BTreeMap::new(),
            feature_names: Vec::new(),
            groups: Vec::new(),
            is_fitted: false,
        }
    }

    /// Set the smoothing constant
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.config.alpha = alpha;
        self
    }

    /// Set the random seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.config.random_state = Some(seed);
        self
    }

    /// Set the stratify columns
    pub fn with_stratify_on(mut self, stratify_on: impl Into<StratifyOn>) -> Self {
        self.config.stratify_on = stratify_on.into();
        self
    }

    /// Fit the imputer to the data
    pub fn fit<'a>(&mut self, data: impl Into<DataRef<'a>>) -> Result<&mut Self> {
        let df = data.into().to_frame();
        self.fit_table(df.as_ref())?;
        Ok(self)
    }

    /// Transform the data by imputing missing values
    pub fn transform<'a>(&self, data: impl Into<DataRef<'a>>) -> Result<Imputed> {
        let df = data.into().to_frame();
        let filled = self.transform_table(df.as_ref())?;
        Ok(Imputed::from_frame(filled))
    }

    /// Fit and transform in one step
    pub fn fit_transform<'a>(&mut self, data: impl Into<DataRef<'a>>) -> Result<Imputed> {
        let data = data.into();
        self.fit(data)?;
        self.transform(data)
    }

    fn fit_table<T: CategoricalTable>(&mut self, table: &T) -> Result<()> {
        self.config.validate()?;

        let alpha = self.config.alpha;
        let stratify = self.config.stratify_on.columns();
        let feature_names = table.column_names();
        for key in stratify {
            if !feature_names.contains(key) {
                return Err(ImputeError::FeatureNotFound(key.clone()));
            }
        }

        let columns = feature_names
            .iter()
            .map(|name| table.categorical_column(name))
            .collect::<Result<Vec<CategoryColumn>>>()?;
        let vocabularies: Vec<Vec<String>> = columns
            .iter()
            .map(|values| build_vocabulary(values.iter().map(|v| v.as_deref())))
            .collect();

        let mut distributions = HashMap::new();
        let mut groups = Vec::new();

        if stratify.is_empty() {
            for ((name, values), vocabulary) in feature_names.iter().zip(&columns).zip(&vocabularies) {
                let dist = SmoothedDistribution::fit(
                    vocabulary,
                    values.iter().map(|v| v.as_deref()),
                    alpha,
                );
                distributions.insert(DistributionKey::global(name.as_str()), dist);
            }
        } else {
            let keys: Vec<&CategoryColumn> = stratify
                .iter()
                .filter_map(|key| feature_names.iter().position(|name| name == key))
                .map(|idx| &columns[idx])
                .collect();

            // Stratify columns get distributions of their own as well
            for (group, rows) in group_rows(&keys, table.n_rows()) {
                for ((name, values), vocabulary) in feature_names.iter().zip(&columns).zip(&vocabularies) {
                    let dist = SmoothedDistribution::fit(
                        vocabulary,
                        rows.iter().map(|&row| values[row].as_deref()),
                        alpha,
                    );
                    distributions.insert(DistributionKey::grouped(group.clone(), name.as_str()), dist);
                }
                groups.push(group);
            }
        }

        debug!(
            columns = feature_names.len(),
            groups = groups.len(),
            distributions = distributions.len(),
            "Fitted category distributions"
        );

        self.vocabularies = feature_names.iter().cloned().zip(vocabularies).collect();
        self.distributions = distributions;
        self.feature_names = feature_names;
        self.groups = groups;
        self.is_fitted = true;
        Ok(())
    }

    fn transform_table<T: CategoricalTable + Clone>(&self, table: &T) -> Result<T> {
        if !self.is_fitted {
            return Err(ImputeError::ModelNotFitted);
        }

        let names = table.column_names();
        if let Some(unknown) = names.iter().find(|name| !self.vocabularies.contains_key(*name)) {
            return Err(ImputeError::UnknownColumn(unknown.clone()));
        }

        let stratify = self.config.stratify_on.columns();
        for key in stratify {
            if !names.contains(key) {
                return Err(ImputeError::FeatureNotFound(key.clone()));
            }
        }

        // Complete columns are only rendered when they key the groups
        let mut columns = names
            .iter()
            .map(|name| {
                if stratify.contains(name) || table.null_count(name)? > 0 {
                    table.categorical_column(name).map(Some)
                } else {
                    Ok(None)
                }
            })
            .collect::<Result<Vec<Option<CategoryColumn>>>>()?;
        let mut filled = vec![0usize; names.len()];
        let mut rng = self.rng();

        if stratify.is_empty() {
            for (idx, name) in names.iter().enumerate() {
                let Some(values) = columns[idx].as_mut() else {
                    continue;
                };
                let missing: Vec<usize> = missing_rows(values, 0..table.n_rows());
                if missing.is_empty() {
                    continue;
                }
                let dist = self
                    .distributions
                    .get(&DistributionKey::global(name.as_str()))
                    .ok_or_else(|| ImputeError::UnknownColumn(name.clone()))?;
                filled[idx] += fill_rows(values, &missing, dist, &mut rng, name)?;
            }
        } else {
            // Groups come from the input as given, before any cell is filled
            let groups = {
                let keys: Vec<&CategoryColumn> = stratify
                    .iter()
                    .filter_map(|key| names.iter().position(|name| name == key))
                    .filter_map(|idx| columns[idx].as_ref())
                    .collect();
                group_rows(&keys, table.n_rows())
            };

            for (group, rows) in groups {
                for (idx, name) in names.iter().enumerate() {
                    let Some(values) = columns[idx].as_mut() else {
                        continue;
                    };
                    let missing = missing_rows(values, rows.iter().copied());
                    if missing.is_empty() {
                        continue;
                    }
                    let key = DistributionKey::grouped(group.clone(), name.as_str());
                    match self.distributions.get(&key) {
                        Some(dist) => {
                            filled[idx] += fill_rows(values, &missing, dist, &mut rng, name)?;
                        }
                        None => {
                            warn!(
                                group = %group,
                                column = %name,
                                cells = missing.len(),
                                "Group not seen during fit, leaving cells missing"
                            );
                        }
                    }
                }
            }
        }

        let mut result = table.clone();
        for (idx, name) in names.iter().enumerate() {
            if let (Some(values), true) = (&columns[idx], filled[idx] > 0) {
                debug!(column = %name, cells = filled[idx], "Imputed missing categories");
                result.replace_categorical(name, values)?;
            }
        }

        Ok(result)
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.config.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn config(&self) -> &ImputerConfig {
        &self.config
    }

    /// Column names seen during fit, in table order
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Categories observed for `column` during fit, in sampling order
    pub fn vocabulary(&self, column: &str) -> Option<&[String]> {
        self.vocabularies.get(column).map(Vec::as_slice)
    }

    /// Group keys observed during fit; empty when not stratified
    pub fn groups(&self) -> &[GroupKey] {
        &self.groups
    }

    pub fn distribution(&self, key: &DistributionKey) -> Option<&SmoothedDistribution> {
        self.distributions.get(key)
    }

    pub fn distributions(&self) -> impl Iterator<Item = (&DistributionKey, &SmoothedDistribution)> {
        self.distributions.iter()
    }

    /// Save the fitted imputer to a JSON file
    pub fn save(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load an imputer from a JSON file
    pub fn load(path: &str) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let imputer: Self = serde_json::from_str(&json)?;
        Ok(imputer)
    }
}

impl Default for CategoryDistributionImputer {
    fn default() -> Self {
        Self::new()
    }
}

impl Imputer for CategoryDistributionImputer {
    fn fit(&mut self, data: DataRef<'_>) -> Result<()> {
        CategoryDistributionImputer::fit(self, data).map(|_| ())
    }

    fn transform(&self, data: DataRef<'_>) -> Result<Imputed> {
        CategoryDistributionImputer::transform(self, data)
    }
}

fn missing_rows<I: IntoIterator<Item = usize>>(values: &[Option<String>], rows: I) -> Vec<usize> {
    rows.into_iter()
        .filter(|&row| is_missing(values[row].as_deref()))
        .collect()
}

/// Draw one category per missing row, assigned in row order
fn fill_rows(
    values: &mut [Option<String>],
    missing: &[usize],
    dist: &SmoothedDistribution,
    rng: &mut ChaCha8Rng,
    column: &str,
) -> Result<usize> {
    let draws = dist
        .sample(rng, missing.len())
        .ok_or_else(|| ImputeError::NoCategories {
            column: column.to_string(),
        })?;

    for (&row, draw) in missing.iter().zip(draws) {
        values[row] = Some(draw.to_string());
    }
    Ok(missing.len())
}

/// JSON maps need string keys, so distributions are stored as a sorted entry list
mod distribution_entries {
    use super::{DistributionKey, SmoothedDistribution};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    pub fn serialize<S>(
        map: &HashMap<DistributionKey, SmoothedDistribution>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut entries: Vec<_> = map.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<HashMap<DistributionKey, SmoothedDistribution>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries: Vec<(DistributionKey, SmoothedDistribution)> = Vec::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}
