//! Training datasets and race-grouped cross-validation.

use std::hash::Hash;

use anyhow::bail;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::config::CrossValidationOptions;
use crate::data::RaceKey;
use crate::features::{FeatureRow, FeatureTable};
use crate::metrics;
use crate::scorer::Scorer;

/// Labelled feature rows, each grouped by its race.
#[derive(Debug, Clone)]
pub struct Dataset<'a> {
    rows: Vec<&'a FeatureRow>,
    groups: Vec<RaceKey>,
}
impl<'a> Dataset<'a> {
    /// Only rows with a recorded final position are labelled; retirements and stubs for an
    /// upcoming race are left out.
    pub fn from_features(table: &'a FeatureTable) -> Result<Self, anyhow::Error> {
        let rows: Vec<_> = table
            .rows()
            .iter()
            .filter(|row| row.result.final_position.is_some())
            .collect();
        if rows.is_empty() {
            bail!("no labelled rows to train on");
        }
        let groups = rows.iter().map(|row| row.race()).collect();
        Ok(Self { rows, groups })
    }

    pub fn rows(&self) -> &[&'a FeatureRow] {
        &self.rows
    }

    pub fn groups(&self) -> &[RaceKey] {
        &self.groups
    }

    pub fn labels(&self) -> Vec<bool> {
        self.rows.iter().map(|row| row.is_podium).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn distinct_groups(&self) -> usize {
        let mut groups = self.groups.clone();
        groups.sort_unstable();
        groups.dedup();
        groups.len()
    }

    fn select(&self, indices: &[usize]) -> Vec<&'a FeatureRow> {
        indices.iter().map(|&index| self.rows[index]).collect()
    }
}

/// Sample indices of a single train/validation split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// Splits samples into `splits` folds such that no group straddles two folds. Groups are taken in
/// descending order of size (ties broken by key), each going to the fold with the fewest samples
/// so far.
pub fn group_k_fold<K: Hash + Ord + Copy>(groups: &[K], splits: usize) -> Result<Vec<Fold>, anyhow::Error> {
    if splits < 2 {
        bail!("at least two splits are required");
    }
    let mut sizes: FxHashMap<K, usize> = FxHashMap::default();
    for group in groups {
        *sizes.entry(*group).or_default() += 1;
    }
    if sizes.len() < splits {
        bail!("cannot split {} groups into {splits} folds", sizes.len());
    }

    let mut by_size: Vec<_> = sizes.into_iter().collect();
    by_size.sort_by(|(a_key, a_size), (b_key, b_size)| b_size.cmp(a_size).then(a_key.cmp(b_key)));
    let mut fold_sizes = vec![0; splits];
    let mut assignment: FxHashMap<K, usize> = FxHashMap::default();
    for (group, size) in by_size {
        let lightest = (0..splits)
            .min_by_key(|&fold| fold_sizes[fold])
            .unwrap_or_default();
        fold_sizes[lightest] += size;
        assignment.insert(group, lightest);
    }

    Ok((0..splits)
        .map(|fold| {
            let (validation, train): (Vec<_>, Vec<_>) =
                (0..groups.len()).partition(|&index| assignment[&groups[index]] == fold);
            Fold { train, validation }
        })
        .collect())
}

/// Mean and population standard deviation of a metric across folds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub std: f64,
    pub count: usize,
}
impl Summary {
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / count as f64;
        Some(Self {
            mean,
            std: variance.sqrt(),
            count,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FoldScore {
    /// `false` when the scorer could not be fitted to the fold, which then has no metrics.
    pub fitted: bool,
    pub train_samples: usize,
    pub validation_samples: usize,
    pub roc_auc: Option<f64>,
    pub average_precision: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossValidation {
    pub folds: Vec<FoldScore>,
    pub roc_auc: Option<Summary>,
    pub average_precision: Option<Summary>,
}

/// Cross-validates scorer `S` with folds grouped by race. `None` if the dataset spans fewer than
/// two races. A fold the scorer cannot be fitted to is reported unscored rather than failing the
/// whole run.
pub fn cross_validate<S: Scorer>(
    dataset: &Dataset,
    options: &CrossValidationOptions,
) -> Result<Option<CrossValidation>, anyhow::Error> {
    let splits = match options.splits_for(dataset.distinct_groups()) {
        None => return Ok(None),
        Some(splits) => splits,
    };
    let labels = dataset.labels();
    let mut folds = Vec::with_capacity(splits);
    for (index, fold) in group_k_fold(dataset.groups(), splits)?.into_iter().enumerate() {
        let score = match S::fit(&dataset.select(&fold.train)) {
            Ok(scorer) => {
                let scores: Vec<_> = fold
                    .validation
                    .iter()
                    .map(|&sample| scorer.score(dataset.rows[sample]))
                    .collect();
                let validation_labels: Vec<_> =
                    fold.validation.iter().map(|&sample| labels[sample]).collect();
                FoldScore {
                    fitted: true,
                    train_samples: fold.train.len(),
                    validation_samples: fold.validation.len(),
                    roc_auc: metrics::roc_auc(&validation_labels, &scores),
                    average_precision: metrics::average_precision(&validation_labels, &scores),
                }
            }
            Err(err) => {
                warn!("skipping fold {index}: {err}");
                FoldScore {
                    fitted: false,
                    train_samples: fold.train.len(),
                    validation_samples: fold.validation.len(),
                    roc_auc: None,
                    average_precision: None,
                }
            }
        };
        debug!("fold {index}: {score:?}");
        folds.push(score);
    }

    let roc_auc: Vec<_> = folds.iter().filter_map(|fold| fold.roc_auc).collect();
    let average_precision: Vec<_> = folds.iter().filter_map(|fold| fold.average_precision).collect();
    Ok(Some(CrossValidation {
        roc_auc: Summary::of(&roc_auc),
        average_precision: Summary::of(&average_precision),
        folds,
    }))
}
