//! Podium scorers over feature rows.

use std::path::Path;

use anyhow::bail;
use serde::{Deserialize, Serialize};
use strum::{EnumCount, IntoEnumIterator};
use tracing::debug;

use crate::features::{Feature, FeatureRow};
use crate::file::{self, ReadJsonFile};
use crate::linear::regression::{Predictor, RegressionModel, Regressor};
use crate::linear::Matrix;

/// Assigns each feature row a probability of a podium finish.
pub trait Scorer: Sized {
    /// Fits a scorer to labelled rows, using [`FeatureRow::is_podium`] as the label.
    fn fit(rows: &[&FeatureRow]) -> Result<Self, anyhow::Error>;

    fn score(&self, row: &FeatureRow) -> f64;
}

/// The numeric feature values of `rows`, one matrix row per feature row.
pub fn numeric_inputs(rows: &[&FeatureRow]) -> Matrix {
    Matrix::from_rows(Feature::COUNT, rows.iter().map(|row| row.values().as_slice()))
}

/// A linear probability model: ordinary least squares on the podium indicator, with predictions
/// clamped to the unit interval.
///
/// Only the numeric features are regressed on. The categorical `driver_id` and `constructor_id`
/// are not encoded, so two entries with equal feature values score the same whoever they are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearScorer {
    predictor: Predictor,
}
impl LinearScorer {
    /// Fits the underlying regression, retaining its diagnostics.
    pub fn regress(rows: &[&FeatureRow]) -> Result<RegressionModel, anyhow::Error> {
        if rows.is_empty() {
            bail!("no rows to fit");
        }
        let data = numeric_inputs(rows);
        let response: Vec<_> = rows
            .iter()
            .map(|row| if row.is_podium { 1.0 } else { 0.0 })
            .collect();

        let mut regressors = vec![Regressor::Intercept];
        for feature in Feature::iter() {
            let mut column = data.col(feature.into());
            let first = column.next().unwrap_or_default();
            if column.all(|value| value == first) {
                debug!("excluding constant column {feature}");
            } else {
                regressors.push(Regressor::Variable(feature));
            }
        }
        RegressionModel::fit(&response, regressors, &data)
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), anyhow::Error> {
        Ok(file::write_json(path, self)?)
    }

    pub fn read_json(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let scorer = Self::read_json_file(path)?;
        scorer.predictor.validate()?;
        Ok(scorer)
    }
}

impl From<RegressionModel> for LinearScorer {
    fn from(model: RegressionModel) -> Self {
        Self {
            predictor: model.predictor,
        }
    }
}

impl TryFrom<Predictor> for LinearScorer {
    type Error = anyhow::Error;

    fn try_from(predictor: Predictor) -> Result<Self, Self::Error> {
        predictor.validate()?;
        Ok(Self { predictor })
    }
}

impl Scorer for LinearScorer {
    fn fit(rows: &[&FeatureRow]) -> Result<Self, anyhow::Error> {
        Ok(Self::regress(rows)?.into())
    }

    fn score(&self, row: &FeatureRow) -> f64 {
        self.predictor.predict(row.values()).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;
    use crate::features::FeatureAccumulator;
    use crate::synthetic::{self, SyntheticOptions};
    use crate::testing::assert_slice_f64_near;

    fn table() -> crate::features::FeatureTable {
        let rows = synthetic::generate(&SyntheticOptions {
            seasons: 2024..=2024,
            rounds: 12,
            ..SyntheticOptions::default()
        });
        FeatureAccumulator::default().compute(rows).unwrap()
    }

    #[test]
    fn fit_excludes_constant_columns() {
        let table = table();
        let rows: Vec<_> = table.rows().iter().collect();
        let model = LinearScorer::regress(&rows).unwrap();
        let regressors = &model.predictor.regressors;
        assert_eq!(Regressor::Intercept, regressors[0]);
        assert!(!regressors.contains(&Regressor::Variable(Feature::Season)));
        assert!(regressors.contains(&Regressor::Variable(Feature::StartingPosition)));
    }

    #[test]
    fn scores_are_probabilities() {
        let table = table();
        let rows: Vec<_> = table.rows().iter().collect();
        let scorer = LinearScorer::fit(&rows).unwrap();
        for row in &rows {
            let score = scorer.score(row);
            assert!((0.0..=1.0).contains(&score), "{score}");
        }
    }

    #[test]
    fn fit_without_rows_fails() {
        assert_eq!("no rows to fit", LinearScorer::fit(&[]).unwrap_err().to_string());
    }

    #[test]
    fn clamps_out_of_range_predictions() {
        let scorer = LinearScorer::try_from(Predictor {
            regressors: vec![
                Regressor::Intercept,
                Regressor::Variable(Feature::StartingPosition),
            ],
            coefficients: vec![1.2, -0.1],
        })
        .unwrap();
        let table = table();
        let front = table
            .rows()
            .iter()
            .find(|row| row[Feature::StartingPosition] == 1.0)
            .unwrap();
        let back = table
            .rows()
            .iter()
            .find(|row| row[Feature::StartingPosition] >= 15.0)
            .unwrap();
        assert_eq!(1.0, scorer.score(front));
        assert_eq!(0.0, scorer.score(back));
    }

    #[test]
    fn identifiers_do_not_affect_score() {
        let table = table();
        let rows: Vec<_> = table.rows().iter().collect();
        let scorer = LinearScorer::fit(&rows).unwrap();
        let original = rows[rows.len() - 1];
        let mut renamed = original.clone();
        renamed.result.driver_id = "unseen_driver".into();
        renamed.result.constructor_id = "unseen_team".into();
        assert_eq!(scorer.score(original), scorer.score(&renamed));
    }

    #[test]
    fn json_file_round_trip() {
        let table = table();
        let rows: Vec<_> = table.rows().iter().collect();
        let scorer = LinearScorer::fit(&rows).unwrap();
        let path = env::temp_dir().join(format!("f1stats-scorer-{}.json", std::process::id()));
        scorer.write_json(&path).unwrap();
        let loaded = LinearScorer::read_json(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(scorer.predictor.regressors, loaded.predictor.regressors);
        assert_slice_f64_near(
            &scorer.predictor.coefficients,
            &loaded.predictor.coefficients,
            2,
        );
    }
}
