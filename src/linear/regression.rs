//! Ordinary least squares regression over feature columns.

use std::fmt::{Display, Formatter};
use std::ops::Range;

use anyhow::bail;
use linregress::fit_low_level_regression_model;
use serde::{Deserialize, Serialize};
use stanza::style::{HAlign, Header, MinWidth, Styles};
use stanza::table::{Col, Row, Table};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::features::Feature;
use crate::linear::Matrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regressor {
    Intercept,
    Variable(Feature),
}
impl Regressor {
    /// Resolves the regressor against a row of feature values in [`Feature`] order.
    pub fn resolve(&self, input: &[f64]) -> f64 {
        match self {
            Regressor::Intercept => 1.0,
            Regressor::Variable(feature) => input[usize::from(*feature)],
        }
    }
}

impl Display for Regressor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Regressor::Intercept => write!(f, "(intercept)"),
            Regressor::Variable(feature) => write!(f, "{feature}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predictor {
    pub regressors: Vec<Regressor>,
    pub coefficients: Vec<f64>,
}
impl Predictor {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        validate_regressors(&self.regressors)?;
        if self.regressors.len() != self.coefficients.len() {
            bail!("exactly one coefficient must be specified for each regressor");
        }
        if self.coefficients.iter().any(|coefficient| !coefficient.is_finite()) {
            bail!("coefficients must be finite");
        }
        Ok(())
    }

    pub fn predict(&self, input: &[f64]) -> f64 {
        self.regressors
            .iter()
            .zip(&self.coefficients)
            .map(|(regressor, coefficient)| coefficient * regressor.resolve(input))
            .sum()
    }
}

pub(crate) fn validate_regressors(regressors: &[Regressor]) -> Result<(), anyhow::Error> {
    let intercepts = regressors
        .iter()
        .filter(|regressor| matches!(regressor, Regressor::Intercept))
        .count();
    if intercepts != 1 {
        bail!("must specify exactly one {} regressor", Regressor::Intercept);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionModel {
    pub predictor: Predictor,
    pub std_errors: Vec<f64>,
    pub p_values: Vec<f64>,
    pub r_squared: f64,
    pub r_squared_adj: f64,
}
impl RegressionModel {
    /// Fits `response` against the given regressors, resolved over each row of `data`.
    pub fn fit(
        response: &[f64],
        regressors: Vec<Regressor>,
        data: &Matrix,
    ) -> Result<Self, anyhow::Error> {
        validate_regressors(&regressors)?;
        if response.len() != data.rows() {
            bail!(
                "{} responses supplied for {} rows of data",
                response.len(),
                data.rows()
            );
        }
        if data.rows() <= regressors.len() {
            bail!(
                "{} samples are insufficient to fit {} regressors",
                data.rows(),
                regressors.len()
            );
        }

        let mut subset = Matrix::allocate(data.rows(), 1 + regressors.len());
        for (row_index, input) in data.into_iter().enumerate() {
            let row = subset.row_slice_mut(row_index);
            row[0] = response[row_index];
            for (regressor_index, regressor) in regressors.iter().enumerate() {
                row[1 + regressor_index] = regressor.resolve(input);
            }
        }

        let model = fit_low_level_regression_model(subset.flatten(), subset.rows(), subset.cols())?;
        Ok(Self {
            predictor: Predictor {
                regressors,
                coefficients: model.parameters().to_vec(),
            },
            std_errors: model.se().to_vec(),
            p_values: model.p_values().to_vec(),
            r_squared: model.rsquared(),
            r_squared_adj: model.rsquared_adj(),
        })
    }

    pub fn tabulate(&self) -> Table {
        let mut table = Table::default()
            .with_cols(vec![
                Col::new(Styles::default().with(MinWidth(34))),
                Col::new(Styles::default().with(MinWidth(12)).with(HAlign::Right)),
                Col::new(Styles::default().with(MinWidth(11)).with(HAlign::Right)),
                Col::new(Styles::default().with(MinWidth(9)).with(HAlign::Right)),
                Col::new(Styles::default().with(MinWidth(5))),
            ])
            .with_row(Row::new(
                Styles::default().with(Header(true)),
                vec![
                    "Regressor".into(),
                    "Coefficient".into(),
                    "Std. error".into(),
                    "P-value".into(),
                    "".into(),
                ],
            ));
        for (index, regressor) in self.predictor.regressors.iter().enumerate() {
            let p_value = self.p_values[index];
            table.push_row(Row::new(
                Styles::default(),
                vec![
                    regressor.to_string().into(),
                    format!("{:.8}", self.predictor.coefficients[index]).into(),
                    format!("{:.6}", self.std_errors[index]).into(),
                    format!("{p_value:.6}").into(),
                    Significance::lookup(p_value).label().into(),
                ],
            ));
        }
        table
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Significance {
    A,
    B,
    C,
    D,
    E,
}
impl Significance {
    pub fn label(&self) -> &'static str {
        match self {
            Significance::A => "***",
            Significance::B => "**",
            Significance::C => "*",
            Significance::D => ".",
            Significance::E => "",
        }
    }

    pub fn range(&self) -> Range<f64> {
        match self {
            Significance::A => 0.0..0.001,
            Significance::B => 0.001..0.01,
            Significance::C => 0.01..0.05,
            Significance::D => 0.05..0.1,
            Significance::E => 0.1..1.0 + f64::EPSILON,
        }
    }

    /// Undefined p-values (as produced by a saturated fit) are not significant.
    pub fn lookup(p_value: f64) -> Self {
        Self::iter()
            .find(|significance| significance.range().contains(&p_value))
            .unwrap_or(Significance::E)
    }
}
