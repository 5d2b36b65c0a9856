//! Pipeline configuration, typically read from a JSON file.

use std::path::Path;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use tracing::debug;

use crate::file::ReadJsonFile;

/// How driver and constructor identifiers are interpreted across seasons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum KeyScope {
    /// Identifiers are stable across seasons; trailing windows may span a season boundary.
    #[default]
    Global,

    /// Identifiers are season-local; every window is confined to a single season.
    Season,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossValidationOptions {
    pub min_splits: usize,
    pub max_splits: usize,
}
impl CrossValidationOptions {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.min_splits < 2 {
            bail!("at least two cross-validation splits are required");
        }
        if self.max_splits < self.min_splits {
            bail!(
                "max_splits ({}) cannot be less than min_splits ({})",
                self.max_splits,
                self.min_splits
            );
        }
        Ok(())
    }

    /// The number of splits for the given number of distinct groups, or `None` if there are too
    /// few groups to split.
    pub fn splits_for(&self, groups: usize) -> Option<usize> {
        if groups < 2 {
            None
        } else {
            Some(groups.clamp(self.min_splits, self.max_splits))
                .filter(|&splits| splits <= groups)
        }
    }
}

impl Default for CrossValidationOptions {
    fn default() -> Self {
        Self {
            min_splits: 2,
            max_splits: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub key_scope: KeyScope,

    /// Grid slot assumed when no starting position is known anywhere in the data.
    pub default_grid: u32,

    /// Finish statuses counted as a retirement by the DNF rate.
    pub retirement_statuses: Vec<String>,

    pub cross_validation: CrossValidationOptions,

    /// Number of predictions to display for a race.
    pub top_n: usize,
}
impl Config {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.default_grid == 0 {
            bail!("default grid slot must be at least 1");
        }
        if self
            .retirement_statuses
            .iter()
            .any(|status| status.trim().is_empty())
        {
            bail!("retirement statuses cannot be blank");
        }
        if self.top_n == 0 {
            bail!("top_n must be at least 1");
        }
        self.cross_validation.validate()?;
        Ok(())
    }

    /// Reads and validates the config at `path`, or falls back to the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, anyhow::Error> {
        let config = match path {
            None => Self::default(),
            Some(path) => Self::read_json_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
        };
        config.validate()?;
        debug!("config: {config:?}");
        Ok(config)
    }

    pub fn is_retirement(&self, finish_status: Option<&str>) -> bool {
        match finish_status {
            None => false,
            Some(status) => self
                .retirement_statuses
                .iter()
                .any(|retirement| retirement == status),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_scope: KeyScope::default(),
            default_grid: 20,
            retirement_statuses: ["DNF", "DSQ", "DNS", "DNQ"]
                .into_iter()
                .map(ToString::to_string)
                .collect(),
            cross_validation: CrossValidationOptions::default(),
            top_n: 10,
        }
    }
}
