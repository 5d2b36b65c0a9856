//! Failures of the feature pipeline. Each of these is fatal to the batch being processed.

use thiserror::Error;

use crate::data::{DriverId, RaceKey};
use crate::features::Feature;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidRecord {
    #[error("missing mandatory field {0}")]
    MissingField(&'static str),

    #[error("blank identifier in field {0}")]
    BlankIdentifier(&'static str),

    #[error("race points must be finite and non-negative, got {0}")]
    InvalidPoints(f64),
}

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("record {index} rejected: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: InvalidRecord,
    },

    #[error("driver {driver} appears more than once in {race}")]
    DuplicateEntry { race: RaceKey, driver: DriverId },

    #[error("column {0} has no defined values to derive a fill from")]
    UndefinedColumn(Feature),

    #[error("assembled {actual} feature rows from {expected} result rows")]
    RowCountMismatch { expected: usize, actual: usize },
}
