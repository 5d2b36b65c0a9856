//! Testing helpers.

use assert_float_eq::*;

use crate::data::ResultRow;
use crate::features::{Feature, FeatureRow};

pub fn assert_slice_f64_near(expected: &[f64], actual: &[f64], distance: u32) {
    assert_eq!(
        expected.len(),
        actual.len(),
        "lengths do not match: {} ≠ {}",
        expected.len(),
        actual.len()
    );
    for (index, &expected) in expected.iter().enumerate() {
        let actual = actual[index];
        if actual != expected {
            assert_f64_near!(expected, actual, distance);
        }
    }
}

/// The values of `feature` across `rows`, in row order.
pub fn feature_column<'a>(rows: impl IntoIterator<Item = &'a FeatureRow>, feature: Feature) -> Vec<f64> {
    rows.into_iter().map(|row| row[feature]).collect()
}

/// A classified finish with points and grid slot.
pub fn finish(season: u32, round: u32, driver: &str, constructor: &str, grid: u32, position: u32, points: f64) -> ResultRow {
    ResultRow::new(season, round, driver, constructor)
        .with_grid(grid)
        .with_position(position)
        .with_status("Finished")
        .with_points(points)
}

/// A retirement from the given grid slot.
pub fn retirement(season: u32, round: u32, driver: &str, constructor: &str, grid: u32) -> ResultRow {
    ResultRow::new(season, round, driver, constructor)
        .with_grid(grid)
        .with_status("DNF")
}
