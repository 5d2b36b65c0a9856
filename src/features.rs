//! The feature table: per-row podium features derived from the full result history.
//!
//! Computation runs in two explicit passes. The first computes raw trailing and season-to-date
//! statistics, which are undefined wherever an entity has no history yet. The second fills every
//! undefined value with its column's global median. Feature values never depend on the position
//! of a row in the input, only on the results themselves.

use std::io;
use std::ops::Index;
use std::path::Path;
use std::time::Instant;

use ordinalizer::Ordinal;
use serde::{Deserialize, Serialize};
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{Display, EnumCount, EnumIter};
use tracing::debug;

use crate::config::{Config, KeyScope};
use crate::csv::{CsvWriter, Record};
use crate::data::{self, ConstructorId, DriverId, RaceKey, ResultRow};
use crate::error::FeatureError;
use crate::fill::{self, ColumnFill};
use crate::season;
use crate::window::{self, Aggregate};

/// Trailing window for points, podium rate and retirement rate.
pub const FORM_WINDOW: usize = 5;

/// Trailing window for grid averages.
pub const GRID_WINDOW: usize = 3;

/// The numeric inputs of a scorer, in the order a scorer receives them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Ordinal, EnumCount, EnumIter, Display, Serialize, Deserialize,
)]
pub enum Feature {
    #[strum(to_string = "starting_position")]
    #[serde(rename = "starting_position")]
    StartingPosition,

    #[strum(to_string = "driver_points_last_5")]
    #[serde(rename = "driver_points_last_5")]
    DriverPointsLast5,

    #[strum(to_string = "driver_podium_rate_last_5")]
    #[serde(rename = "driver_podium_rate_last_5")]
    DriverPodiumRateLast5,

    #[strum(to_string = "dnf_rate_last_5")]
    #[serde(rename = "dnf_rate_last_5")]
    DnfRateLast5,

    #[strum(to_string = "driver_grid_avg_last_3")]
    #[serde(rename = "driver_grid_avg_last_3")]
    DriverGridAvgLast3,

    #[strum(to_string = "constructor_points_last_5")]
    #[serde(rename = "constructor_points_last_5")]
    ConstructorPointsLast5,

    #[strum(to_string = "constructor_grid_avg_last_3")]
    #[serde(rename = "constructor_grid_avg_last_3")]
    ConstructorGridAvgLast3,

    #[strum(to_string = "constructor_points_season_to_date")]
    #[serde(rename = "constructor_points_season_to_date")]
    ConstructorPointsSeasonToDate,

    #[strum(to_string = "race_round")]
    #[serde(rename = "race_round")]
    RaceRound,

    #[strum(to_string = "season")]
    #[serde(rename = "season")]
    Season,
}
impl Feature {
    /// Features derived from history, and hence subject to gap filling.
    pub const DERIVED: [Feature; 7] = [
        Feature::DriverPointsLast5,
        Feature::DriverPodiumRateLast5,
        Feature::DnfRateLast5,
        Feature::DriverGridAvgLast3,
        Feature::ConstructorPointsLast5,
        Feature::ConstructorGridAvgLast3,
        Feature::ConstructorPointsSeasonToDate,
    ];

    pub fn is_derived(&self) -> bool {
        Self::DERIVED.contains(self)
    }
}

impl From<Feature> for usize {
    fn from(feature: Feature) -> Self {
        feature.ordinal()
    }
}

/// A result together with its features.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub result: ResultRow,
    pub is_podium: bool,
    values: [f64; Feature::COUNT],
}
impl FeatureRow {
    /// Feature values in scorer order.
    pub fn values(&self) -> &[f64; Feature::COUNT] {
        &self.values
    }

    pub fn race(&self) -> RaceKey {
        self.result.race()
    }
}

impl Index<Feature> for FeatureRow {
    type Output = f64;

    fn index(&self, feature: Feature) -> &Self::Output {
        &self.values[feature.ordinal()]
    }
}

/// First-pass statistics, prior to gap filling. Columns are in [`Feature::DERIVED`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawStatistics {
    columns: [Vec<Option<f64>>; Feature::DERIVED.len()],
}
impl RawStatistics {
    pub fn column(&self, feature: Feature) -> Option<&[Option<f64>]> {
        Feature::DERIVED
            .iter()
            .position(|derived| *derived == feature)
            .map(|index| self.columns[index].as_slice())
    }
}

/// Groups rows by entity, optionally qualifying the entity with its season.
#[derive(Debug, PartialEq, Eq, Hash)]
struct EntityKey<'a, I> {
    season: Option<u32>,
    id: &'a I,
}
impl<'a, I> EntityKey<'a, I> {
    fn new(scope: KeyScope, season: u32, id: &'a I) -> Self {
        let season = match scope {
            KeyScope::Global => None,
            KeyScope::Season => Some(season),
        };
        Self { season, id }
    }
}

fn indicator(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureAccumulator {
    config: Config,
}
impl FeatureAccumulator {
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Computes the feature table for the entire result history. Entries without a grid slot
    /// start from the configured default slot. Every input row yields exactly
    /// one feature row; the output is ordered by season, round and driver.
    pub fn compute(&self, mut rows: Vec<ResultRow>) -> Result<FeatureTable, FeatureError> {
        let start_time = Instant::now();
        data::order(&mut rows)?;

        let defaulted = fill::default_absent_grids(&mut rows, self.config.default_grid);
        let starting_positions: Vec<_> = rows.iter().map(|row| row.starting_position).collect();
        let (grid, grid_fill) =
            fill::fill_starting_positions(&starting_positions, self.config.default_grid);
        let grid_fill = if defaulted.filled > 0 { defaulted } else { grid_fill };
        let raw = self.statistics(&rows, &grid);

        let expected = rows.len();
        let mut fills = Vec::with_capacity(1 + Feature::DERIVED.len());
        fills.push(grid_fill);
        let mut columns = Vec::with_capacity(Feature::DERIVED.len());
        for (feature, column) in Feature::DERIVED.into_iter().zip(raw.columns) {
            if column.len() != expected {
                return Err(FeatureError::RowCountMismatch {
                    expected,
                    actual: column.len(),
                });
            }
            let (values, fill) = fill::fill_column(feature, column)?;
            fills.push(fill);
            columns.push(values);
        }

        let assembled: Vec<_> = rows
            .into_iter()
            .enumerate()
            .map(|(position, result)| {
                let mut values = [0.0; Feature::COUNT];
                values[Feature::StartingPosition.ordinal()] = grid[position];
                for (feature, column) in Feature::DERIVED.iter().zip(&columns) {
                    values[feature.ordinal()] = column[position];
                }
                values[Feature::RaceRound.ordinal()] = result.race_round as f64;
                values[Feature::Season.ordinal()] = result.season as f64;
                FeatureRow {
                    is_podium: result.is_podium(),
                    result,
                    values,
                }
            })
            .collect();
        if assembled.len() != expected {
            return Err(FeatureError::RowCountMismatch {
                expected,
                actual: assembled.len(),
            });
        }

        for fill in fills.iter().filter(|fill| fill.filled > 0) {
            debug!(
                "filled {} undefined {} values with {:?}",
                fill.filled, fill.feature, fill.value
            );
        }
        debug!(
            "computed features for {} rows in {:.3}s",
            expected,
            start_time.elapsed().as_millis() as f64 / 1_000.
        );
        Ok(FeatureTable {
            rows: assembled,
            fills,
        })
    }

    /// First pass: raw trailing and season-to-date statistics for chronologically ordered
    /// `rows`, with `grid` holding each row's resolved starting position.
    pub fn statistics(&self, rows: &[ResultRow], grid: &[f64]) -> RawStatistics {
        debug_assert_eq!(rows.len(), grid.len());
        let scope = self.config.key_scope;
        let points = |_: usize, row: &ResultRow| (row.race(), row.race_points);
        let podium = |_: usize, row: &ResultRow| (row.race(), indicator(row.is_podium()));
        let retired = |_: usize, row: &ResultRow| {
            (
                row.race(),
                indicator(self.config.is_retirement(row.finish_status.as_deref())),
            )
        };
        let starting = |position: usize, row: &ResultRow| (row.race(), grid[position]);

        let form_sum = |series: &[(RaceKey, f64)]| window::trailing(series, FORM_WINDOW, Aggregate::Sum);
        let form_mean = |series: &[(RaceKey, f64)]| window::trailing(series, FORM_WINDOW, Aggregate::Mean);
        let grid_mean = |series: &[(RaceKey, f64)]| window::trailing(series, GRID_WINDOW, Aggregate::Mean);

        RawStatistics {
            columns: [
                window::per_entity(rows, |row| driver_key(scope, row), points, form_sum),
                window::per_entity(rows, |row| driver_key(scope, row), podium, form_mean),
                window::per_entity(rows, |row| driver_key(scope, row), retired, form_mean),
                window::per_entity(rows, |row| driver_key(scope, row), starting, grid_mean),
                window::per_entity(rows, |row| constructor_key(scope, row), points, form_sum),
                window::per_entity(rows, |row| constructor_key(scope, row), starting, grid_mean),
                window::per_entity(
                    rows,
                    |row| constructor_key(scope, row),
                    points,
                    season::season_to_date,
                ),
            ],
        }
    }
}

fn driver_key(scope: KeyScope, row: &ResultRow) -> EntityKey<'_, DriverId> {
    EntityKey::new(scope, row.season, &row.driver_id)
}

fn constructor_key(scope: KeyScope, row: &ResultRow) -> EntityKey<'_, ConstructorId> {
    EntityKey::new(scope, row.season, &row.constructor_id)
}

impl TryFrom<Config> for FeatureAccumulator {
    type Error = anyhow::Error;

    fn try_from(config: Config) -> Result<Self, Self::Error> {
        config.validate()?;
        Ok(Self { config })
    }
}

/// Identifying and outcome columns written ahead of the features when exporting.
#[derive(Debug, Clone, Copy, Ordinal, EnumCount, EnumIter, Display)]
#[strum(serialize_all = "snake_case")]
enum Column {
    DriverId,
    ConstructorId,
    DriverCode,
    TeamName,
    FinalPosition,
    FinishStatus,
    RacePoints,
    IsPodium,
}

impl From<Column> for usize {
    fn from(column: Column) -> Self {
        column.ordinal()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
    fills: Vec<ColumnFill>,
}
impl FeatureTable {
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// The fill applied to each column, starting positions first.
    pub fn fills(&self) -> &[ColumnFill] {
        &self.fills
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of a single race, in driver order.
    pub fn race(&self, race: RaceKey) -> Vec<&FeatureRow> {
        let start = self.rows.partition_point(|row| row.race() < race);
        self.rows[start..]
            .iter()
            .take_while(|row| row.race() == race)
            .collect()
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), io::Error> {
        let mut csv = CsvWriter::create(path)?;
        csv.append(Record::with_values(
            Column::iter()
                .map(|column| column.to_string())
                .chain(Feature::iter().map(|feature| feature.to_string())),
        ))?;
        for row in &self.rows {
            let mut record = Record::with_capacity(Column::COUNT + Feature::COUNT);
            record.set(Column::DriverId, &row.result.driver_id);
            record.set(Column::ConstructorId, &row.result.constructor_id);
            record.set(Column::DriverCode, row.result.driver_code());
            record.set(Column::TeamName, row.result.team_name());
            if let Some(final_position) = row.result.final_position {
                record.set(Column::FinalPosition, final_position);
            }
            if let Some(finish_status) = &row.result.finish_status {
                record.set(Column::FinishStatus, finish_status);
            }
            record.set(Column::RacePoints, row.result.race_points);
            record.set(Column::IsPodium, u8::from(row.is_podium));
            for feature in Feature::iter() {
                record.set(Column::COUNT + feature.ordinal(), row[feature]);
            }
            csv.append(record)?;
        }
        csv.flush()
    }
}

#[cfg(test)]
mod tests;
