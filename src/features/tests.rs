use std::env;

use assert_float_eq::*;
use tinyrand::{Seeded, StdRand};

use super::*;
use crate::synthetic::{self, SyntheticOptions};
use crate::testing::*;

fn row<'a>(table: &'a FeatureTable, season: u32, round: u32, driver: &str) -> &'a FeatureRow {
    table
        .race(RaceKey::new(season, round))
        .into_iter()
        .find(|row| row.result.driver_id.0 == driver)
        .unwrap()
}

fn fill_of(table: &FeatureTable, feature: Feature) -> &ColumnFill {
    table
        .fills()
        .iter()
        .find(|fill| fill.feature == feature)
        .unwrap()
}

/// A lone driver racing three rounds.
fn lone_driver() -> Vec<ResultRow> {
    vec![
        finish(2024, 1, "D42", "C7", 3, 2, 10.0),
        finish(2024, 2, "D42", "C7", 5, 11, 0.0),
        finish(2024, 3, "D42", "C7", 2, 1, 18.0),
    ]
}

#[test]
fn trailing_points_and_grid() {
    let table = FeatureAccumulator::default().compute(lone_driver()).unwrap();
    assert_eq!(3, table.len());
    assert_slice_f64_near(
        &[10.0, 10.0, 10.0],
        &feature_column(table.rows(), Feature::DriverPointsLast5),
        1,
    );
    assert_slice_f64_near(
        &[3.5, 3.0, 4.0],
        &feature_column(table.rows(), Feature::DriverGridAvgLast3),
        1,
    );
    assert_slice_f64_near(
        &[3.0, 5.0, 2.0],
        &feature_column(table.rows(), Feature::StartingPosition),
        1,
    );
    assert_slice_f64_near(
        &[1.0, 2.0, 3.0],
        &feature_column(table.rows(), Feature::RaceRound),
        1,
    );
    assert_eq!(
        vec![true, false, true],
        table.rows().iter().map(|row| row.is_podium).collect::<Vec<_>>()
    );
}

#[test]
fn first_row_takes_global_median() {
    let accumulator = FeatureAccumulator::default();
    let rows = lone_driver();
    let grid: Vec<_> = rows
        .iter()
        .map(|row| row.starting_position.unwrap() as f64)
        .collect();
    let raw = accumulator.statistics(&rows, &grid);
    assert_eq!(
        &[None, Some(1.0), Some(0.5)],
        raw.column(Feature::DriverPodiumRateLast5).unwrap()
    );
    assert_eq!(None, raw.column(Feature::StartingPosition));

    let table = accumulator.compute(rows).unwrap();
    assert_f64_near!(0.75, table.rows()[0][Feature::DriverPodiumRateLast5]);
    let fill = fill_of(&table, Feature::DriverPodiumRateLast5);
    assert_eq!(1, fill.filled);
    assert_eq!(Some(0.75), fill.value);
}

#[test]
fn points_window_spans_five_prior_races() {
    let rows: Vec<_> = (1..=8)
        .map(|round| finish(2024, round, "D1", "C1", round, 5, round as f64))
        .collect();
    let table = FeatureAccumulator::default().compute(rows).unwrap();
    assert_f64_near!(
        3.0 + 4.0 + 5.0 + 6.0 + 7.0,
        row(&table, 2024, 8, "D1")[Feature::DriverPointsLast5]
    );
    assert_f64_near!(
        (5.0 + 6.0 + 7.0) / 3.0,
        row(&table, 2024, 8, "D1")[Feature::DriverGridAvgLast3]
    );
}

#[test]
fn window_counts_entries_not_rounds() {
    let rows = vec![
        finish(2024, 1, "D1", "C1", 1, 1, 25.0),
        finish(2024, 2, "D1", "C1", 1, 1, 25.0),
        finish(2024, 9, "D1", "C1", 1, 2, 18.0),
        finish(2024, 10, "D1", "C1", 1, 3, 15.0),
    ];
    let table = FeatureAccumulator::default().compute(rows).unwrap();
    assert_f64_near!(68.0, row(&table, 2024, 10, "D1")[Feature::DriverPointsLast5]);
}

#[test]
fn season_to_date_resets_each_season() {
    let rows = vec![
        finish(2023, 21, "D1", "C1", 1, 1, 25.0),
        finish(2023, 22, "D1", "C1", 1, 1, 25.0),
        finish(2024, 1, "D1", "C1", 2, 2, 18.0),
        finish(2024, 2, "D1", "C1", 3, 3, 15.0),
        finish(2024, 3, "D1", "C1", 3, 3, 15.0),
    ];
    let accumulator = FeatureAccumulator::default();
    let grid = vec![1.0; rows.len()];
    let raw = accumulator.statistics(&rows, &grid);
    assert_eq!(
        &[None, Some(25.0), None, Some(18.0), Some(33.0)],
        raw.column(Feature::ConstructorPointsSeasonToDate).unwrap()
    );
    let table = accumulator.compute(rows).unwrap();
    assert_f64_near!(25.0, row(&table, 2024, 1, "D1")[Feature::ConstructorPointsSeasonToDate]);
    assert_f64_near!(50.0, row(&table, 2024, 1, "D1")[Feature::ConstructorPointsLast5]);
}

#[test]
fn constructor_pools_drivers_excluding_same_race() {
    let rows = vec![
        finish(2024, 1, "A", "T", 1, 2, 10.0),
        finish(2024, 1, "B", "T", 4, 5, 5.0),
        finish(2024, 2, "A", "T", 2, 11, 0.0),
        finish(2024, 2, "B", "T", 6, 8, 3.0),
        finish(2024, 3, "A", "T", 3, 1, 25.0),
        retirement(2024, 3, "B", "T", 8),
        finish(2024, 4, "A", "T", 1, 1, 25.0),
    ];
    let table = FeatureAccumulator::default().compute(rows).unwrap();

    let race2: Vec<_> = table.race(RaceKey::new(2024, 2)).into_iter().cloned().collect();
    assert_slice_f64_near(
        &[15.0, 15.0],
        &feature_column(&race2, Feature::ConstructorPointsLast5),
        1,
    );
    assert_slice_f64_near(
        &[2.5, 2.5],
        &feature_column(&race2, Feature::ConstructorGridAvgLast3),
        1,
    );
    assert_f64_near!(18.0, row(&table, 2024, 3, "B")[Feature::ConstructorPointsLast5]);
    assert_f64_near!(
        5.0 + 0.0 + 3.0 + 25.0 + 0.0,
        row(&table, 2024, 4, "A")[Feature::ConstructorPointsLast5]
    );
    assert_f64_near!(
        (6.0 + 3.0 + 8.0) / 3.0,
        row(&table, 2024, 4, "A")[Feature::ConstructorGridAvgLast3]
    );
    assert_f64_near!(43.0, row(&table, 2024, 4, "A")[Feature::ConstructorPointsSeasonToDate]);
}

#[test]
fn dnf_rate_over_prior_entries() {
    let rows = vec![
        retirement(2024, 1, "D1", "C1", 10),
        finish(2024, 2, "D1", "C1", 9, 7, 6.0),
        ResultRow::new(2024, 3, "D1", "C1").with_grid(12).with_status("DSQ"),
        finish(2024, 4, "D1", "C1", 8, 6, 8.0),
        ResultRow::new(2024, 5, "D1", "C1").with_grid(7).with_status("Accident"),
    ];
    let table = FeatureAccumulator::default().compute(rows).unwrap();
    assert_slice_f64_near(
        &[(0.5 + 2.0 / 3.0) / 2.0, 1.0, 0.5, 2.0 / 3.0, 0.5],
        &feature_column(table.rows(), Feature::DnfRateLast5),
        1,
    );
}

#[test]
fn absent_grid_starts_from_back() {
    let rows = vec![
        finish(2024, 1, "A", "T", 3, 1, 25.0),
        finish(2024, 1, "B", "T", 5, 2, 18.0),
        ResultRow::new(2024, 1, "C", "U").with_position(3).with_points(15.0),
        finish(2024, 2, "A", "T", 1, 1, 25.0),
        finish(2024, 2, "B", "T", 2, 2, 18.0),
        finish(2024, 2, "C", "U", 9, 3, 15.0),
    ];
    let table = FeatureAccumulator::default().compute(rows).unwrap();
    let entry = row(&table, 2024, 1, "C");
    assert_f64_near!(20.0, entry[Feature::StartingPosition]);
    assert_eq!(Some(20), entry.result.starting_position);
    assert_f64_near!(20.0, row(&table, 2024, 2, "C")[Feature::DriverGridAvgLast3]);
    assert_f64_near!(20.0, row(&table, 2024, 2, "C")[Feature::ConstructorGridAvgLast3]);
    let fill = fill_of(&table, Feature::StartingPosition);
    assert_eq!(1, fill.filled);
    assert_eq!(Some(20.0), fill.value);
}

#[test]
fn absent_grid_honours_configured_default() {
    let rows = vec![
        finish(2024, 1, "A", "T", 1, 1, 25.0),
        ResultRow::new(2024, 1, "B", "T").with_status("DNQ"),
        finish(2024, 2, "A", "T", 1, 1, 25.0),
        finish(2024, 2, "B", "T", 2, 2, 18.0),
    ];
    let accumulator = FeatureAccumulator::try_from(Config {
        default_grid: 24,
        ..Config::default()
    })
    .unwrap();
    let table = accumulator.compute(rows).unwrap();
    assert_f64_near!(24.0, row(&table, 2024, 1, "B")[Feature::StartingPosition]);
}

#[test]
fn stubbed_entries_start_from_back() {
    let mut rows = lone_driver();
    rows.push(finish(2024, 3, "D7", "C1", 4, 3, 15.0));
    crate::stub::stub_race(&mut rows, RaceKey::new(2024, 4));
    let table = FeatureAccumulator::default().compute(rows).unwrap();
    let stubs = table.race(RaceKey::new(2024, 4));
    assert_eq!(2, stubs.len());
    for stub in stubs {
        assert_f64_near!(20.0, stub[Feature::StartingPosition]);
    }
}

#[test]
fn absent_grid_everywhere_uses_default() {
    let rows = vec![
        ResultRow::new(2024, 1, "A", "T").with_position(1),
        ResultRow::new(2024, 2, "A", "T").with_position(1),
    ];
    let table = FeatureAccumulator::default().compute(rows).unwrap();
    assert_slice_f64_near(
        &[20.0, 20.0],
        &feature_column(table.rows(), Feature::StartingPosition),
        1,
    );
}

#[test]
fn season_scoped_keys_isolate_seasons() {
    let rows = vec![
        finish(2023, 1, "D1", "C1", 1, 1, 25.0),
        finish(2024, 1, "D1", "C1", 1, 2, 18.0),
        finish(2024, 2, "D1", "C1", 1, 3, 15.0),
    ];
    let grid = vec![1.0; rows.len()];

    let global = FeatureAccumulator::default().statistics(&rows, &grid);
    assert_eq!(
        &[None, Some(25.0), Some(43.0)],
        global.column(Feature::DriverPointsLast5).unwrap()
    );

    let seasonal = FeatureAccumulator::try_from(Config {
        key_scope: KeyScope::Season,
        ..Config::default()
    })
    .unwrap();
    let raw = seasonal.statistics(&rows, &grid);
    assert_eq!(
        &[None, None, Some(18.0)],
        raw.column(Feature::DriverPointsLast5).unwrap()
    );
    assert_eq!(
        &[None, None, Some(18.0)],
        raw.column(Feature::ConstructorPointsLast5).unwrap()
    );
}

#[test]
fn single_race_leaves_columns_undefined() {
    let rows = vec![
        finish(2024, 1, "A", "T", 1, 1, 25.0),
        finish(2024, 1, "B", "U", 2, 2, 18.0),
    ];
    let err = FeatureAccumulator::default().compute(rows).unwrap_err();
    assert!(matches!(
        err,
        FeatureError::UndefinedColumn(Feature::DriverPointsLast5)
    ));
}

#[test]
fn empty_input_yields_empty_table() {
    let table = FeatureAccumulator::default().compute(vec![]).unwrap();
    assert!(table.is_empty());
    assert_eq!(1 + Feature::DERIVED.len(), table.fills().len());
}

#[test]
fn duplicate_entry_rejects_batch() {
    let mut rows = lone_driver();
    rows.push(finish(2024, 2, "D42", "C9", 1, 1, 25.0));
    let err = FeatureAccumulator::default().compute(rows).unwrap_err();
    assert!(matches!(err, FeatureError::DuplicateEntry { race, .. } if race == RaceKey::new(2024, 2)));
}

#[test]
fn invariant_to_input_order() {
    let rows = synthetic::generate(&SyntheticOptions {
        seasons: 2023..=2024,
        rounds: 8,
        ..SyntheticOptions::default()
    });
    let accumulator = FeatureAccumulator::default();
    let expected = accumulator.compute(rows.clone()).unwrap();
    assert_eq!(rows.len(), expected.len());

    let mut rand = StdRand::seed(11);
    for _ in 0..3 {
        let mut shuffled = rows.clone();
        synthetic::shuffle(&mut rand, &mut shuffled);
        let actual = accumulator.compute(shuffled).unwrap();
        assert_eq!(expected, actual);
    }
}

#[test]
fn no_undefined_values_after_fill() {
    let rows = synthetic::generate(&SyntheticOptions::default());
    let table = FeatureAccumulator::default().compute(rows).unwrap();
    for row in table.rows() {
        assert!(row.values().iter().all(|value| value.is_finite()), "{row:?}");
        assert_eq!(row.result.is_podium(), row.is_podium);
    }
}

#[test]
fn feature_names_in_scorer_order() {
    let names: Vec<_> = Feature::iter().map(|feature| feature.to_string()).collect();
    assert_eq!(
        vec![
            "starting_position",
            "driver_points_last_5",
            "driver_podium_rate_last_5",
            "dnf_rate_last_5",
            "driver_grid_avg_last_3",
            "constructor_points_last_5",
            "constructor_grid_avg_last_3",
            "constructor_points_season_to_date",
            "race_round",
            "season",
        ],
        names
    );
    assert!(!Feature::StartingPosition.is_derived());
    assert!(Feature::DnfRateLast5.is_derived());
}

#[test]
fn write_csv_with_header() {
    let table = FeatureAccumulator::default().compute(lone_driver()).unwrap();
    let path = env::temp_dir().join(format!("f1stats-features-{}.csv", std::process::id()));
    table.write_csv(&path).unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(4, lines.len());
    assert!(lines[0].starts_with("driver_id,constructor_id,driver_code,team_name,final_position"));
    assert!(lines[0].ends_with("race_round,season"));
    assert!(lines[1].starts_with("D42,C7,D42,C7,2,Finished,10,1,3,"));
}
