//! Synthetic championship histories for benchmarking and testing.

use std::ops::RangeInclusive;

use tinyrand::{Rand, Seeded, StdRand};

use crate::data::{Labels, ResultRow};

/// Points awarded for P1 through P10.
pub const POINTS: [f64; 10] = [25.0, 18.0, 15.0, 12.0, 10.0, 8.0, 6.0, 4.0, 2.0, 1.0];

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticOptions {
    pub seasons: RangeInclusive<u32>,
    pub rounds: u32,
    pub constructors: usize,
    pub drivers_per_constructor: usize,
    /// One in this many starters retires.
    pub retirement_odds: u64,
    /// One in this many entries has no recorded grid slot.
    pub missing_grid_odds: u64,
    /// One in this many drivers sits out a given race.
    pub absence_odds: u64,
    pub seed: u64,
}
impl Default for SyntheticOptions {
    fn default() -> Self {
        Self {
            seasons: 2022..=2024,
            rounds: 22,
            constructors: 10,
            drivers_per_constructor: 2,
            retirement_odds: 10,
            missing_grid_odds: 25,
            absence_odds: 40,
            seed: 42,
        }
    }
}

fn one_in(rand: &mut impl Rand, odds: u64) -> bool {
    odds != 0 && rand.next_u64() % odds == 0
}

/// Fisher-Yates shuffle.
pub fn shuffle<T>(rand: &mut impl Rand, items: &mut [T]) {
    for index in (1..items.len()).rev() {
        let other = (rand.next_u64() % (index as u64 + 1)) as usize;
        items.swap(index, other);
    }
}

/// Generates results for every race of every season, in chronological order.
pub fn generate(options: &SyntheticOptions) -> Vec<ResultRow> {
    let mut rand = StdRand::seed(options.seed);
    let entrants: Vec<_> = (0..options.constructors)
        .flat_map(|constructor| {
            (0..options.drivers_per_constructor)
                .map(move |driver| (format!("c{constructor}d{driver}"), format!("team{constructor}")))
        })
        .collect();

    let mut rows = vec![];
    for season in options.seasons.clone() {
        for round in 1..=options.rounds {
            let mut starters: Vec<_> = entrants
                .iter()
                .filter(|_| !one_in(&mut rand, options.absence_odds))
                .collect();
            shuffle(&mut rand, &mut starters);
            let mut grid: Vec<_> = (1..=starters.len() as u32).collect();
            shuffle(&mut rand, &mut grid);

            let mut classified = 0;
            for (index, (driver, constructor)) in starters.into_iter().enumerate() {
                let mut row = ResultRow::new(season, round, driver.as_str(), constructor.as_str())
                    .with_labels(Labels {
                        driver_code: Some(driver.to_uppercase()),
                        team_name: Some(constructor.clone()),
                        ..Labels::default()
                    });
                if !one_in(&mut rand, options.missing_grid_odds) {
                    row = row.with_grid(grid[index]);
                }
                row = if one_in(&mut rand, options.retirement_odds) {
                    row.with_status("DNF")
                } else {
                    classified += 1;
                    let points = POINTS.get(classified - 1).copied().unwrap_or(0.0);
                    row.with_position(classified as u32)
                        .with_status("Finished")
                        .with_points(points)
                };
                rows.push(row);
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_one_winner_per_race() {
        let options = SyntheticOptions {
            seasons: 2024..=2024,
            rounds: 5,
            ..SyntheticOptions::default()
        };
        let rows = generate(&options);
        for round in 1..=5 {
            let winners = rows
                .iter()
                .filter(|row| row.race_round == round && row.is_win())
                .count();
            assert_eq!(1, winners, "round {round}");
        }
    }

    #[test]
    fn deterministic_for_seed() {
        let options = SyntheticOptions::default();
        assert_eq!(generate(&options), generate(&options));
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rand = StdRand::seed(7);
        let mut items: Vec<_> = (0..50).collect();
        shuffle(&mut rand, &mut items);
        let mut sorted = items.clone();
        sorted.sort();
        assert_eq!((0..50).collect::<Vec<_>>(), sorted);
    }
}
