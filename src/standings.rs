//! Season standings and per-driver statistics.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::Serialize;
use thiserror::Error;

use crate::data::{DriverId, RaceKey, ResultRow};

/// The first season of the world championship.
pub const FIRST_SEASON: u32 = 1950;

pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StandingsError {
    #[error("driver code '{0}' not found")]
    DriverNotFound(String),

    #[error("limit must be between 1 and {MAX_LIMIT}, got {0}")]
    InvalidLimit(usize),

    #[error("season must be {FIRST_SEASON} or later, got {0}")]
    InvalidSeason(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverSummary {
    pub driver: String,
    pub season: u32,
    pub wins: usize,
    pub podiums: usize,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceWin {
    pub race_id: Option<u64>,
    pub round: u32,
    pub date: Option<NaiveDate>,
    pub grand_prix: String,
    pub country: Option<String>,
    pub location: Option<String>,
    pub circuit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverStanding {
    pub code: String,
    pub name: String,
    pub team: Option<String>,
    pub points: f64,
    pub wins: usize,
    pub podiums: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstructorStanding {
    pub team: String,
    pub points: f64,
    pub wins: usize,
    pub podiums: usize,
}

#[derive(Debug, Default)]
struct Tally {
    points: f64,
    wins: usize,
    podiums: usize,
}
impl Tally {
    fn add(&mut self, row: &ResultRow) {
        self.points += row.race_points;
        if row.is_win() {
            self.wins += 1;
        }
        if row.is_podium() {
            self.podiums += 1;
        }
    }
}

fn validate_season(season: u32) -> Result<(), StandingsError> {
    if season < FIRST_SEASON {
        return Err(StandingsError::InvalidSeason(season));
    }
    Ok(())
}

fn validate_limit(limit: usize) -> Result<(), StandingsError> {
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(StandingsError::InvalidLimit(limit));
    }
    Ok(())
}

/// Queries over a set of results spanning any number of seasons.
pub struct Standings<'a> {
    rows: &'a [ResultRow],
}
impl<'a> Standings<'a> {
    pub fn new(rows: &'a [ResultRow]) -> Self {
        Self { rows }
    }

    fn season(&self, season: u32) -> impl Iterator<Item = &'a ResultRow> {
        self.rows.iter().filter(move |row| row.season == season)
    }

    /// Resolves a driver code, ignoring case, to its canonical upper-case form.
    pub fn driver(&self, code: &str) -> Result<String, StandingsError> {
        let code = code.trim().to_uppercase();
        if self
            .rows
            .iter()
            .any(|row| row.driver_code().eq_ignore_ascii_case(&code))
        {
            Ok(code)
        } else {
            Err(StandingsError::DriverNotFound(code))
        }
    }

    fn driver_rows(
        &self,
        code: &str,
        season: u32,
    ) -> Result<(String, impl Iterator<Item = &'a ResultRow>), StandingsError> {
        validate_season(season)?;
        let code = self.driver(code)?;
        let filter = code.clone();
        let rows = self
            .season(season)
            .filter(move |row| row.driver_code().eq_ignore_ascii_case(&filter));
        Ok((code, rows))
    }

    pub fn summary(&self, code: &str, season: u32) -> Result<DriverSummary, StandingsError> {
        let (driver, rows) = self.driver_rows(code, season)?;
        let mut tally = Tally::default();
        rows.for_each(|row| tally.add(row));
        Ok(DriverSummary {
            driver,
            season,
            wins: tally.wins,
            podiums: tally.podiums,
            points: tally.points,
        })
    }

    pub fn wins(&self, code: &str, season: u32) -> Result<usize, StandingsError> {
        Ok(self.summary(code, season)?.wins)
    }

    pub fn podiums(&self, code: &str, season: u32) -> Result<usize, StandingsError> {
        Ok(self.summary(code, season)?.podiums)
    }

    pub fn points(&self, code: &str, season: u32) -> Result<f64, StandingsError> {
        Ok(self.summary(code, season)?.points)
    }

    /// The races won by a driver in a season, in round order.
    pub fn wins_races(&self, code: &str, season: u32) -> Result<Vec<RaceWin>, StandingsError> {
        let (_, rows) = self.driver_rows(code, season)?;
        let mut wins: Vec<_> = rows
            .filter(|row| row.is_win())
            .map(|row| RaceWin {
                race_id: row.labels.race_id,
                round: row.race_round,
                date: row.labels.date,
                grand_prix: row.grand_prix(),
                country: row.labels.country.clone(),
                location: row.labels.location.clone(),
                circuit: row.labels.circuit.clone(),
            })
            .collect();
        wins.sort_by(|a, b| a.round.cmp(&b.round).then(a.date.cmp(&b.date)));
        Ok(wins)
    }

    /// Driver standings, ordered by points, then wins, then code. A driver's team is the one they
    /// drove for most recently in the season.
    pub fn drivers_leaderboard(&self, season: u32, limit: usize) -> Result<Vec<DriverStanding>, StandingsError> {
        validate_season(season)?;
        validate_limit(limit)?;
        let mut drivers: FxHashMap<&DriverId, (Tally, RaceKey, &ResultRow)> = FxHashMap::default();
        for row in self.season(season) {
            let (tally, latest, latest_row) = drivers
                .entry(&row.driver_id)
                .or_insert_with(|| (Tally::default(), row.race(), row));
            tally.add(row);
            if row.race() >= *latest {
                *latest = row.race();
                *latest_row = row;
            }
        }

        let mut standings: Vec<_> = drivers
            .into_values()
            .map(|(tally, _, latest)| DriverStanding {
                code: latest.driver_code().to_string(),
                name: latest
                    .labels
                    .driver_name
                    .clone()
                    .unwrap_or_else(|| latest.driver_code().to_string()),
                team: Some(latest.team_name().to_string()).filter(|team| !team.is_empty()),
                points: tally.points,
                wins: tally.wins,
                podiums: tally.podiums,
            })
            .collect();
        standings.sort_by(|a, b| {
            b.points
                .total_cmp(&a.points)
                .then(b.wins.cmp(&a.wins))
                .then_with(|| a.code.cmp(&b.code))
        });
        standings.truncate(limit);
        Ok(standings)
    }

    /// Constructor standings, ordered by points, then wins, then podiums, then team name.
    pub fn constructors_leaderboard(
        &self,
        season: u32,
        limit: usize,
    ) -> Result<Vec<ConstructorStanding>, StandingsError> {
        validate_season(season)?;
        validate_limit(limit)?;
        let mut teams: FxHashMap<&str, Tally> = FxHashMap::default();
        for row in self.season(season) {
            teams.entry(row.team_name()).or_default().add(row);
        }

        let mut standings: Vec<_> = teams
            .into_iter()
            .map(|(team, tally)| ConstructorStanding {
                team: team.to_string(),
                points: tally.points,
                wins: tally.wins,
                podiums: tally.podiums,
            })
            .collect();
        standings.sort_by(|a, b| {
            b.points
                .total_cmp(&a.points)
                .then(b.wins.cmp(&a.wins))
                .then(b.podiums.cmp(&a.podiums))
                .then_with(|| a.team.cmp(&b.team))
        });
        standings.truncate(limit);
        Ok(standings)
    }
}

#[cfg(test)]
mod tests;
