//! Grid-only win probabilities, for races where no fitted scorer is available.

use anyhow::bail;
use serde::Serialize;

use crate::data::{DriverId, RaceKey, ResultRow};

/// Factor applied to the win probability to approximate the podium probability.
pub const PODIUM_FACTOR: f64 = 2.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridEntry {
    pub starting_position: u32,
    pub driver_id: DriverId,
    pub driver_code: String,
    pub team_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinProbability {
    pub driver_id: DriverId,
    pub driver_code: String,
    pub p_win: f64,
    pub p_podium: f64,
}

/// The known grid of `race`, in starting order. Entries without a grid slot are omitted.
pub fn grid_for_race(rows: &[ResultRow], race: RaceKey) -> Vec<GridEntry> {
    let mut grid: Vec<_> = rows
        .iter()
        .filter(|row| row.race() == race)
        .filter_map(|row| {
            row.starting_position.map(|starting_position| GridEntry {
                starting_position,
                driver_id: row.driver_id.clone(),
                driver_code: row.driver_code().to_string(),
                team_name: row.team_name().to_string(),
            })
        })
        .collect();
    grid.sort_by(|a, b| {
        a.starting_position
            .cmp(&b.starting_position)
            .then_with(|| a.driver_id.cmp(&b.driver_id))
    });
    grid
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Softmax over the reciprocal grid slot, so that the pole sitter is favourite.
pub fn predict_win_probs(grid: &[GridEntry]) -> Result<Vec<WinProbability>, anyhow::Error> {
    if grid.is_empty() {
        bail!("no grid available for prediction");
    }
    if let Some(entry) = grid.iter().find(|entry| entry.starting_position == 0) {
        bail!("invalid grid slot 0 for {}", entry.driver_code);
    }
    let exp_scores: Vec<_> = grid
        .iter()
        .map(|entry| (1.0 / entry.starting_position as f64).exp())
        .collect();
    let denominator: f64 = exp_scores.iter().sum();
    Ok(grid
        .iter()
        .zip(exp_scores)
        .map(|(entry, exp_score)| {
            let p_win = exp_score / denominator;
            WinProbability {
                driver_id: entry.driver_id.clone(),
                driver_code: entry.driver_code.clone(),
                p_win: round4(p_win),
                p_podium: round4(f64::min(1.0, p_win * PODIUM_FACTOR)),
            }
        })
        .collect())
}
