//! Scoring the entries of a single race.

use anyhow::bail;
use serde::Serialize;

use crate::data::{ConstructorId, DriverId, RaceKey};
use crate::features::{Feature, FeatureTable};
use crate::scorer::Scorer;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub race: RaceKey,
    pub driver_id: DriverId,
    pub driver_code: String,
    pub constructor_id: ConstructorId,
    pub team_name: String,
    pub starting_position: f64,
    pub p_podium: f64,
}

/// Scores every entry of `race`, most likely podium finisher first. Equal probabilities are
/// ordered by driver.
pub fn score_race<S: Scorer>(
    table: &FeatureTable,
    race: RaceKey,
    scorer: &S,
) -> Result<Vec<Prediction>, anyhow::Error> {
    let rows = table.race(race);
    if rows.is_empty() {
        bail!("no entries for {race}");
    }
    let mut predictions: Vec<_> = rows
        .into_iter()
        .map(|row| Prediction {
            race,
            driver_id: row.result.driver_id.clone(),
            driver_code: row.result.driver_code().to_string(),
            constructor_id: row.result.constructor_id.clone(),
            team_name: row.result.team_name().to_string(),
            starting_position: row[Feature::StartingPosition],
            p_podium: scorer.score(row),
        })
        .collect();
    predictions.sort_by(|a, b| {
        b.p_podium
            .total_cmp(&a.p_podium)
            .then_with(|| a.driver_id.cmp(&b.driver_id))
    });
    Ok(predictions)
}
