//! Placeholder entries for a race that has not been run yet.

use tracing::debug;

use crate::data::{Labels, RaceKey, ResultRow};

/// Ensures `race` has entries to score. If it has none, appends one entry per driver of the most
/// recent earlier race, each with that driver's constructor from that race and no grid slot,
/// finish or points. Returns the number of entries added; a race that already has entries is left
/// alone.
pub fn stub_race(rows: &mut Vec<ResultRow>, race: RaceKey) -> usize {
    if rows.iter().any(|row| row.race() == race) {
        return 0;
    }
    let latest = match rows
        .iter()
        .map(ResultRow::race)
        .filter(|&earlier| earlier < race)
        .max()
    {
        None => return 0,
        Some(latest) => latest,
    };

    let stubs: Vec<_> = rows
        .iter()
        .filter(|row| row.race() == latest)
        .map(|row| {
            ResultRow::new(
                race.season,
                race.round,
                row.driver_id.clone(),
                row.constructor_id.clone(),
            )
            .with_labels(Labels {
                grand_prix: Some(format!("Round {}", race.round)),
                driver_code: row.labels.driver_code.clone(),
                driver_name: row.labels.driver_name.clone(),
                team_name: row.labels.team_name.clone(),
                ..Labels::default()
            })
        })
        .collect();
    debug!("stubbed {} entries for {race} from {latest}", stubs.len());
    let added = stubs.len();
    rows.extend(stubs);
    added
}
