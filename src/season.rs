//! Season-to-date accumulation.

use crate::data::RaceKey;

/// For each observation, the total of all observations from earlier races of the same season.
/// Undefined for observations belonging to the entity's first race of a season.
pub fn season_to_date(series: &[(RaceKey, f64)]) -> Vec<Option<f64>> {
    debug_assert!(
        series.windows(2).all(|pair| pair[0].0 <= pair[1].0),
        "series must be in chronological order"
    );
    let mut totals = Vec::with_capacity(series.len());
    let mut season = None;
    let mut before_race = None;
    let mut running = 0.0;
    let mut current_race = None;
    for &(race, value) in series {
        if season != Some(race.season) {
            season = Some(race.season);
            running = 0.0;
            before_race = None;
        } else if current_race != Some(race) {
            before_race = Some(running);
        }
        current_race = Some(race);
        totals.push(before_race);
        running += value;
    }
    totals
}
