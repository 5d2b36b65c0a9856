//! Count-based trailing windows over an entity's chronologically ordered results.
//!
//! Every statistic here is a pure function from an ordered series of `(race, value)`
//! observations to a position-aligned series of optional values. A value is only ever computed
//! from observations belonging to strictly earlier races, so neither the current row nor a
//! team-mate's row from the same race contributes to it. Undefined (`None`) means there is no
//! prior observation at all.

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::data::RaceKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Sum,
    Mean,
}
impl Aggregate {
    fn apply(&self, values: impl ExactSizeIterator<Item = f64>) -> f64 {
        let len = values.len();
        let sum: f64 = values.sum();
        match self {
            Aggregate::Sum => sum,
            Aggregate::Mean => sum / len as f64,
        }
    }
}

/// For each observation, the index of the first observation of the same race. Observations of
/// earlier races are exactly those before this index.
pub fn race_starts(series: &[(RaceKey, f64)]) -> Vec<usize> {
    let mut starts = Vec::with_capacity(series.len());
    let mut start = 0;
    for (index, (race, _)) in series.iter().enumerate() {
        if index > 0 && series[index - 1].0 != *race {
            start = index;
        }
        starts.push(start);
    }
    starts
}

/// Aggregates up to `window` of the most recent observations preceding each observation's race.
pub fn trailing(series: &[(RaceKey, f64)], window: usize, aggregate: Aggregate) -> Vec<Option<f64>> {
    debug_assert!(window > 0, "window must be positive");
    debug_assert!(
        series.windows(2).all(|pair| pair[0].0 <= pair[1].0),
        "series must be in chronological order"
    );
    race_starts(series)
        .into_iter()
        .map(|end| {
            if end == 0 {
                None
            } else {
                let start = end.saturating_sub(window);
                Some(aggregate.apply(series[start..end].iter().map(|&(_, value)| value)))
            }
        })
        .collect()
}

/// Partitions row positions by key, keeping each partition in the original row order.
/// Partitions are listed in order of first appearance.
pub fn partition<'a, T, K, F>(rows: &'a [T], mut key: F) -> Vec<Vec<usize>>
where
    K: Hash + Eq,
    F: FnMut(&'a T) -> K,
{
    let mut lookup: FxHashMap<K, usize> = FxHashMap::default();
    let mut partitions: Vec<Vec<usize>> = vec![];
    for (position, row) in rows.iter().enumerate() {
        let next = partitions.len();
        let partition = *lookup.entry(key(row)).or_insert(next);
        if partition == next {
            partitions.push(vec![]);
        }
        partitions[partition].push(position);
    }
    partitions
}

/// Applies a per-entity statistic to every partition of chronologically ordered `rows` and
/// scatters the results back, aligned with `rows`.
pub fn per_entity<'a, T, K, F, V, S>(
    rows: &'a [T],
    key: F,
    mut observe: V,
    statistic: S,
) -> Vec<Option<f64>>
where
    K: Hash + Eq,
    F: FnMut(&'a T) -> K,
    V: FnMut(usize, &T) -> (RaceKey, f64),
    S: Fn(&[(RaceKey, f64)]) -> Vec<Option<f64>>,
{
    let mut aligned = vec![None; rows.len()];
    for positions in partition(rows, key) {
        let series: Vec<_> = positions
            .iter()
            .map(|&position| observe(position, &rows[position]))
            .collect();
        let values = statistic(&series);
        debug_assert_eq!(series.len(), values.len());
        for (&position, value) in positions.iter().zip(values) {
            aligned[position] = value;
        }
    }
    aligned
}
