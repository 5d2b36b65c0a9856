//! Gap filling: the second pass that substitutes a deterministic value wherever a statistic is
//! undefined for lack of history.

use crate::data::ResultRow;
use crate::error::FeatureError;
use crate::features::Feature;

/// The median of the given values; the mean of the two middle values for an even count.
pub fn median(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut values: Vec<_> = values.into_iter().collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// How a single column was filled.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFill {
    pub feature: Feature,
    pub filled: usize,
    pub value: Option<f64>,
}

/// Replaces every undefined value in `column` with the median of its defined values. The median
/// is taken over the whole column, not per entity.
pub fn fill_column(
    feature: Feature,
    column: Vec<Option<f64>>,
) -> Result<(Vec<f64>, ColumnFill), FeatureError> {
    let undefined = column.iter().filter(|value| value.is_none()).count();
    if undefined == 0 {
        let values = column.into_iter().flatten().collect();
        return Ok((values, ColumnFill { feature, filled: 0, value: None }));
    }
    let fill = median(column.iter().flatten().copied()).ok_or(FeatureError::UndefinedColumn(feature))?;
    let values = column
        .into_iter()
        .map(|value| value.unwrap_or(fill))
        .collect();
    Ok((
        values,
        ColumnFill {
            feature,
            filled: undefined,
            value: Some(fill),
        },
    ))
}

/// Gives every entry without a recorded grid slot the slot `default_grid`, as for a driver who
/// did not qualify. Returns how the starting positions were filled.
pub fn default_absent_grids(rows: &mut [ResultRow], default_grid: u32) -> ColumnFill {
    let mut filled = 0;
    for position in rows
        .iter_mut()
        .map(|row| &mut row.starting_position)
        .filter(|position| position.is_none())
    {
        *position = Some(default_grid);
        filled += 1;
    }
    ColumnFill {
        feature: Feature::StartingPosition,
        filled,
        value: (filled > 0).then_some(default_grid as f64),
    }
}

/// Resolves every starting position: undefined positions take the median of the known ones,
/// truncated to a whole grid slot, or `default_grid` when none are known.
pub fn fill_starting_positions(positions: &[Option<u32>], default_grid: u32) -> (Vec<f64>, ColumnFill) {
    let undefined = positions.iter().filter(|position| position.is_none()).count();
    let fill = median(positions.iter().flatten().map(|&position| position as f64))
        .map(f64::trunc)
        .unwrap_or(default_grid as f64);
    let values = positions
        .iter()
        .map(|position| position.map(|position| position as f64).unwrap_or(fill))
        .collect();
    let value = if undefined == 0 { None } else { Some(fill) };
    (
        values,
        ColumnFill {
            feature: Feature::StartingPosition,
            filled: undefined,
            value,
        },
    )
}
