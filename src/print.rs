//! Console tables for the binaries.

use stanza::style::{HAlign, Header, MinWidth, Separator, Styles};
use stanza::table::{Col, Row, Table};

use crate::fill::ColumnFill;
use crate::placeholder::WinProbability;
use crate::score::Prediction;
use crate::standings::{ConstructorStanding, DriverStanding, RaceWin};
use crate::train::{CrossValidation, Summary};

fn left(min_width: usize) -> Col {
    Col::new(Styles::default().with(MinWidth(min_width)))
}

fn right(min_width: usize) -> Col {
    Col::new(Styles::default().with(MinWidth(min_width)).with(HAlign::Right))
}

fn header(cells: &[&str]) -> Row {
    Row::new(
        Styles::default().with(Header(true)).with(Separator(true)),
        cells.iter().map(|&cell| cell.into()).collect(),
    )
}

pub fn tabulate_predictions(predictions: &[Prediction]) -> Table {
    let mut table = Table::default()
        .with_cols(vec![right(4), left(8), left(16), right(6), right(10)])
        .with_row(header(&["Rank", "Driver", "Team", "Grid", "P(podium)"]));
    for (rank, prediction) in predictions.iter().enumerate() {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                format!("{}", rank + 1).into(),
                prediction.driver_code.clone().into(),
                prediction.team_name.clone().into(),
                format!("{}", prediction.starting_position).into(),
                format!("{:.4}", prediction.p_podium).into(),
            ],
        ));
    }
    table
}

pub fn tabulate_win_probs(probs: &[WinProbability]) -> Table {
    let mut table = Table::default()
        .with_cols(vec![left(8), right(8), right(10)])
        .with_row(header(&["Driver", "P(win)", "P(podium)"]));
    for prob in probs {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                prob.driver_code.clone().into(),
                format!("{:.4}", prob.p_win).into(),
                format!("{:.4}", prob.p_podium).into(),
            ],
        ));
    }
    table
}

pub fn tabulate_drivers(standings: &[DriverStanding]) -> Table {
    let mut table = Table::default()
        .with_cols(vec![right(3), left(6), left(20), left(16), right(8), right(5), right(8)])
        .with_row(header(&["Pos", "Code", "Name", "Team", "Points", "Wins", "Podiums"]));
    for (index, standing) in standings.iter().enumerate() {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                format!("{}", index + 1).into(),
                standing.code.clone().into(),
                standing.name.clone().into(),
                standing.team.clone().unwrap_or_default().into(),
                format!("{}", standing.points).into(),
                format!("{}", standing.wins).into(),
                format!("{}", standing.podiums).into(),
            ],
        ));
    }
    table
}

pub fn tabulate_constructors(standings: &[ConstructorStanding]) -> Table {
    let mut table = Table::default()
        .with_cols(vec![right(3), left(20), right(8), right(5), right(8)])
        .with_row(header(&["Pos", "Team", "Points", "Wins", "Podiums"]));
    for (index, standing) in standings.iter().enumerate() {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                format!("{}", index + 1).into(),
                standing.team.clone().into(),
                format!("{}", standing.points).into(),
                format!("{}", standing.wins).into(),
                format!("{}", standing.podiums).into(),
            ],
        ));
    }
    table
}

pub fn tabulate_wins(wins: &[RaceWin]) -> Table {
    let mut table = Table::default()
        .with_cols(vec![right(5), left(24), left(12), left(16)])
        .with_row(header(&["Round", "Grand Prix", "Date", "Circuit"]));
    for win in wins {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                format!("{}", win.round).into(),
                win.grand_prix.clone().into(),
                win.date.map(|date| date.to_string()).unwrap_or_default().into(),
                win.circuit.clone().unwrap_or_default().into(),
            ],
        ));
    }
    table
}

fn summary_cells(summary: Option<Summary>) -> [String; 2] {
    match summary {
        None => ["-".into(), "-".into()],
        Some(summary) => [format!("{:.4}", summary.mean), format!("{:.4}", summary.std)],
    }
}

pub fn tabulate_cross_validation(cv: &CrossValidation) -> Table {
    let format = |value: Option<f64>| value.map(|value| format!("{value:.4}")).unwrap_or_else(|| "-".into());
    let mut table = Table::default()
        .with_cols(vec![left(6), right(8), right(10), right(8), right(8)])
        .with_row(header(&["Fold", "Train", "Validation", "ROC-AUC", "AP"]));
    for (index, fold) in cv.folds.iter().enumerate() {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                if fold.fitted {
                    format!("{}", index + 1)
                } else {
                    format!("{} (unfitted)", index + 1)
                }
                .into(),
                format!("{}", fold.train_samples).into(),
                format!("{}", fold.validation_samples).into(),
                format(fold.roc_auc).into(),
                format(fold.average_precision).into(),
            ],
        ));
    }
    let [auc_mean, auc_std] = summary_cells(cv.roc_auc);
    let [ap_mean, ap_std] = summary_cells(cv.average_precision);
    table.push_row(Row::new(
        Styles::default().with(Separator(true)),
        vec!["mean".into(), "".into(), "".into(), auc_mean.into(), ap_mean.into()],
    ));
    table.push_row(Row::new(
        Styles::default(),
        vec!["std".into(), "".into(), "".into(), auc_std.into(), ap_std.into()],
    ));
    table
}

pub fn tabulate_fills(fills: &[ColumnFill]) -> Table {
    let mut table = Table::default()
        .with_cols(vec![left(34), right(8), right(10)])
        .with_row(header(&["Column", "Filled", "Value"]));
    for fill in fills {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                fill.feature.to_string().into(),
                format!("{}", fill.filled).into(),
                fill.value
                    .map(|value| format!("{value:.4}"))
                    .unwrap_or_else(|| "-".into())
                    .into(),
            ],
        ));
    }
    table
}
