use assert_float_eq::*;

use super::*;
use crate::data::Labels;
use crate::testing::{finish, retirement};

fn labelled(row: ResultRow, code: &str, team: &str, grand_prix: &str) -> ResultRow {
    let labels = Labels {
        grand_prix: Some(grand_prix.to_string()),
        driver_code: Some(code.to_string()),
        driver_name: Some(format!("Driver {code}")),
        team_name: Some(team.to_string()),
        ..Labels::default()
    };
    row.with_labels(labels)
}

fn season() -> Vec<ResultRow> {
    vec![
        labelled(finish(2024, 1, "1", "9", 1, 1, 26.0), "VER", "Red Bull", "Bahrain"),
        labelled(finish(2024, 1, "16", "6", 4, 2, 18.0), "LEC", "Ferrari", "Bahrain"),
        labelled(finish(2024, 1, "4", "1", 2, 3, 15.0), "NOR", "McLaren", "Bahrain"),
        labelled(retirement(2024, 1, "55", "6", 3), "SAI", "Ferrari", "Bahrain"),
        labelled(finish(2024, 3, "55", "6", 2, 1, 25.0), "SAI", "Ferrari", "Australia"),
        labelled(finish(2024, 3, "16", "6", 1, 2, 19.0), "LEC", "Ferrari", "Australia"),
        labelled(finish(2024, 3, "4", "1", 3, 3, 15.0), "NOR", "McLaren", "Australia"),
        labelled(finish(2024, 2, "1", "9", 1, 1, 25.0), "VER", "Red Bull", "Saudi Arabia"),
        labelled(finish(2024, 2, "4", "1", 5, 4, 12.0), "NOR", "McLaren", "Saudi Arabia"),
        labelled(finish(2023, 1, "1", "9", 1, 1, 25.0), "VER", "Red Bull", "Bahrain"),
    ]
}

#[test]
fn driver_lookup_ignores_case() {
    let rows = season();
    let standings = Standings::new(&rows);
    assert_eq!("VER", standings.driver("ver").unwrap());
    assert_eq!(
        StandingsError::DriverNotFound("HAM".into()),
        standings.driver("ham").unwrap_err()
    );
}

#[test]
fn driver_summary() {
    let rows = season();
    let standings = Standings::new(&rows);
    let summary = standings.summary("ver", 2024).unwrap();
    assert_eq!(
        DriverSummary {
            driver: "VER".into(),
            season: 2024,
            wins: 2,
            podiums: 2,
            points: 51.0,
        },
        summary
    );
    assert_eq!(0, standings.wins("NOR", 2024).unwrap());
    assert_eq!(2, standings.podiums("NOR", 2024).unwrap());
    assert_f64_near!(42.0, standings.points("NOR", 2024).unwrap());
    assert_eq!(0, standings.wins("SAI", 2023).unwrap());
}

#[test]
fn unknown_driver_and_bad_season() {
    let rows = season();
    let standings = Standings::new(&rows);
    assert!(matches!(
        standings.wins("XYZ", 2024),
        Err(StandingsError::DriverNotFound(code)) if code == "XYZ"
    ));
    assert_eq!(
        Err(StandingsError::InvalidSeason(1949)),
        standings.podiums("VER", 1949)
    );
}

#[test]
fn wins_races_in_round_order() {
    let rows = season();
    let standings = Standings::new(&rows);
    let wins = standings.wins_races("VER", 2024).unwrap();
    let names: Vec<_> = wins.iter().map(|win| (win.round, win.grand_prix.as_str())).collect();
    assert_eq!(vec![(1, "Bahrain"), (2, "Saudi Arabia")], names);
    assert!(standings.wins_races("NOR", 2024).unwrap().is_empty());
}

#[test]
fn drivers_leaderboard_ordering() {
    let rows = season();
    let standings = Standings::new(&rows);
    let leaderboard = standings.drivers_leaderboard(2024, 20).unwrap();
    let codes: Vec<_> = leaderboard.iter().map(|row| row.code.as_str()).collect();
    assert_eq!(vec!["VER", "NOR", "LEC", "SAI"], codes);
    assert_eq!(Some("Red Bull".to_string()), leaderboard[0].team);
    assert_eq!("Driver VER", leaderboard[0].name);
    assert_eq!(2, leaderboard[0].wins);

    let top = standings.drivers_leaderboard(2024, 2).unwrap();
    assert_eq!(2, top.len());
}

#[test]
fn drivers_leaderboard_points_tie_broken_by_wins_then_code() {
    let rows = vec![
        finish(2024, 1, "A", "T", 1, 1, 10.0),
        finish(2024, 1, "B", "T", 2, 2, 10.0),
        finish(2024, 1, "C", "U", 3, 3, 10.0),
    ];
    let standings = Standings::new(&rows);
    let codes: Vec<_> = standings
        .drivers_leaderboard(2024, 10)
        .unwrap()
        .into_iter()
        .map(|row| row.code)
        .collect();
    assert_eq!(vec!["A", "B", "C"], codes);
}

#[test]
fn driver_team_is_latest_in_season() {
    let rows = vec![
        labelled(finish(2024, 1, "30", "20", 12, 11, 0.0), "LAW", "RB", "Bahrain"),
        labelled(finish(2024, 2, "30", "9", 10, 9, 2.0), "LAW", "Red Bull", "Saudi Arabia"),
    ];
    let standings = Standings::new(&rows);
    let leaderboard = standings.drivers_leaderboard(2024, 1).unwrap();
    assert_eq!(Some("Red Bull".to_string()), leaderboard[0].team);
}

#[test]
fn constructors_leaderboard_ordering() {
    let rows = season();
    let standings = Standings::new(&rows);
    let leaderboard = standings.constructors_leaderboard(2024, 10).unwrap();
    let teams: Vec<_> = leaderboard
        .iter()
        .map(|row| (row.team.as_str(), row.points, row.wins, row.podiums))
        .collect();
    assert_eq!(
        vec![
            ("Ferrari", 62.0, 1, 3),
            ("Red Bull", 51.0, 2, 2),
            ("McLaren", 42.0, 0, 2),
        ],
        teams
    );
}

#[test]
fn limit_is_validated() {
    let rows = season();
    let standings = Standings::new(&rows);
    assert_eq!(
        Err(StandingsError::InvalidLimit(0)),
        standings.drivers_leaderboard(2024, 0)
    );
    assert_eq!(
        Err(StandingsError::InvalidLimit(101)),
        standings.constructors_leaderboard(2024, 101)
    );
    assert_eq!(
        "limit must be between 1 and 100, got 0",
        StandingsError::InvalidLimit(0).to_string()
    );
}
