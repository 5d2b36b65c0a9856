//! Race results: the raw records supplied by a results source and the validated rows the feature
//! pipeline and the standings queries operate on.

use std::ffi::OsStr;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::csv::CsvReader;
use crate::error::{FeatureError, InvalidRecord};
use crate::file;

/// Podium places are P1 to P3 inclusive.
pub const PODIUM: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstructorId(pub String);

impl Display for DriverId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for ConstructorId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DriverId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for ConstructorId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifies a race chronologically. Ordering is by season, then by round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RaceKey {
    pub season: u32,
    pub round: u32,
}
impl RaceKey {
    pub fn new(season: u32, round: u32) -> Self {
        Self { season, round }
    }
}

impl Display for RaceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} R{}", self.season, self.round)
    }
}

/// Descriptive attributes carried alongside a result. None of these take part in feature
/// computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub race_id: Option<u64>,
    pub grand_prix: Option<String>,
    pub circuit: Option<String>,
    pub country: Option<String>,
    pub location: Option<String>,
    pub date: Option<NaiveDate>,
    pub driver_code: Option<String>,
    pub driver_name: Option<String>,
    pub team_name: Option<String>,
}

/// Identifiers arrive either as text codes or as numeric keys.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(u64),
}
impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }
    }
}

/// A result as supplied by the source, before validation. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawResult {
    pub season: Option<u32>,
    pub race_round: Option<u32>,
    pub driver_id: Option<RawId>,
    pub constructor_id: Option<RawId>,
    pub starting_position: Option<u32>,
    pub final_position: Option<u32>,
    pub finish_status: Option<String>,
    pub race_points: Option<f64>,
    #[serde(flatten)]
    pub labels: Labels,
}

/// One driver's result in one race.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub season: u32,
    pub race_round: u32,
    pub driver_id: DriverId,
    pub constructor_id: ConstructorId,
    pub starting_position: Option<u32>,
    pub final_position: Option<u32>,
    pub finish_status: Option<String>,
    pub race_points: f64,
    pub labels: Labels,
}
impl ResultRow {
    pub fn new(
        season: u32,
        race_round: u32,
        driver_id: impl Into<DriverId>,
        constructor_id: impl Into<ConstructorId>,
    ) -> Self {
        Self {
            season,
            race_round,
            driver_id: driver_id.into(),
            constructor_id: constructor_id.into(),
            starting_position: None,
            final_position: None,
            finish_status: None,
            race_points: 0.0,
            labels: Labels::default(),
        }
    }

    pub fn with_grid(mut self, starting_position: u32) -> Self {
        self.starting_position = Some(starting_position);
        self
    }

    pub fn with_position(mut self, final_position: u32) -> Self {
        self.final_position = Some(final_position);
        self
    }

    pub fn with_status(mut self, finish_status: &str) -> Self {
        self.finish_status = Some(finish_status.to_string());
        self
    }

    pub fn with_points(mut self, race_points: f64) -> Self {
        self.race_points = race_points;
        self
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn race(&self) -> RaceKey {
        RaceKey::new(self.season, self.race_round)
    }

    /// A DNF or a disqualification is a non-podium, not a missing label.
    pub fn is_podium(&self) -> bool {
        matches!(self.final_position, Some(position) if (1..=PODIUM).contains(&position))
    }

    pub fn is_win(&self) -> bool {
        self.final_position == Some(1)
    }

    /// The display code of the driver, falling back to the identifier.
    pub fn driver_code(&self) -> &str {
        self.labels
            .driver_code
            .as_deref()
            .unwrap_or(&self.driver_id.0)
    }

    pub fn team_name(&self) -> &str {
        self.labels
            .team_name
            .as_deref()
            .unwrap_or(&self.constructor_id.0)
    }

    pub fn grand_prix(&self) -> String {
        self.labels
            .grand_prix
            .clone()
            .unwrap_or_else(|| format!("Round {}", self.race_round))
    }
}

impl TryFrom<RawResult> for ResultRow {
    type Error = InvalidRecord;

    fn try_from(raw: RawResult) -> Result<Self, Self::Error> {
        fn identifier(field: &'static str, id: Option<RawId>) -> Result<String, InvalidRecord> {
            let id = id.ok_or(InvalidRecord::MissingField(field))?.into_string();
            let trimmed = id.trim();
            if trimmed.is_empty() {
                return Err(InvalidRecord::BlankIdentifier(field));
            }
            Ok(trimmed.to_string())
        }

        let season = raw.season.ok_or(InvalidRecord::MissingField("season"))?;
        let race_round = raw
            .race_round
            .ok_or(InvalidRecord::MissingField("race_round"))?;
        let driver_id = DriverId(identifier("driver_id", raw.driver_id)?);
        let constructor_id = ConstructorId(identifier("constructor_id", raw.constructor_id)?);
        let race_points = raw.race_points.unwrap_or(0.0);
        if !race_points.is_finite() || race_points < 0.0 {
            return Err(InvalidRecord::InvalidPoints(race_points));
        }
        Ok(Self {
            season,
            race_round,
            driver_id,
            constructor_id,
            starting_position: raw.starting_position,
            final_position: raw.final_position,
            finish_status: raw.finish_status.filter(|status| !status.trim().is_empty()),
            race_points,
            labels: raw.labels,
        })
    }
}

/// Validates a batch of raw records. A single unusable record rejects the whole batch, since
/// a dropped or misordered row would silently shift every trailing window after it.
pub fn validate(raws: Vec<RawResult>) -> Result<Vec<ResultRow>, FeatureError> {
    raws.into_iter()
        .enumerate()
        .map(|(index, raw)| {
            ResultRow::try_from(raw).map_err(|source| FeatureError::InvalidRecord { index, source })
        })
        .collect()
}

/// Sorts rows into chronological order, breaking ties within a race by driver, and rejects
/// any driver appearing twice in the same race.
pub fn order(rows: &mut [ResultRow]) -> Result<(), FeatureError> {
    rows.sort_by(|a, b| {
        a.race()
            .cmp(&b.race())
            .then_with(|| a.driver_id.cmp(&b.driver_id))
    });
    if let Some(pair) = rows
        .windows(2)
        .find(|pair| pair[0].race() == pair[1].race() && pair[0].driver_id == pair[1].driver_id)
    {
        return Err(FeatureError::DuplicateEntry {
            race: pair[1].race(),
            driver: pair[1].driver_id.clone(),
        });
    }
    Ok(())
}

const CSV_COLUMNS: [&str; 17] = [
    "season",
    "race_round",
    "driver_id",
    "constructor_id",
    "starting_position",
    "final_position",
    "finish_status",
    "race_points",
    "race_id",
    "grand_prix",
    "circuit",
    "country",
    "location",
    "date",
    "driver_code",
    "driver_name",
    "team_name",
];

/// Reads raw results from a CSV file with a header row. Columns are matched by name; unknown
/// columns are ignored and empty cells are read as absent.
pub fn read_csv(path: impl AsRef<Path>) -> anyhow::Result<Vec<RawResult>> {
    let path = path.as_ref();
    let mut reader = CsvReader::open(path)?;
    let header = match reader.next() {
        None => return Ok(vec![]),
        Some(header) => header?,
    };
    let positions: Vec<Option<usize>> = CSV_COLUMNS
        .iter()
        .map(|column| header.iter().position(|name| name.trim() == *column))
        .collect();

    let mut raws = vec![];
    for (line, record) in reader.enumerate() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let cell = |column: usize| {
            positions[column]
                .and_then(|position| record.get(position))
                .map(|cell| cell.trim())
                .filter(|cell| !cell.is_empty())
        };
        let raw = parse_csv_record(&cell)
            .with_context(|| format!("{}: line {}", path.display(), line + 2))?;
        raws.push(raw);
    }
    Ok(raws)
}

fn parse_csv_record<'a>(cell: &impl Fn(usize) -> Option<&'a str>) -> anyhow::Result<RawResult> {
    fn parse<T: std::str::FromStr>(name: &str, value: Option<&str>) -> anyhow::Result<Option<T>> {
        value
            .map(|value| {
                value
                    .parse()
                    .map_err(|_| anyhow!("invalid {name} '{value}'"))
            })
            .transpose()
    }
    let text = |column: usize| cell(column).map(ToString::to_string);

    let date = cell(13)
        .map(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d"))
        .transpose()
        .map_err(|err| anyhow!("invalid date: {err}"))?;
    Ok(RawResult {
        season: parse("season", cell(0))?,
        race_round: parse("race_round", cell(1))?,
        driver_id: text(2).map(RawId::Text),
        constructor_id: text(3).map(RawId::Text),
        starting_position: parse("starting_position", cell(4))?,
        final_position: parse("final_position", cell(5))?,
        finish_status: text(6),
        race_points: parse("race_points", cell(7))?,
        labels: Labels {
            race_id: parse("race_id", cell(8))?,
            grand_prix: text(9),
            circuit: text(10),
            country: text(11),
            location: text(12),
            date,
            driver_code: text(14),
            driver_name: text(15),
            team_name: text(16),
        },
    })
}

/// Reads raw results from a JSON array of records.
pub fn read_json(path: impl AsRef<Path>) -> anyhow::Result<Vec<RawResult>> {
    let raws = file::read_json(path)?;
    Ok(raws)
}

fn read_file(path: &Path) -> anyhow::Result<Vec<RawResult>> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => read_csv(path),
        Some("json") => read_json(path),
        _ => bail!("unsupported results file {}", path.display()),
    }
}

/// Reads raw results from a single CSV/JSON file or from every such file under a directory.
pub fn read_from_path(path: impl AsRef<Path>) -> anyhow::Result<Vec<RawResult>> {
    let mut files = vec![];
    file::recurse_dir(PathBuf::from(path.as_ref()), &mut files, &mut |ext| {
        ext == "csv" || ext == "json"
    })?;
    files.sort();
    let mut raws = vec![];
    for file in files {
        let mut file_raws =
            read_file(&file).with_context(|| format!("reading {}", file.display()))?;
        debug!("read {} results from {}", file_raws.len(), file.display());
        raws.append(&mut file_raws);
    }
    Ok(raws)
}

/// Reads and validates all results under `path`.
pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Vec<ResultRow>> {
    let raws = read_from_path(path)?;
    Ok(validate(raws)?)
}
