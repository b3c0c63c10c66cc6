use crate::error::{EngineError, Result};
use crate::models::{ConfidencePick, LinePick, PredictionRecord, ResultFlag, ResultFlags, Side};
use anyhow::Context;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use tracing::{info, warn};

/// Prediction columns present since the first version of the log
pub const PREDICTION_COLUMNS: [&str; 11] = [
    "date",
    "home_team",
    "away_team",
    "moneyline_pred",
    "moneyline_conf",
    "spread_pred",
    "spread_value",
    "spread_conf",
    "total_pred",
    "total_value",
    "total_conf",
];

/// Grading columns added in the second version
pub const RESULT_COLUMNS: [&str; 3] = ["moneyline_result", "spread_result", "total_result"];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Layout of a prediction log file, identified by its header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    /// Predictions only
    V1,
    /// Predictions plus result columns
    V2,
}

impl SchemaVersion {
    pub const CURRENT: SchemaVersion = SchemaVersion::V2;
}

/// Records read from a log file plus what the loader had to do to them
#[derive(Debug, Clone)]
pub struct LoadedLog {
    pub records: Vec<PredictionRecord>,
    pub version: SchemaVersion,
    /// Result columns were missing and were filled with `pending`
    pub migrated: bool,
}

/// Save any serializable value to a JSON cache file
pub fn save_to_cache<T: Serialize + ?Sized>(value: &T, cache_file: &Path) -> anyhow::Result<()> {
    if let Some(parent) = cache_file.parent() {
        fs::create_dir_all(parent).context("Failed to create cache directory")?;
    }
    let json = serde_json::to_string_pretty(value).context("Failed to serialize cache data")?;
    fs::write(cache_file, json).context("Failed to write cache file")?;
    Ok(())
}

/// Load a value from a JSON cache file
pub fn load_from_cache<T: DeserializeOwned>(cache_file: &Path) -> anyhow::Result<T> {
    let json = fs::read_to_string(cache_file).context("Failed to read cache file")?;
    let value = serde_json::from_str(&json).context("Failed to deserialize cache data")?;
    Ok(value)
}

/// Read prediction records from CSV, backfilling result columns when absent
pub fn read_records<R: Read>(reader: R) -> Result<LoadedLog> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let positions: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, h)| (h, i)).collect();

    let mut columns = HashMap::new();
    for name in PREDICTION_COLUMNS {
        let idx = positions
            .get(name)
            .copied()
            .ok_or_else(|| EngineError::Schema(format!("missing column '{}'", name)))?;
        columns.insert(name, idx);
    }

    let result_columns: Vec<Option<usize>> = RESULT_COLUMNS
        .iter()
        .map(|name| positions.get(name).copied())
        .collect();
    let version = if result_columns.iter().all(Option::is_some) {
        SchemaVersion::V2
    } else {
        SchemaVersion::V1
    };
    let migrated = version != SchemaVersion::CURRENT;

    let mut records = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let raw = result?;
        let cell = |name: &str| raw.get(columns[name]).unwrap_or("");
        let flag = |slot: usize| -> Result<ResultFlag> {
            match result_columns[slot] {
                Some(idx) => {
                    let value = raw.get(idx).unwrap_or("");
                    ResultFlag::parse(value).ok_or_else(|| {
                        EngineError::Schema(format!("row {}: bad result flag '{}'", row + 1, value))
                    })
                }
                None => Ok(ResultFlag::Pending),
            }
        };

        let date = NaiveDate::parse_from_str(cell("date"), DATE_FORMAT).map_err(|e| {
            EngineError::Schema(format!("row {}: bad date '{}': {}", row + 1, cell("date"), e))
        })?;
        let home_team = cell("home_team").to_string();
        let away_team = cell("away_team").to_string();

        let moneyline_side = parse_team_side(cell("moneyline_pred"), &home_team, &away_team)
            .ok_or_else(|| bad_cell(row, "moneyline_pred", cell("moneyline_pred")))?;
        let spread_side = parse_team_side(cell("spread_pred"), &home_team, &away_team)
            .ok_or_else(|| bad_cell(row, "spread_pred", cell("spread_pred")))?;
        let total_side = parse_total_side(cell("total_pred"))
            .ok_or_else(|| bad_cell(row, "total_pred", cell("total_pred")))?;

        let number = |name: &str| parse_number(row, name, cell(name));
        let moneyline_conf = number("moneyline_conf")?;
        let spread_conf = number("spread_conf")?;
        let total_conf = number("total_conf")?;

        records.push(PredictionRecord {
            date,
            moneyline: stored_pick(moneyline_side, moneyline_conf, Side::Home),
            spread: LinePick {
                pick: stored_pick(spread_side, spread_conf, Side::Home),
                line: number("spread_value")?,
            },
            total: LinePick {
                pick: stored_pick(total_side, total_conf, Side::Over),
                line: number("total_value")?,
            },
            results: ResultFlags {
                moneyline: flag(0)?,
                spread: flag(1)?,
                total: flag(2)?,
            },
            home_team,
            away_team,
        });
    }

    Ok(LoadedLog {
        records,
        version,
        migrated,
    })
}

/// Write prediction records as CSV in the current schema
pub fn write_records<W: Write>(writer: W, records: &[PredictionRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(PREDICTION_COLUMNS.iter().chain(RESULT_COLUMNS.iter()))?;

    for record in records {
        wtr.write_record([
            record.date.format(DATE_FORMAT).to_string(),
            record.home_team.clone(),
            record.away_team.clone(),
            record.side_label(record.moneyline.side),
            format!("{:.2}", record.moneyline.confidence),
            record.side_label(record.spread.pick.side),
            record.spread.line.to_string(),
            format!("{:.2}", record.spread.pick.confidence),
            record.total.pick.side.to_string(),
            record.total.line.to_string(),
            format!("{:.2}", record.total.pick.confidence),
            record.results.moneyline.to_string(),
            record.results.spread.to_string(),
            record.results.total.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Load a prediction log file
pub fn load_records(path: &Path) -> Result<LoadedLog> {
    let file = File::open(path)?;
    let loaded = read_records(file)?;
    info!(
        path = %path.display(),
        records = loaded.records.len(),
        version = ?loaded.version,
        "loaded prediction log"
    );
    Ok(loaded)
}

/// Save a prediction log file through a temp file and rename,
/// so a failed write leaves the previous file intact
pub fn save_records(path: &Path, records: &[PredictionRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("csv.tmp");
    let written = File::create(&tmp)
        .map_err(EngineError::from)
        .and_then(|file| write_records(file, records))
        .and_then(|()| fs::rename(&tmp, path).map_err(EngineError::from));
    if let Err(e) = written {
        warn!(path = %tmp.display(), "failed to save prediction log: {}", e);
        fs::remove_file(&tmp).ok();
        return Err(e);
    }
    info!(path = %path.display(), records = records.len(), "saved prediction log");
    Ok(())
}

fn parse_team_side(value: &str, home_team: &str, away_team: &str) -> Option<Side> {
    if value == home_team || value.eq_ignore_ascii_case("home") {
        Some(Side::Home)
    } else if value == away_team || value.eq_ignore_ascii_case("away") {
        Some(Side::Away)
    } else {
        None
    }
}

fn parse_total_side(value: &str) -> Option<Side> {
    if value.eq_ignore_ascii_case("over") {
        Some(Side::Over)
    } else if value.eq_ignore_ascii_case("under") {
        Some(Side::Under)
    } else {
        None
    }
}

fn parse_number(row: usize, column: &str, value: &str) -> Result<f64> {
    value.parse().map_err(|_| bad_cell(row, column, value))
}

fn bad_cell(row: usize, column: &str, value: &str) -> EngineError {
    EngineError::Schema(format!("row {}: bad {} '{}'", row + 1, column, value))
}

/// Rebuild a pick from its stored confidence; the reference-side probability
/// is recovered from the rounded percentage
fn stored_pick(side: Side, confidence: f64, reference: Side) -> ConfidencePick {
    let chosen = confidence / 100.0;
    ConfidencePick {
        side,
        confidence,
        probability: if side == reference { chosen } else { 1.0 - chosen },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const V1_CSV: &str = "\
date,home_team,away_team,moneyline_pred,moneyline_conf,spread_pred,spread_value,spread_conf,total_pred,total_value,total_conf
2025-01-15,Boston Celtics,Miami Heat,Boston Celtics,62.57,Miami Heat,-6.5,58.10,Over,215.5,74.20
2025-01-15,Denver Nuggets,Utah Jazz,Home,80.00,Home,-11.0,86.43,Under,235.0,89.97
";

    fn sample_record() -> PredictionRecord {
        PredictionRecord {
            date: NaiveDate::from_ymd_opt(2025, 1, 16).unwrap(),
            home_team: "Los Angeles Lakers".to_string(),
            away_team: "Golden State Warriors".to_string(),
            moneyline: ConfidencePick {
                side: Side::Away,
                confidence: 55.25,
                probability: 0.4475,
            },
            spread: LinePick {
                pick: ConfidencePick {
                    side: Side::Home,
                    confidence: 51.2,
                    probability: 0.512,
                },
                line: 1.5,
            },
            total: LinePick {
                pick: ConfidencePick {
                    side: Side::Under,
                    confidence: 60.0,
                    probability: 0.4,
                },
                line: 223.5,
            },
            results: ResultFlags {
                moneyline: ResultFlag::Win,
                spread: ResultFlag::Loss,
                total: ResultFlag::Pending,
            },
        }
    }

    fn temp_dir(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("hoops_confidence_{}_{}", name, std::process::id()))
    }

    #[test]
    fn test_read_v1_backfills_pending() {
        let loaded = read_records(V1_CSV.as_bytes()).unwrap();
        assert_eq!(loaded.version, SchemaVersion::V1);
        assert!(loaded.migrated);
        assert_eq!(loaded.records.len(), 2);

        let first = &loaded.records[0];
        assert_eq!(first.moneyline.side, Side::Home);
        assert_eq!(first.moneyline.confidence, 62.57);
        assert_eq!(first.spread.pick.side, Side::Away);
        assert_eq!(first.spread.line, -6.5);
        assert_eq!(first.total.pick.side, Side::Over);
        assert!(first.results.is_pending());

        let second = &loaded.records[1];
        assert_eq!(second.moneyline.side, Side::Home);
        assert_eq!(second.total.pick.side, Side::Under);
    }

    #[test]
    fn test_missing_prediction_column_is_schema_error() {
        let csv = "date,home_team,away_team\n2025-01-15,A,B\n";
        assert!(matches!(read_records(csv.as_bytes()), Err(EngineError::Schema(_))));
    }

    #[test]
    fn test_bad_pick_is_schema_error() {
        let csv = V1_CSV.replace("Boston Celtics,62.57", "Nobody,62.57");
        assert!(matches!(read_records(csv.as_bytes()), Err(EngineError::Schema(_))));
    }

    #[test]
    fn test_write_then_read_keeps_picks_and_flags() {
        let record = sample_record();
        let mut buf = Vec::new();
        write_records(&mut buf, std::slice::from_ref(&record)).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header.split(',').count(), 14);
        assert!(text.contains("Golden State Warriors,55.25"));

        let loaded = read_records(buf.as_slice()).unwrap();
        assert_eq!(loaded.version, SchemaVersion::V2);
        assert!(!loaded.migrated);
        let back = &loaded.records[0];
        assert_eq!(back.date, record.date);
        assert_eq!(back.moneyline.side, Side::Away);
        assert_eq!(back.moneyline.confidence, 55.25);
        assert_eq!(back.spread.line, 1.5);
        assert_eq!(back.total.pick.side, Side::Under);
        assert_eq!(back.results, record.results);
    }

    #[test]
    fn test_save_replaces_file_atomically() {
        let dir = temp_dir("data");
        let path = dir.join("predictions.csv");

        save_records(&path, &[sample_record()]).unwrap();
        save_records(&path, &[sample_record(), sample_record()]).unwrap();
        assert!(!path.with_extension("csv.tmp").exists());

        let loaded = load_records(&path).unwrap();
        assert_eq!(loaded.records.len(), 2);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_failed_save_keeps_previous_file() {
        let dir = temp_dir("failed_save");
        let path = dir.join("predictions.csv");
        save_records(&path, &[sample_record()]).unwrap();

        // A directory in the temp file's place makes the write fail
        let tmp = path.with_extension("csv.tmp");
        fs::create_dir_all(&tmp).unwrap();
        let result = save_records(&path, &[sample_record(), sample_record()]);
        assert!(matches!(result, Err(EngineError::Io(_))));

        let loaded = load_records(&path).unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].home_team, "Los Angeles Lakers");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_cache_round_trip() {
        let dir = temp_dir("cache");
        let path = dir.join("values.json");
        save_to_cache(&vec![1, 2, 3], &path).unwrap();
        let values: Vec<i32> = load_from_cache(&path).unwrap();
        assert_eq!(values, vec![1, 2, 3]);
        fs::remove_dir_all(&dir).ok();
    }
}
