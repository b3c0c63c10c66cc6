//! Append-only prediction history with accuracy queries.
//!
//! Records are never removed. The only mutation after `append` is setting
//! result flags through `update`/`grade`. Writers need `&mut`, so sharing a
//! log across threads goes through [`SharedPredictionLog`], which serializes
//! appends and lets readers see whole records only.

use crate::error::{EngineError, Result};
use crate::models::{GameOutcome, MarketKind, PredictionRecord, ResultFlag, ResultFlags};
use crate::utils::data::{load_records, save_records};
use crate::utils::grading::result_flags;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Position of a record in the log; stable because the log never deletes
pub type RecordId = usize;

pub type SharedPredictionLog = Arc<RwLock<PredictionLog>>;

/// Win/loss tally for one market
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketAccuracy {
    pub market: MarketKind,
    pub wins: usize,
    pub losses: usize,
    /// Percentage of decided picks that won; 0 when nothing is decided
    pub accuracy: f64,
}

impl MarketAccuracy {
    pub fn format(&self) -> String {
        format!(
            "{:<10} {:>6.2}% ({}-{})",
            self.market, self.accuracy, self.wins, self.losses
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct PredictionLog {
    records: Vec<PredictionRecord>,
    path: Option<PathBuf>,
}

impl PredictionLog {
    /// Empty log that lives only in memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a log backed by a CSV file. A missing file starts an empty log.
    /// Files in an older schema are migrated and written back once.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            info!(path = %path.display(), "starting new prediction log");
            return Ok(Self {
                records: Vec::new(),
                path: Some(path),
            });
        }

        let loaded = load_records(&path)?;
        let log = Self {
            records: loaded.records,
            path: Some(path),
        };
        if loaded.migrated {
            info!(from = ?loaded.version, "migrating prediction log schema");
            log.save()?;
        }
        Ok(log)
    }

    /// Persist to the backing file, if any
    pub fn save(&self) -> Result<()> {
        match &self.path {
            Some(path) => save_records(path, &self.records),
            None => Ok(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn shared(self) -> SharedPredictionLog {
        Arc::new(RwLock::new(self))
    }

    /// Add a record at the end of the log
    pub fn append(&mut self, record: PredictionRecord) -> RecordId {
        let id = self.records.len();
        debug!(id, home = %record.home_team, away = %record.away_team, "appending prediction");
        self.records.push(record);
        id
    }

    /// Replace the result flags of one record
    pub fn update(&mut self, id: RecordId, results: ResultFlags) -> Result<&PredictionRecord> {
        let record = self
            .records
            .get_mut(id)
            .ok_or(EngineError::UnknownRecord(id))?;
        record.results = results;
        Ok(&*record)
    }

    /// Grade one record against its final score
    pub fn grade(&mut self, id: RecordId, outcome: &GameOutcome) -> Result<&PredictionRecord> {
        let record = self.get(id).ok_or(EngineError::UnknownRecord(id))?;
        let flags = result_flags(record, outcome);
        self.update(id, flags)
    }

    pub fn get(&self, id: RecordId) -> Option<&PredictionRecord> {
        self.records.get(id)
    }

    pub fn records(&self) -> &[PredictionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Win percentage for a market over graded records only.
    /// Pending and push results are left out of the denominator; with no
    /// decided picks the result is 0.0.
    pub fn accuracy(&self, market: MarketKind) -> f64 {
        self.market_accuracy(market).accuracy
    }

    pub fn market_accuracy(&self, market: MarketKind) -> MarketAccuracy {
        let (wins, losses) = self
            .records
            .iter()
            .map(|r| r.results.get(market))
            .fold((0, 0), |(w, l), flag| match flag {
                ResultFlag::Win => (w + 1, l),
                ResultFlag::Loss => (w, l + 1),
                _ => (w, l),
            });

        let decided = wins + losses;
        let accuracy = if decided == 0 {
            0.0
        } else {
            wins as f64 / decided as f64 * 100.0
        };

        MarketAccuracy {
            market,
            wins,
            losses,
            accuracy,
        }
    }

    /// Accuracy for every market
    pub fn accuracy_summary(&self) -> Vec<MarketAccuracy> {
        MarketKind::ALL
            .iter()
            .map(|m| self.market_accuracy(*m))
            .collect()
    }

    /// The last `n` records, newest first
    pub fn recent(&self, n: usize) -> Vec<(RecordId, &PredictionRecord)> {
        self.records.iter().enumerate().rev().take(n).collect()
    }

    /// Records dated today (local time)
    pub fn today(&self) -> Vec<(RecordId, &PredictionRecord)> {
        self.on_date(Local::now().date_naive())
    }

    pub fn on_date(&self, date: NaiveDate) -> Vec<(RecordId, &PredictionRecord)> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.date == date)
            .collect()
    }

    /// Records with at least one market still pending
    pub fn ungraded(&self) -> Vec<(RecordId, &PredictionRecord)> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                MarketKind::ALL
                    .iter()
                    .any(|m| r.results.get(*m) == ResultFlag::Pending)
            })
            .collect()
    }
}
