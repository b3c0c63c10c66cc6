use crate::models::MarketKind;
use thiserror::Error;

/// Errors produced by the confidence engine and the prediction log
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid American odds: {0} (zero is undefined)")]
    InvalidOdds(i32),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Market unavailable: {0}")]
    MissingMarket(MarketKind),

    #[error("No prediction record with id {0}")]
    UnknownRecord(usize),

    #[error("Prediction log schema error: {0}")]
    Schema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl EngineError {
    /// Errors that should drop a single game from a batch rather than abort it
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            EngineError::MissingMarket(_) | EngineError::InvalidOdds(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
