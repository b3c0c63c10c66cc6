pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod utils;

pub use api::*;
pub use config::{AppPaths, EngineConfig};
pub use error::{EngineError, Result};
pub use models::*;
pub use utils::*;

use chrono::NaiveDate;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utils::ev_calculator::MoneylineValue;
use utils::sampler::ConfidenceSampler;

/// Run all three estimators for one game.
/// A game missing any market is rejected with `MissingMarket`.
pub fn predict_game<R: Rng>(
    sampler: &ConfidenceSampler,
    game: &GameOdds,
    date: NaiveDate,
    rng: &mut R,
) -> Result<PredictionRecord> {
    let (home_odds, away_odds) = game
        .moneyline()
        .ok_or(EngineError::MissingMarket(MarketKind::Moneyline))?;
    let spread = game
        .spread()
        .ok_or(EngineError::MissingMarket(MarketKind::Spread))?;
    let total = game
        .total()
        .ok_or(EngineError::MissingMarket(MarketKind::Total))?;

    let moneyline = sampler.moneyline(home_odds, away_odds, rng)?;
    let spread_pick = sampler.spread(spread, rng);
    let total_pick = sampler.total(total, rng);

    Ok(PredictionRecord {
        date,
        home_team: game.home_team.clone(),
        away_team: game.away_team.clone(),
        moneyline,
        spread: LinePick {
            pick: spread_pick,
            line: spread,
        },
        total: LinePick {
            pick: total_pick,
            line: total,
        },
        results: ResultFlags::default(),
    })
}

/// Price the moneyline pick of a record against the odds it was made from
pub fn moneyline_value(record: &PredictionRecord, game: &GameOdds) -> Result<MoneylineValue> {
    let (home_odds, away_odds) = game
        .moneyline()
        .ok_or(EngineError::MissingMarket(MarketKind::Moneyline))?;
    let pick = &record.moneyline;
    let (model_prob, odds) = match pick.side {
        Side::Away => (1.0 - pick.probability, away_odds),
        _ => (pick.probability, home_odds),
    };
    MoneylineValue::evaluate(model_prob, odds)
}

/// A game the batch could not predict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedGame {
    pub home_team: String,
    pub away_team: String,
    pub reason: String,
}

/// Results of predicting a slate of games
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Predictions in the same order as the input games
    pub records: Vec<PredictionRecord>,
    pub skipped: Vec<SkippedGame>,
}

/// Predict every game on a slate on the rayon pool.
/// Each game draws from its own generator derived from the configured seed,
/// so a seeded batch is reproducible. Failures skip the game, not the batch.
pub fn predict_games(
    sampler: &ConfidenceSampler,
    games: &[GameOdds],
    date: NaiveDate,
) -> BatchReport {
    let results: Vec<Result<PredictionRecord>> = games
        .par_iter()
        .enumerate()
        .map(|(index, game)| {
            let mut rng = sampler.config().rng_for(index);
            predict_game(sampler, game, date, &mut rng)
        })
        .collect();

    let mut report = BatchReport::default();
    for (game, result) in games.iter().zip(results) {
        match result {
            Ok(record) => report.records.push(record),
            Err(e) => {
                if e.is_skip() {
                    warn!(
                        home = %game.home_team,
                        away = %game.away_team,
                        "skipping game: {}",
                        e
                    );
                } else {
                    error!(
                        home = %game.home_team,
                        away = %game.away_team,
                        "prediction failed: {}",
                        e
                    );
                }
                report.skipped.push(SkippedGame {
                    home_team: game.home_team.clone(),
                    away_team: game.away_team.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        predicted = report.records.len(),
        skipped = report.skipped.len(),
        "batch complete"
    );
    report
}
