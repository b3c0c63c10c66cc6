use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Convert American odds to implied probability
/// Positive odds (+150) mean you win $150 on a $100 bet
/// Negative odds (-150) mean you need to bet $150 to win $100
/// Zero is not a valid price and is rejected
pub fn american_odds_to_probability(odds: i32) -> Result<f64> {
    if odds > 0 {
        // For positive odds: 100 / (odds + 100)
        Ok(100.0 / (odds as f64 + 100.0))
    } else if odds < 0 {
        // For negative odds: |odds| / (|odds| + 100)
        let abs_odds = (odds as f64).abs();
        Ok(abs_odds / (abs_odds + 100.0))
    } else {
        Err(EngineError::InvalidOdds(odds))
    }
}

/// Home win probability with the bookmaker margin removed
pub fn no_vig_home_probability(home_odds: i32, away_odds: i32) -> Result<f64> {
    let home_prob = american_odds_to_probability(home_odds)?;
    let away_prob = american_odds_to_probability(away_odds)?;
    Ok(home_prob / (home_prob + away_prob))
}

/// Convert probability to American odds
pub fn probability_to_american_odds(prob: f64) -> i32 {
    if prob >= 0.5 {
        // Favorite (negative odds)
        -((prob / (1.0 - prob)) * 100.0).round() as i32
    } else {
        // Underdog (positive odds)
        (((1.0 - prob) / prob) * 100.0).round() as i32
    }
}

/// Calculate expected value for a bet
/// EV = (probability of winning * amount won per bet) - (probability of losing * amount lost per bet)
/// Returns EV per unit staked
pub fn calculate_expected_value(model_prob: f64, odds: i32) -> Result<f64> {
    let win_amount = if odds > 0 {
        odds as f64 / 100.0
    } else if odds < 0 {
        100.0 / (odds as f64).abs()
    } else {
        return Err(EngineError::InvalidOdds(odds));
    };

    let lose_amount = 1.0; // You lose your bet amount
    let prob_lose = 1.0 - model_prob;

    Ok((model_prob * win_amount) - (prob_lose * lose_amount))
}

/// How the engine's moneyline pick prices against the quoted odds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoneylineValue {
    pub market_odds: i32,
    pub fair_odds: i32,
    pub implied_prob: f64,
    pub model_prob: f64,
    pub edge: f64,
    pub expected_value: f64,
}

impl MoneylineValue {
    /// `model_prob` is the engine's probability for the side priced at `market_odds`
    pub fn evaluate(model_prob: f64, market_odds: i32) -> Result<Self> {
        let implied_prob = american_odds_to_probability(market_odds)?;
        Ok(Self {
            market_odds,
            fair_odds: probability_to_american_odds(model_prob),
            implied_prob,
            model_prob,
            edge: model_prob - implied_prob,
            expected_value: calculate_expected_value(model_prob, market_odds)?,
        })
    }

    pub fn format(&self) -> String {
        format!(
            "Odds: {:+} | Fair: {:+} | EV: {:+.2}% | Edge: {:+.2}% | Model: {:.1}% | Implied: {:.1}%",
            self.market_odds,
            self.fair_odds,
            self.expected_value * 100.0,
            self.edge * 100.0,
            self.model_prob * 100.0,
            self.implied_prob * 100.0
        )
    }
}
