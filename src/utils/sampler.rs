//! Monte Carlo confidence estimates for moneyline, spread and total markets.
//!
//! Every estimator takes its random source as an argument, so a seeded
//! generator gives bit-identical picks for identical inputs.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::models::{ConfidencePick, Side};
use crate::utils::ev_calculator::no_vig_home_probability;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Round a 0-1 probability to a 0-100 percentage with two decimals
pub fn to_confidence(prob: f64) -> f64 {
    (prob * 10_000.0).round() / 100.0
}

/// Standard normal draw via Box-Muller
pub fn sample_standard_normal<R: Rng>(rng: &mut R) -> f64 {
    // 1 - u keeps u1 in (0, 1] so the log is finite
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Mean of a simulated distribution and the share of draws above a line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointsProjection {
    pub mean: f64,
    pub over_probability: f64,
}

/// Produces confidence picks from a fixed configuration
#[derive(Debug, Clone)]
pub struct ConfidenceSampler {
    config: EngineConfig,
}

impl ConfidenceSampler {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Moneyline pick from both sides' American odds.
    /// The no-vig home probability is re-estimated from uniform draws.
    pub fn moneyline<R: Rng>(
        &self,
        home_odds: i32,
        away_odds: i32,
        rng: &mut R,
    ) -> Result<ConfidencePick> {
        let p = no_vig_home_probability(home_odds, away_odds)?;

        let n = self.config.samples;
        let hits = (0..n).filter(|_| rng.gen::<f64>() < p).count();
        let estimate = hits as f64 / n as f64;

        let side = if estimate >= 0.5 { Side::Home } else { Side::Away };
        let pick = pick_for(side, estimate, Side::Home);
        debug!(home_odds, away_odds, p, estimate, ?side, "moneyline estimate");
        Ok(pick)
    }

    /// Spread pick from the home team's line
    pub fn spread<R: Rng>(&self, spread: f64, rng: &mut R) -> ConfidencePick {
        let threshold = spread / self.config.spread_scale;

        let n = self.config.samples;
        let covers = (0..n)
            .filter(|_| sample_standard_normal(rng) > threshold)
            .count();
        let cover_prob = covers as f64 / n as f64;

        let side = if cover_prob > 0.5 { Side::Home } else { Side::Away };
        debug!(spread, cover_prob, ?side, "spread estimate");
        pick_for(side, cover_prob, Side::Home)
    }

    /// Over/under pick against the configured scoring distribution
    pub fn total<R: Rng>(&self, total: f64, rng: &mut R) -> ConfidencePick {
        let projection = self.sample_over(
            self.config.total_mean,
            self.config.total_std_dev,
            total,
            rng,
        );
        let over_prob = projection.over_probability;

        let side = if over_prob > 0.5 { Side::Over } else { Side::Under };
        debug!(total, over_prob, ?side, "total estimate");
        pick_for(side, over_prob, Side::Over)
    }

    /// Simulate Normal(mean, std_dev) and measure how often it clears `line`
    pub fn points_projection<R: Rng>(
        &self,
        mean: f64,
        std_dev: f64,
        line: f64,
        rng: &mut R,
    ) -> Result<PointsProjection> {
        if !(std_dev.is_finite() && std_dev > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "standard deviation must be positive, got {}",
                std_dev
            )));
        }
        Ok(self.sample_over(mean, std_dev, line, rng))
    }

    fn sample_over<R: Rng>(
        &self,
        mean: f64,
        std_dev: f64,
        line: f64,
        rng: &mut R,
    ) -> PointsProjection {
        let n = self.config.samples;
        let mut sum = 0.0;
        let mut over = 0usize;
        for _ in 0..n {
            let draw = mean + std_dev * sample_standard_normal(rng);
            sum += draw;
            if draw > line {
                over += 1;
            }
        }
        PointsProjection {
            mean: sum / n as f64,
            over_probability: over as f64 / n as f64,
        }
    }
}

/// Build a pick whose confidence is the chosen side's probability.
/// `prob` is the estimate for `reference`; the other side gets its complement.
fn pick_for(side: Side, prob: f64, reference: Side) -> ConfidencePick {
    let chosen = if side == reference { prob } else { 1.0 - prob };
    ConfidencePick {
        side,
        confidence: to_confidence(chosen),
        probability: prob,
    }
}
