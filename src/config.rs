//! Configuration for the confidence engine and the prediction log.

use crate::error::{EngineError, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Sampling configuration, fixed for the lifetime of a sampler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Monte Carlo draws per estimate
    #[serde(default = "default_samples")]
    pub samples: usize,
    /// Seed for the random source; entropy when unset
    #[serde(default)]
    pub seed: Option<u64>,
    /// Divisor applied to the spread before comparing against a standard normal draw
    #[serde(default = "default_spread_scale")]
    pub spread_scale: f64,
    /// Assumed combined-score distribution for totals
    #[serde(default = "default_total_mean")]
    pub total_mean: f64,
    #[serde(default = "default_total_std_dev")]
    pub total_std_dev: f64,
}

fn default_samples() -> usize {
    1_000_000
}

fn default_spread_scale() -> f64 {
    10.0
}

fn default_total_mean() -> f64 {
    220.0
}

fn default_total_std_dev() -> f64 {
    15.0
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            samples: default_samples(),
            seed: None,
            spread_scale: default_spread_scale(),
            total_mean: default_total_mean(),
            total_std_dev: default_total_std_dev(),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `MC_SAMPLES` and `MC_SEED`, with explicit
    /// overrides taking precedence over the environment.
    /// Nothing is validated here; `ConfidenceSampler::new` checks the final config.
    pub fn from_env_with(samples: Option<usize>, seed: Option<u64>) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), samples, seed)
    }

    fn from_lookup<F>(lookup: F, samples: Option<usize>, seed: Option<u64>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.samples = match samples {
            Some(samples) => samples,
            None => match lookup("MC_SAMPLES") {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| EngineError::InvalidConfig(format!("MC_SAMPLES={}", raw)))?,
                None => config.samples,
            },
        };

        config.seed = match seed {
            Some(seed) => Some(seed),
            None => match lookup("MC_SEED") {
                Some(raw) => Some(
                    raw.trim()
                        .parse()
                        .map_err(|_| EngineError::InvalidConfig(format!("MC_SEED={}", raw)))?,
                ),
                None => None,
            },
        };

        Ok(config)
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.samples == 0 {
            return Err(EngineError::InvalidConfig(
                "sample count must be positive".to_string(),
            ));
        }
        if !(self.spread_scale.is_finite() && self.spread_scale != 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "spread scale must be finite and non-zero, got {}",
                self.spread_scale
            )));
        }
        if !(self.total_std_dev.is_finite() && self.total_std_dev > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "total standard deviation must be positive, got {}",
                self.total_std_dev
            )));
        }
        Ok(())
    }

    /// Random source for a single estimate
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Random source for the `index`-th game of a batch.
    /// Seeded batches stay reproducible regardless of evaluation order.
    pub fn rng_for(&self, index: usize) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
            None => StdRng::from_entropy(),
        }
    }
}

/// Filesystem locations used by the binary
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub predictions_csv: PathBuf,
    pub odds_cache: PathBuf,
}

impl Default for AppPaths {
    fn default() -> Self {
        Self {
            predictions_csv: PathBuf::from("data/predictions.csv"),
            odds_cache: PathBuf::from("cache/odds_cache.json"),
        }
    }
}

impl AppPaths {
    /// Defaults overridden by `PREDICTIONS_CSV` and `ODDS_CACHE`
    pub fn from_env() -> Self {
        let mut paths = Self::default();
        if let Ok(path) = std::env::var("PREDICTIONS_CSV") {
            paths.predictions_csv = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("ODDS_CACHE") {
            paths.odds_cache = PathBuf::from(path);
        }
        paths
    }
}
