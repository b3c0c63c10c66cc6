use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three bet types the engine estimates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    Moneyline,
    Spread,
    Total,
}

impl MarketKind {
    pub const ALL: [MarketKind; 3] = [MarketKind::Moneyline, MarketKind::Spread, MarketKind::Total];

    /// Provider key for this market (The Odds API naming)
    pub fn provider_key(&self) -> &'static str {
        match self {
            MarketKind::Moneyline => "h2h",
            MarketKind::Spread => "spreads",
            MarketKind::Total => "totals",
        }
    }
}

impl fmt::Display for MarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MarketKind::Moneyline => "moneyline",
            MarketKind::Spread => "spread",
            MarketKind::Total => "total",
        };
        f.write_str(name)
    }
}

/// Which side of a market a pick lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
    Over,
    Under,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Side::Home => "Home",
            Side::Away => "Away",
            Side::Over => "Over",
            Side::Under => "Under",
        };
        f.write_str(name)
    }
}

/// Output of one estimator run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidencePick {
    pub side: Side,
    /// Probability of the chosen side, 0-100, two decimals
    pub confidence: f64,
    /// Raw estimate for the reference side (home win, home cover, over), 0-1
    pub probability: f64,
}

/// A quoted market for one game, already validated by the provider adapter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "market", rename_all = "lowercase")]
pub enum MarketQuote {
    H2h { home_odds: i32, away_odds: i32 },
    Spreads { home_line: f64 },
    Totals { line: f64 },
}

impl MarketQuote {
    pub fn kind(&self) -> MarketKind {
        match self {
            MarketQuote::H2h { .. } => MarketKind::Moneyline,
            MarketQuote::Spreads { .. } => MarketKind::Spread,
            MarketQuote::Totals { .. } => MarketKind::Total,
        }
    }
}

/// One scheduled game with whatever markets the provider quoted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameOdds {
    pub home_team: String,
    pub away_team: String,
    pub commence_time: DateTime<Utc>,
    pub markets: Vec<MarketQuote>,
}

impl GameOdds {
    /// Moneyline odds as (home, away)
    pub fn moneyline(&self) -> Option<(i32, i32)> {
        self.markets.iter().find_map(|m| match m {
            MarketQuote::H2h {
                home_odds,
                away_odds,
            } => Some((*home_odds, *away_odds)),
            _ => None,
        })
    }

    /// Home team spread line
    pub fn spread(&self) -> Option<f64> {
        self.markets.iter().find_map(|m| match m {
            MarketQuote::Spreads { home_line } => Some(*home_line),
            _ => None,
        })
    }

    /// Over/under line
    pub fn total(&self) -> Option<f64> {
        self.markets.iter().find_map(|m| match m {
            MarketQuote::Totals { line } => Some(*line),
            _ => None,
        })
    }
}

/// Grading state of one market on a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFlag {
    Win,
    Loss,
    Push,
    #[default]
    Pending,
}

impl ResultFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultFlag::Win => "win",
            ResultFlag::Loss => "loss",
            ResultFlag::Push => "push",
            ResultFlag::Pending => "pending",
        }
    }

    /// Parse a stored flag; blank cells read as pending
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "win" => Some(ResultFlag::Win),
            "loss" => Some(ResultFlag::Loss),
            "push" => Some(ResultFlag::Push),
            "pending" | "" => Some(ResultFlag::Pending),
            _ => None,
        }
    }

    /// Whether this flag counts toward an accuracy denominator
    pub fn is_decided(&self) -> bool {
        matches!(self, ResultFlag::Win | ResultFlag::Loss)
    }
}

impl fmt::Display for ResultFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result flags for all three markets of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultFlags {
    pub moneyline: ResultFlag,
    pub spread: ResultFlag,
    pub total: ResultFlag,
}

impl ResultFlags {
    pub fn get(&self, market: MarketKind) -> ResultFlag {
        match market {
            MarketKind::Moneyline => self.moneyline,
            MarketKind::Spread => self.spread,
            MarketKind::Total => self.total,
        }
    }

    pub fn is_pending(&self) -> bool {
        MarketKind::ALL
            .iter()
            .all(|m| self.get(*m) == ResultFlag::Pending)
    }
}

/// A pick on a market that carries a line (spread or total)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinePick {
    pub pick: ConfidencePick,
    pub line: f64,
}

/// One persisted prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub moneyline: ConfidencePick,
    pub spread: LinePick,
    pub total: LinePick,
    pub results: ResultFlags,
}

impl PredictionRecord {
    /// Display label for a side: team name for Home/Away, the side itself otherwise
    pub fn side_label(&self, side: Side) -> String {
        match side {
            Side::Home => self.home_team.clone(),
            Side::Away => self.away_team.clone(),
            other => other.to_string(),
        }
    }

    /// Format the record as a readable line
    pub fn format(&self) -> String {
        // Spread lines are stored from the home side
        let spread_line = match self.spread.pick.side {
            Side::Away => -self.spread.line,
            _ => self.spread.line,
        };
        format!(
            "{} | {} @ {} | ML: {} ({:.2}%) [{}] | Spread: {} {:+.1} ({:.2}%) [{}] | Total: {} {:.1} ({:.2}%) [{}]",
            self.date,
            self.away_team,
            self.home_team,
            self.side_label(self.moneyline.side),
            self.moneyline.confidence,
            self.results.moneyline,
            self.side_label(self.spread.pick.side),
            spread_line,
            self.spread.pick.confidence,
            self.results.spread,
            self.total.pick.side,
            self.total.line,
            self.total.pick.confidence,
            self.results.total,
        )
    }
}

/// Final result of a game, supplied by whoever grades the log
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub winner: Side,
    /// Home score minus away score
    pub margin: f64,
    pub total: f64,
}

impl GameOutcome {
    pub fn from_scores(home_score: u32, away_score: u32) -> Self {
        let margin = home_score as f64 - away_score as f64;
        Self {
            winner: if margin >= 0.0 { Side::Home } else { Side::Away },
            margin,
            total: home_score as f64 + away_score as f64,
        }
    }
}
