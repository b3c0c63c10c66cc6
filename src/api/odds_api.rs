use crate::models::{GameOdds, MarketKind, MarketQuote};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

const ODDS_API_BASE_URL: &str = "https://api.the-odds-api.com/v4";
const SPORT_KEY: &str = "basketball_nba";

/// Response from The Odds API for a single game
#[derive(Debug, Deserialize)]
pub struct OddsApiGame {
    id: String,
    commence_time: DateTime<Utc>,
    home_team: String,
    away_team: String,
    #[serde(default)]
    bookmakers: Vec<OddsApiBookmaker>,
}

/// Bookmaker data from The Odds API
#[derive(Debug, Deserialize)]
struct OddsApiBookmaker {
    #[serde(default)]
    markets: Vec<OddsApiMarket>,
}

/// Market data (h2h, spreads, totals) from The Odds API
#[derive(Debug, Deserialize)]
struct OddsApiMarket {
    key: String,
    outcomes: Vec<OddsApiOutcome>,
}

/// Outcome data for a team or an over/under side
#[derive(Debug, Deserialize)]
struct OddsApiOutcome {
    name: String,
    price: f64,
    #[serde(default)]
    point: Option<f64>,
}

impl OddsApiGame {
    fn market(&self, kind: MarketKind) -> Option<&OddsApiMarket> {
        // Only the first listed bookmaker is used
        self.bookmakers
            .first()?
            .markets
            .iter()
            .find(|m| m.key == kind.provider_key())
    }

    fn outcome<'a>(market: &'a OddsApiMarket, name: &str) -> Option<&'a OddsApiOutcome> {
        market.outcomes.iter().find(|o| o.name == name)
    }

    fn h2h(&self) -> Option<MarketQuote> {
        let market = self.market(MarketKind::Moneyline)?;
        let home = Self::outcome(market, &self.home_team)?;
        let away = Self::outcome(market, &self.away_team)?;
        Some(MarketQuote::H2h {
            home_odds: home.price.round() as i32,
            away_odds: away.price.round() as i32,
        })
    }

    fn spreads(&self) -> Option<MarketQuote> {
        let market = self.market(MarketKind::Spread)?;
        let home = Self::outcome(market, &self.home_team)?;
        Some(MarketQuote::Spreads {
            home_line: home.point?,
        })
    }

    fn totals(&self) -> Option<MarketQuote> {
        let market = self.market(MarketKind::Total)?;
        let over = Self::outcome(market, "Over")?;
        Some(MarketQuote::Totals { line: over.point? })
    }

    /// Convert the raw provider shape into typed markets.
    /// Markets the bookmaker does not quote are left out.
    pub fn into_game_odds(self) -> GameOdds {
        let markets = [self.h2h(), self.spreads(), self.totals()]
            .into_iter()
            .flatten()
            .collect();

        if self.bookmakers.is_empty() {
            warn!(game_id = %self.id, "no bookmakers quoted");
        }

        GameOdds {
            home_team: self.home_team,
            away_team: self.away_team,
            commence_time: self.commence_time,
            markets,
        }
    }
}

/// Parse a raw Odds API response body
pub fn parse_games(json: &str) -> Result<Vec<GameOdds>> {
    let api_games: Vec<OddsApiGame> =
        serde_json::from_str(json).context("Failed to parse Odds API response")?;
    Ok(api_games
        .into_iter()
        .map(OddsApiGame::into_game_odds)
        .collect())
}

pub struct OddsApiClient {
    api_key: String,
    client: reqwest::Client,
}

impl OddsApiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Fetch upcoming NBA games with moneyline, spread and total odds.
    /// Only games starting within the next 24 hours are returned.
    pub async fn fetch_games(&self) -> Result<Vec<GameOdds>> {
        let url = format!("{}/sports/{}/odds", ODDS_API_BASE_URL, SPORT_KEY);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("regions", "us"),
                ("markets", "h2h,spreads,totals"),
                ("oddsFormat", "american"),
            ])
            .send()
            .await
            .context("Failed to fetch odds from The Odds API")?;

        if !response.status().is_success() {
            anyhow::bail!("Odds API returned error: {}", response.status());
        }

        if let Some(remaining) = response.headers().get("x-requests-remaining") {
            info!(remaining = ?remaining, "odds api quota");
        }

        let body = response
            .text()
            .await
            .context("Failed to read Odds API response")?;
        let games = parse_games(&body)?;

        Ok(upcoming(games, Utc::now()))
    }
}

/// Keep games that have not started yet and start within 24 hours of `now`
pub fn upcoming(games: Vec<GameOdds>, now: DateTime<Utc>) -> Vec<GameOdds> {
    let horizon = now + chrono::Duration::hours(24);
    games
        .into_iter()
        .filter(|game| game.commence_time > now && game.commence_time <= horizon)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
      {
        "id": "g1",
        "sport_key": "basketball_nba",
        "commence_time": "2025-01-15T00:30:00Z",
        "home_team": "Boston Celtics",
        "away_team": "Miami Heat",
        "bookmakers": [
          {
            "key": "draftkings",
            "title": "DraftKings",
            "markets": [
              {"key": "h2h", "outcomes": [
                {"name": "Boston Celtics", "price": -180},
                {"name": "Miami Heat", "price": 160}
              ]},
              {"key": "spreads", "outcomes": [
                {"name": "Boston Celtics", "price": -110, "point": -6.5},
                {"name": "Miami Heat", "price": -110, "point": 6.5}
              ]},
              {"key": "totals", "outcomes": [
                {"name": "Over", "price": -110, "point": 215.5},
                {"name": "Under", "price": -110, "point": 215.5}
              ]}
            ]
          },
          {
            "key": "fanduel",
            "title": "FanDuel",
            "markets": [
              {"key": "h2h", "outcomes": [
                {"name": "Boston Celtics", "price": -250},
                {"name": "Miami Heat", "price": 200}
              ]}
            ]
          }
        ]
      },
      {
        "id": "g2",
        "commence_time": "2025-01-15T01:00:00Z",
        "home_team": "Utah Jazz",
        "away_team": "Denver Nuggets",
        "bookmakers": [
          {
            "key": "draftkings",
            "title": "DraftKings",
            "markets": [
              {"key": "h2h", "outcomes": [
                {"name": "Utah Jazz", "price": 320},
                {"name": "Denver Nuggets", "price": -400}
              ]}
            ]
          }
        ]
      },
      {
        "id": "g3",
        "commence_time": "2025-01-15T02:00:00Z",
        "home_team": "Phoenix Suns",
        "away_team": "Dallas Mavericks",
        "bookmakers": []
      }
    ]"#;

    #[test]
    fn test_parse_games_uses_first_bookmaker() {
        let games = parse_games(SAMPLE).unwrap();
        assert_eq!(games.len(), 3);

        let celtics = &games[0];
        assert_eq!(celtics.moneyline(), Some((-180, 160)));
        assert_eq!(celtics.spread(), Some(-6.5));
        assert_eq!(celtics.total(), Some(215.5));
    }

    #[test]
    fn test_parse_games_keeps_partial_markets() {
        let games = parse_games(SAMPLE).unwrap();

        let jazz = &games[1];
        assert_eq!(jazz.moneyline(), Some((320, -400)));
        assert_eq!(jazz.spread(), None);
        assert_eq!(jazz.total(), None);

        assert!(games[2].markets.is_empty());
    }

    #[test]
    fn test_parse_games_rejects_garbage() {
        assert!(parse_games("{not json").is_err());
    }

    #[test]
    fn test_upcoming_drops_started_and_distant_games() {
        let games = parse_games(SAMPLE).unwrap();
        // g1 tips at 00:30, g2 at 01:00, g3 at 02:00
        let now = "2025-01-15T00:45:00Z".parse::<DateTime<Utc>>().unwrap();
        let kept = upcoming(games, now);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].home_team, "Utah Jazz");

        let mut later = parse_games(SAMPLE).unwrap();
        later[2].commence_time = now + chrono::Duration::hours(25);
        let kept = upcoming(later, now);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].home_team, "Utah Jazz");
    }

    #[tokio::test]
    #[ignore]
    async fn test_fetch_games() {
        dotenv::dotenv().ok();
        let api_key = std::env::var("ODDS_API_KEY").expect("ODDS_API_KEY not set");
        let client = OddsApiClient::new(api_key);

        let games = client.fetch_games().await.unwrap();
        assert!(games.iter().all(|g| !g.home_team.is_empty()));
    }
}
