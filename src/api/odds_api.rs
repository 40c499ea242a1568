use crate::api::error::{decode_json, ApiError};
use crate::models::{OverUnder, PropLine};
use crate::utils::edge::clean_player_name;
use crate::utils::odds::decimal_to_american;
use serde::Deserialize;
use tracing::{debug, warn};

const ODDS_API_BASE_URL: &str = "https://api.the-odds-api.com/v4";
const SERVICE: &str = "Odds API";

pub const NBA_SPORT_KEY: &str = "basketball_nba";

/// Player-prop markets requested when none are configured
pub const DEFAULT_PLAYER_MARKETS: &[&str] = &[
    "player_points",
    "player_points_alternate",
    "player_rebounds",
    "player_rebounds_alternate",
    "player_assists",
    "player_assists_alternate",
    "player_threes",
    "player_threes_alternate",
    "player_blocks",
    "player_blocks_alternate",
    "player_steals",
    "player_steals_alternate",
    "player_turnovers",
    "player_points_rebounds_assists",
    "player_points_rebounds",
    "player_points_assists",
    "player_rebounds_assists",
];

/// Event listing entry from The Odds API; only the id is used
#[derive(Debug, Deserialize)]
struct OddsApiGame {
    id: String,
}

/// Per-event odds response from The Odds API
#[derive(Debug, Deserialize)]
struct OddsApiEvent {
    id: String,
    #[serde(default)]
    bookmakers: Vec<OddsApiBookmaker>,
}

/// Bookmaker data from The Odds API
#[derive(Debug, Deserialize)]
struct OddsApiBookmaker {
    key: String,
    #[serde(default)]
    markets: Vec<OddsApiMarket>,
}

/// Market data (e.g., player_points) from The Odds API
#[derive(Debug, Deserialize)]
struct OddsApiMarket {
    key: String,
    #[serde(default)]
    outcomes: Vec<OddsApiOutcome>,
}

/// Outcome data for one side of a player line
/// `name` is Over/Under, `description` is the player
#[derive(Debug, Deserialize)]
struct OddsApiOutcome {
    name: String,
    description: Option<String>,
    price: f64,
    point: Option<f64>,
}

/// Which markets, books and regions to request player props for
#[derive(Debug, Clone)]
pub struct PropQuery {
    pub markets: Vec<String>,
    pub bookmakers: Vec<String>,
    pub regions: String,
}

impl Default for PropQuery {
    fn default() -> Self {
        Self {
            markets: DEFAULT_PLAYER_MARKETS.iter().map(|m| m.to_string()).collect(),
            bookmakers: vec!["draftkings".to_string()],
            regions: "us".to_string(),
        }
    }
}

/// Request quota reported by The Odds API response headers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiUsage {
    pub remaining: Option<u32>,
    pub used: Option<u32>,
}

pub struct OddsApiClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OddsApiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, ODDS_API_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the ids of live and upcoming events for a sport
    pub async fn fetch_game_ids(&self, sport: &str) -> Result<Vec<String>, ApiError> {
        let url = format!("{}/sports/{}/odds", self.base_url, sport);

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("regions", "us"),
                ("markets", "h2h"),
                ("dateFormat", "iso"),
                ("oddsFormat", "decimal"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::from_response(SERVICE, response).await);
        }

        let games: Vec<OddsApiGame> = decode_json(SERVICE, response).await?;
        debug!(count = games.len(), sport, "fetched event ids");
        Ok(games.into_iter().map(|g| g.id).collect())
    }

    /// Fetch player-prop lines for each event
    /// Events that fail are logged and skipped so one bad event doesn't drop the slate
    pub async fn fetch_player_props(
        &self,
        sport: &str,
        game_ids: &[String],
        query: &PropQuery,
    ) -> Result<Vec<PropLine>, ApiError> {
        let mut lines = Vec::new();

        for game_id in game_ids {
            match self.fetch_event_props(sport, game_id, query).await {
                Ok(mut event_lines) => lines.append(&mut event_lines),
                Err(e) => {
                    warn!(event_id = %game_id, error = %e, "failed to fetch player props");
                    continue;
                }
            }
        }

        Ok(lines)
    }

    async fn fetch_event_props(
        &self,
        sport: &str,
        game_id: &str,
        query: &PropQuery,
    ) -> Result<Vec<PropLine>, ApiError> {
        let url = format!("{}/sports/{}/events/{}/odds", self.base_url, sport, game_id);
        let markets = query.markets.join(",");
        let bookmakers = query.bookmakers.join(",");

        let mut params = vec![
            ("apiKey", self.api_key.as_str()),
            ("regions", query.regions.as_str()),
            ("markets", markets.as_str()),
            ("dateFormat", "iso"),
            ("oddsFormat", "decimal"),
        ];
        if !bookmakers.is_empty() {
            params.push(("bookmakers", bookmakers.as_str()));
        }

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::from_response(SERVICE, response).await);
        }

        let event: OddsApiEvent = decode_json(SERVICE, response).await?;
        Ok(flatten_event(event))
    }

    /// Check how many API requests you have remaining
    pub async fn check_usage(&self) -> Result<ApiUsage, ApiError> {
        let url = format!("{}/sports", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::from_response(SERVICE, response).await);
        }

        let header_u32 = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<f64>().ok())
                .map(|v| v as u32)
        };

        Ok(ApiUsage {
            remaining: header_u32("x-requests-remaining"),
            used: header_u32("x-requests-used"),
        })
    }
}

/// Flatten bookmaker -> market -> outcome into prop lines
/// Outcomes without a threshold, a player, or a recognisable side are dropped
fn flatten_event(event: OddsApiEvent) -> Vec<PropLine> {
    let mut lines = Vec::new();

    for bookmaker in event.bookmakers {
        for market in bookmaker.markets {
            for outcome in market.outcomes {
                let (Some(threshold), Some(player)) = (outcome.point, outcome.description) else {
                    continue;
                };
                let Ok(side) = outcome.name.parse::<OverUnder>() else {
                    continue;
                };

                lines.push(PropLine {
                    event_id: event.id.clone(),
                    bookmaker: bookmaker.key.clone(),
                    market: market.key.clone(),
                    side,
                    player_name: clean_player_name(&player),
                    threshold,
                    decimal_odds: outcome.price,
                    american_odds: decimal_to_american(outcome.price),
                });
            }
        }
    }

    lines
}
