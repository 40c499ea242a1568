use crate::api::error::{decode_json, ApiError};
use crate::models::{PlayerProjection, ScheduledGame, Slate};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

const AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword";
const SIM_BASE_URL: &str = "https://basketball-sim.appspot.com";
const SERVICE: &str = "projections API";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub const NBA_SPORT: &str = "nba";
pub const FANDUEL_SITE: &str = "fd";

/// Bearer token returned by the identity provider's password sign-in
#[derive(Clone)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SignInErrorResponse {
    error: SignInError,
}

#[derive(Debug, Deserialize)]
struct SignInError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SlatesResponse {
    #[serde(default)]
    slates: Vec<RawSlate>,
}

#[derive(Debug, Deserialize)]
struct RawSlate {
    id: Value,
    site: Option<String>,
    name: Option<String>,
    game_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GamesResponse {
    #[serde(default)]
    games: Vec<RawGame>,
}

#[derive(Debug, Deserialize)]
struct RawGame {
    gid: Value,
    #[serde(default)]
    home_team: String,
    #[serde(default)]
    away_team: String,
    home_score: Option<f64>,
    away_score: Option<f64>,
    home_wins: Option<f64>,
    away_wins: Option<f64>,
    start_time_js: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PlayersResponse {
    #[serde(default)]
    players: Vec<RawPlayer>,
}

/// Player projection as the provider sends it; every stat may be missing or null
#[derive(Debug, Deserialize)]
struct RawPlayer {
    name: String,
    position: Option<String>,
    team: Option<String>,
    opp: Option<String>,
    minutes: Option<f64>,
    possessions: Option<f64>,
    fd_points: Option<f64>,
    fd_std: Option<f64>,
    fd_25_percentile: Option<f64>,
    fd_50_percentile: Option<f64>,
    fd_75_percentile: Option<f64>,
    fd_85_percentile: Option<f64>,
    fd_95_percentile: Option<f64>,
    fd_99_percentile: Option<f64>,
    points: Option<f64>,
    assists: Option<f64>,
    rebounds: Option<f64>,
    offensive_rebounds: Option<f64>,
    defensive_rebounds: Option<f64>,
    blocks: Option<f64>,
    steals: Option<f64>,
    fouls: Option<f64>,
    turnovers: Option<f64>,
    two_pt_attempts: Option<f64>,
    two_pt_fg: Option<f64>,
    three_pt_attempts: Option<f64>,
    three_pt_fg: Option<f64>,
    free_throw_attempts: Option<f64>,
    free_throws_made: Option<f64>,
    double_doubles: Option<f64>,
    triple_doubles: Option<f64>,
    injury: Option<String>,
    confirmed: Option<bool>,
    gid: Option<Value>,
}

impl RawPlayer {
    fn into_projection(self, slate_id: &str) -> PlayerProjection {
        PlayerProjection {
            player_name: self.name,
            position: self.position.unwrap_or_default(),
            team: self.team.unwrap_or_default(),
            opp: self.opp.unwrap_or_default(),
            minutes: self.minutes.unwrap_or_default(),
            possessions: self.possessions.unwrap_or_default(),
            fd_points: self.fd_points.unwrap_or_default(),
            fd_std: self.fd_std.unwrap_or_default(),
            fd_25_percentile: self.fd_25_percentile.unwrap_or_default(),
            fd_50_percentile: self.fd_50_percentile.unwrap_or_default(),
            fd_75_percentile: self.fd_75_percentile.unwrap_or_default(),
            fd_85_percentile: self.fd_85_percentile.unwrap_or_default(),
            fd_95_percentile: self.fd_95_percentile.unwrap_or_default(),
            fd_99_percentile: self.fd_99_percentile.unwrap_or_default(),
            points: self.points.unwrap_or_default(),
            assists: self.assists.unwrap_or_default(),
            rebounds: self.rebounds.unwrap_or_default(),
            offensive_rebounds: self.offensive_rebounds.unwrap_or_default(),
            defensive_rebounds: self.defensive_rebounds.unwrap_or_default(),
            blocks: self.blocks.unwrap_or_default(),
            steals: self.steals.unwrap_or_default(),
            fouls: self.fouls.unwrap_or_default(),
            turnovers: self.turnovers.unwrap_or_default(),
            two_pt_attempts: self.two_pt_attempts.unwrap_or_default(),
            two_pt_fg: self.two_pt_fg.unwrap_or_default(),
            three_pt_attempts: self.three_pt_attempts.unwrap_or_default(),
            three_pt_fg: self.three_pt_fg.unwrap_or_default(),
            free_throw_attempts: self.free_throw_attempts.unwrap_or_default(),
            free_throws_made: self.free_throws_made.unwrap_or_default(),
            double_doubles: self.double_doubles.unwrap_or_default(),
            triple_doubles: self.triple_doubles.unwrap_or_default(),
            injury: self.injury.filter(|i| !i.trim().is_empty()),
            confirmed: self.confirmed.unwrap_or(false),
            gid: self.gid.as_ref().and_then(value_to_id),
            slate_id: Some(slate_id.to_string()),
        }
    }
}

impl RawGame {
    fn into_game(self) -> Option<ScheduledGame> {
        let gid = value_to_id(&self.gid)?;
        let start_time = self
            .start_time_js
            .and_then(DateTime::<Utc>::from_timestamp_millis);

        Some(ScheduledGame {
            gid,
            home_team: self.home_team,
            away_team: self.away_team,
            home_score: self.home_score.map(|s| s as u32),
            away_score: self.away_score.map(|s| s as u32),
            home_wins: self.home_wins.map(|w| w as u32),
            away_wins: self.away_wins.map(|w| w as u32),
            start_time,
        })
    }
}

/// Ids come back as strings on some endpoints and numbers on others
fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub struct ProjectionsClient {
    web_api_key: String,
    auth_url: String,
    sim_base_url: String,
    client: reqwest::Client,
}

impl ProjectionsClient {
    pub fn new(web_api_key: String) -> Self {
        Self::with_base_urls(web_api_key, AUTH_URL.to_string(), SIM_BASE_URL.to_string())
    }

    pub fn with_base_urls(web_api_key: String, auth_url: String, sim_base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self {
            web_api_key,
            auth_url,
            sim_base_url,
            client,
        }
    }

    /// Sign in with email and password and return the session's bearer token
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<AuthToken, ApiError> {
        let response = self
            .client
            .post(&self.auth_url)
            .query(&[("key", self.web_api_key.as_str())])
            .json(&json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<SignInErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("sign-in returned {}", status));
            return Err(ApiError::Auth(message));
        }

        let sign_in: SignInResponse = decode_json(SERVICE, response).await?;
        let token = sign_in
            .id_token
            .ok_or_else(|| ApiError::Auth("sign-in response carried no idToken".to_string()))?;

        info!("authenticated with projections provider");
        Ok(AuthToken(token))
    }

    /// List the slates on a date, keeping only those for the given DFS site
    pub async fn fetch_slates(
        &self,
        token: &AuthToken,
        date: NaiveDate,
        sport: &str,
        site: &str,
    ) -> Result<Vec<Slate>, ApiError> {
        let url = format!("{}/_ah/api/nba/v1/slates", self.sim_base_url);
        let date = date.format("%Y-%m-%d").to_string();

        let response = self
            .client
            .get(&url)
            .header("Authorization", token.bearer())
            .header("Accept", "application/json")
            .query(&[("date", date.as_str()), ("sport", sport)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::from_response(SERVICE, response).await);
        }

        let slates: SlatesResponse = decode_json(SERVICE, response).await?;
        let slates = filter_slates(slates.slates, site);
        debug!(count = slates.len(), site, "fetched slates");
        Ok(slates)
    }

    /// Fetch the game schedule for each slate, one entry per game id
    pub async fn fetch_games(
        &self,
        token: &AuthToken,
        date: NaiveDate,
        sport: &str,
        site: &str,
        slates: &[Slate],
    ) -> Result<Vec<ScheduledGame>, ApiError> {
        let url = format!("{}/_ah/api/nba/v1/games", self.sim_base_url);
        let date = date.format("%Y-%m-%d").to_string();
        let mut games = Vec::new();

        for slate in slates {
            let result = async {
                let response = self
                    .client
                    .get(&url)
                    .header("Authorization", token.bearer())
                    .header("Accept", "application/json")
                    .query(&[
                        ("date", date.as_str()),
                        ("site", site),
                        ("slate", slate.id.as_str()),
                        ("sport", sport),
                    ])
                    .send()
                    .await?;

                if !response.status().is_success() {
                    return Err(ApiError::from_response(SERVICE, response).await);
                }

                decode_json::<GamesResponse>(SERVICE, response).await
            }
            .await;

            match result {
                Ok(body) => games.extend(body.games.into_iter().filter_map(RawGame::into_game)),
                Err(e) => {
                    warn!(slate = %slate.id, error = %e, "failed to fetch games for slate");
                    continue;
                }
            }
        }

        Ok(dedup_games(games))
    }

    /// Fetch player projections for each slate, one entry per player name
    pub async fn fetch_player_projections(
        &self,
        token: &AuthToken,
        date: NaiveDate,
        sport: &str,
        site: &str,
        slates: &[Slate],
    ) -> Result<Vec<PlayerProjection>, ApiError> {
        let url = format!("{}/endpoints/get_player_projections", self.sim_base_url);
        let date = date.format("%Y-%m-%d").to_string();
        let mut projections = Vec::new();

        for slate in slates {
            let payload = json!({
                "conditionals": [],
                "date": date,
                "percentile": "0",
                "site": site,
                "slate": slate.id,
                "sport": sport,
            });

            let result = async {
                let response = self
                    .client
                    .post(&url)
                    .header("Authorization", token.bearer())
                    .json(&payload)
                    .send()
                    .await?;

                if !response.status().is_success() {
                    return Err(ApiError::from_response(SERVICE, response).await);
                }

                decode_json::<PlayersResponse>(SERVICE, response).await
            }
            .await;

            match result {
                Ok(body) => projections.extend(
                    body.players
                        .into_iter()
                        .map(|p| p.into_projection(&slate.id)),
                ),
                Err(e) => {
                    warn!(slate = %slate.id, error = %e, "failed to fetch projections for slate");
                    continue;
                }
            }
        }

        let projections = dedup_projections(projections);
        info!(count = projections.len(), "fetched player projections");
        Ok(projections)
    }
}

fn filter_slates(raw: Vec<RawSlate>, site: &str) -> Vec<Slate> {
    raw.into_iter()
        .filter(|s| {
            s.site
                .as_deref()
                .is_some_and(|slate_site| slate_site.eq_ignore_ascii_case(site))
        })
        .filter_map(|s| {
            Some(Slate {
                id: value_to_id(&s.id)?,
                site: s.site.unwrap_or_default(),
                name: s.name,
                game_count: s.game_count,
            })
        })
        .collect()
}

/// Keep the first occurrence of each game id
pub fn dedup_games(games: Vec<ScheduledGame>) -> Vec<ScheduledGame> {
    let mut seen = HashSet::new();
    games
        .into_iter()
        .filter(|g| seen.insert(g.gid.clone()))
        .collect()
}

/// Keep the first occurrence of each player name
pub fn dedup_projections(projections: Vec<PlayerProjection>) -> Vec<PlayerProjection> {
    let mut seen = HashSet::new();
    projections
        .into_iter()
        .filter(|p| seen.insert(p.player_name.clone()))
        .collect()
}
