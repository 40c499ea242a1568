use super::{HtmlTemplate, SharedData};
use crate::models::ScheduledGame;
use crate::utils::edge::EdgeBet;
use crate::utils::filters::{available_bet_types, available_teams, default_bet_types, BetFilter};
use crate::utils::leaderboard::{create_leaderboards, Leaderboard, DEFAULT_LEADERBOARD_CATEGORIES};
use crate::utils::parlay::{optimize_parlays, Parlay, ParlayConfig, ParlayRanking, ParlayStrategy};
use crate::utils::zscore::rank_by_z_score;
use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use tracing::error;

const TOP_BETS_ON_HOME: usize = 5;
const DEFAULT_LEADERBOARD_SIZE: usize = 10;

// Custom filters for formatting
mod filters {
    pub fn format_odds<T: std::fmt::Display>(odds: &T) -> ::askama::Result<String> {
        Ok(format!("{:+}", odds))
    }

    pub fn format_percent(value: &f64) -> ::askama::Result<String> {
        Ok(format!("{:.1}%", value * 100.0))
    }

    pub fn format_signed(value: &f64) -> ::askama::Result<String> {
        Ok(format!("{:+.2}", value))
    }

    pub fn format_stat(value: &f64) -> ::askama::Result<String> {
        Ok(format!("{:.1}", value))
    }
}

/// An `<option>` in a filter form
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    fn list(values: &[String], selected: &str) -> Vec<Self> {
        values
            .iter()
            .map(|v| SelectOption {
                value: v.clone(),
                label: v.clone(),
                selected: v == selected,
            })
            .collect()
    }
}

/// Display-ready schedule row
pub struct GameRow {
    pub gid: String,
    pub matchup: String,
    pub start_time: String,
    pub score: String,
    pub records: String,
}

impl From<&ScheduledGame> for GameRow {
    fn from(game: &ScheduledGame) -> Self {
        let score = match (game.away_score, game.home_score) {
            (Some(away), Some(home)) => format!("{} - {}", away, home),
            _ => "-".to_string(),
        };
        let records = match (game.away_wins, game.home_wins) {
            (Some(away), Some(home)) => format!("{} / {} wins", away, home),
            _ => "-".to_string(),
        };

        GameRow {
            gid: game.gid.clone(),
            matchup: game.matchup(),
            start_time: game.start_time_display(),
            score,
            records,
        }
    }
}

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    active_page: String,
    date: String,
    game_count: usize,
    projection_count: usize,
    line_count: usize,
    bet_count: usize,
    positive_edge_count: usize,
    show_top_bets: bool,
    top_bets: Vec<EdgeBet>,
}

/// Bet filter controls shared by the edges and parlays pages
pub struct FilterForm {
    pub teams: Vec<SelectOption>,
    pub bet_types: Vec<SelectOption>,
    pub sides: Vec<SelectOption>,
    pub min_minutes: String,
    pub min_edge: String,
}

impl FilterForm {
    fn new(query: &EdgeQuery, bets: &[EdgeBet]) -> Self {
        let mut bet_types = vec!["all".to_string()];
        bet_types.extend(available_bet_types(bets));
        let sides = ["both", "over", "under"].map(String::from);

        FilterForm {
            teams: SelectOption::list(&available_teams(bets), query.team.as_deref().unwrap_or_default()),
            bet_types: SelectOption::list(&bet_types, query.bet_type.as_deref().unwrap_or_default()),
            sides: SelectOption::list(&sides, query.side.as_deref().unwrap_or("both")),
            min_minutes: query.min_minutes.clone().unwrap_or_default(),
            min_edge: query.min_edge.clone().unwrap_or_default(),
        }
    }
}

#[derive(Template)]
#[template(path = "edges.html")]
struct EdgesTemplate {
    active_page: String,
    bets: Vec<EdgeBet>,
    form: FilterForm,
}

#[derive(Template)]
#[template(path = "parlays.html")]
struct ParlaysTemplate {
    active_page: String,
    form: FilterForm,
    parlays: Vec<Parlay>,
    legs: usize,
    min_legs: usize,
    count: usize,
    strategies: Vec<SelectOption>,
    candidate_count: usize,
}

#[derive(Template)]
#[template(path = "leaderboards.html")]
struct LeaderboardsTemplate {
    active_page: String,
    top: usize,
    boards: Vec<Leaderboard>,
}

#[derive(Template)]
#[template(path = "games.html")]
struct GamesTemplate {
    active_page: String,
    games: Vec<GameRow>,
}

fn not_loaded() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "Data not loaded yet").into_response()
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, message).into_response()
}

/// Parse an optional query value, treating blanks as absent
fn parse_field<T: FromStr>(name: &str, value: &Option<String>) -> Result<Option<T>, String> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| format!("invalid value for {}: '{}'", name, v)),
    }
}

/// Filters accepted by `/edges` and `/api/edges`
#[derive(Debug, Default, Deserialize)]
pub struct EdgeQuery {
    pub team: Option<String>,
    /// A market key, `all`, or empty for the default set
    pub bet_type: Option<String>,
    pub side: Option<String>,
    pub min_minutes: Option<String>,
    pub min_edge: Option<String>,
    pub min_odds: Option<String>,
}

impl EdgeQuery {
    pub fn to_filter(&self, bets: &[EdgeBet]) -> Result<BetFilter, String> {
        let mut filter = BetFilter::default();

        if let Some(team) = self.team.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            filter.teams = vec![team.to_string()];
        }

        filter.bet_types = match self.bet_type.as_deref().map(str::trim) {
            None | Some("") => default_bet_types(&available_bet_types(bets)),
            Some("all") => Vec::new(),
            Some(bet_type) => vec![bet_type.to_string()],
        };

        filter.side = self.side.as_deref().unwrap_or_default().parse()?;
        filter.min_minutes = parse_field("min_minutes", &self.min_minutes)?;
        filter.min_edge = parse_field("min_edge", &self.min_edge)?;
        if let Some(odds) = parse_field("min_odds", &self.min_odds)? {
            filter.min_american_odds = Some(odds);
        }

        Ok(filter)
    }
}

/// Parlay settings plus the same candidate filters `/edges` takes
#[derive(Debug, Default, Deserialize)]
pub struct ParlayQuery {
    pub legs: Option<String>,
    pub min_legs: Option<String>,
    pub count: Option<String>,
    pub strategy: Option<String>,
    pub ranking: Option<String>,
    pub team: Option<String>,
    pub bet_type: Option<String>,
    pub side: Option<String>,
    pub min_minutes: Option<String>,
    pub min_edge: Option<String>,
}

impl ParlayQuery {
    pub fn edge_query(&self) -> EdgeQuery {
        EdgeQuery {
            team: self.team.clone(),
            bet_type: self.bet_type.clone(),
            side: self.side.clone(),
            min_minutes: self.min_minutes.clone(),
            min_edge: self.min_edge.clone(),
            min_odds: None,
        }
    }

    pub fn to_config(&self) -> Result<ParlayConfig, String> {
        let defaults = ParlayConfig::default();
        let legs = parse_field("legs", &self.legs)?.unwrap_or(defaults.max_legs);
        let count = parse_field("count", &self.count)?.unwrap_or(defaults.num_parlays);

        let mut config = ParlayConfig::new(legs, count);
        if let Some(min_legs) = parse_field("min_legs", &self.min_legs)? {
            config.min_legs = min_legs;
        }
        if let Some(strategy) = parse_field::<ParlayStrategy>("strategy", &self.strategy)? {
            config.strategy = strategy;
        }
        if let Some(ranking) = parse_field::<ParlayRanking>("ranking", &self.ranking)? {
            config.ranking = ranking;
        }
        Ok(config)
    }
}

pub async fn home(data: State<SharedData>) -> impl IntoResponse {
    let props_data = data.read().await;

    let Some(data) = props_data.as_ref() else {
        return not_loaded();
    };

    let mut top_bets = data.edge_bets.clone();
    rank_by_z_score(&mut top_bets);
    top_bets.truncate(TOP_BETS_ON_HOME);

    let template = HomeTemplate {
        active_page: "home".to_string(),
        date: data.date.to_string(),
        game_count: data.games.len(),
        projection_count: data.projections.len(),
        line_count: data.prop_lines.len(),
        bet_count: data.edge_bets.len(),
        positive_edge_count: data.edge_bets.iter().filter(|b| b.edge > 0.0).count(),
        show_top_bets: !top_bets.is_empty(),
        top_bets,
    };

    HtmlTemplate(template).into_response()
}

pub async fn edges(data: State<SharedData>, Query(query): Query<EdgeQuery>) -> impl IntoResponse {
    let props_data = data.read().await;

    let Some(data) = props_data.as_ref() else {
        return not_loaded();
    };

    let filter = match query.to_filter(&data.edge_bets) {
        Ok(filter) => filter,
        Err(message) => return bad_request(message),
    };

    let template = EdgesTemplate {
        active_page: "edges".to_string(),
        bets: filter.apply(&data.edge_bets),
        form: FilterForm::new(&query, &data.edge_bets),
    };

    HtmlTemplate(template).into_response()
}

pub async fn parlays(data: State<SharedData>, Query(query): Query<ParlayQuery>) -> impl IntoResponse {
    let config = match query.to_config() {
        Ok(config) => config,
        Err(message) => return bad_request(message),
    };
    let edge_query = query.edge_query();

    let (candidates, form) = {
        let props_data = data.read().await;
        let Some(data) = props_data.as_ref() else {
            return not_loaded();
        };
        let filter = match edge_query.to_filter(&data.edge_bets) {
            Ok(filter) => filter,
            Err(message) => return bad_request(message),
        };
        (
            filter.apply(&data.edge_bets),
            FilterForm::new(&edge_query, &data.edge_bets),
        )
    };
    let candidate_count = candidates.len();

    // Enumeration is CPU-bound; keep it off the async workers
    let job_config = config.clone();
    let result =
        tokio::task::spawn_blocking(move || optimize_parlays(&candidates, &job_config)).await;

    let parlays = match result {
        Ok(Ok(parlays)) => parlays,
        Ok(Err(e)) => return bad_request(e.to_string()),
        Err(e) => {
            error!(error = %e, "parlay optimization task failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Parlay optimization failed").into_response();
        }
    };

    let strategies = [
        ParlayStrategy::Balanced,
        ParlayStrategy::Conservative,
        ParlayStrategy::HighRisk,
    ]
    .map(|s| s.to_string());

    let template = ParlaysTemplate {
        active_page: "parlays".to_string(),
        form,
        parlays,
        legs: config.max_legs,
        min_legs: config.min_legs,
        count: config.num_parlays,
        strategies: SelectOption::list(&strategies, &config.strategy.to_string()),
        candidate_count,
    };

    HtmlTemplate(template).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub top: Option<String>,
}

pub async fn leaderboards(
    data: State<SharedData>,
    Query(query): Query<LeaderboardQuery>,
) -> impl IntoResponse {
    let props_data = data.read().await;

    let Some(data) = props_data.as_ref() else {
        return not_loaded();
    };

    let top = match parse_field("top", &query.top) {
        Ok(top) => top.unwrap_or(DEFAULT_LEADERBOARD_SIZE),
        Err(message) => return bad_request(message),
    };

    let template = LeaderboardsTemplate {
        active_page: "leaderboards".to_string(),
        top,
        boards: create_leaderboards(&data.projections, &DEFAULT_LEADERBOARD_CATEGORIES, top),
    };

    HtmlTemplate(template).into_response()
}

pub async fn games(data: State<SharedData>) -> impl IntoResponse {
    let props_data = data.read().await;

    let Some(data) = props_data.as_ref() else {
        return not_loaded();
    };

    let template = GamesTemplate {
        active_page: "games".to_string(),
        games: data.games.iter().map(GameRow::from).collect(),
    };

    HtmlTemplate(template).into_response()
}

pub async fn api_edges(data: State<SharedData>, Query(query): Query<EdgeQuery>) -> Response {
    let props_data = data.read().await;

    let Some(data) = props_data.as_ref() else {
        return not_loaded();
    };

    match query.to_filter(&data.edge_bets) {
        Ok(filter) => Json(filter.apply(&data.edge_bets)).into_response(),
        Err(message) => bad_request(message),
    }
}

pub async fn health(data: State<SharedData>) -> impl IntoResponse {
    let loaded = data.read().await.is_some();
    Json(json!({ "status": "ok", "data_loaded": loaded }))
}
