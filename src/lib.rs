pub mod api;
pub mod config;
pub mod dashboard;
pub mod models;
pub mod utils;

pub use api::*;
pub use config::Settings;
pub use models::*;
pub use utils::*;

use anyhow::{Context, Result};
use api::odds_api::{OddsApiClient, NBA_SPORT_KEY};
use api::projections_api::{ProjectionsClient, NBA_SPORT};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utils::data::{load_from_cache, save_to_cache};
use utils::edge::{merge_projections_and_odds, EdgeBet};
use utils::zscore::{apply_composite_z_scores, rank_by_z_score};

/// Everything the projections provider returned for one date
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectionSnapshot {
    pub slates: Vec<Slate>,
    pub games: Vec<ScheduledGame>,
    pub projections: Vec<PlayerProjection>,
}

/// All the data we want to display on the web page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropsData {
    pub date: NaiveDate,
    pub games: Vec<ScheduledGame>,
    pub projections: Vec<PlayerProjection>,
    pub prop_lines: Vec<PropLine>,
    pub edge_bets: Vec<EdgeBet>,
}

/// Fetch slates, games and projections from the provider or cache
pub async fn fetch_projection_snapshot(
    settings: &Settings,
    date: NaiveDate,
    use_cache: bool,
) -> Result<ProjectionSnapshot> {
    let cache_file = settings.cache_file(&format!("projections_{}.json", date));

    if use_cache && cache_file.exists() {
        info!(path = %cache_file.display(), "loading projections from cache");
        return load_from_cache(&cache_file);
    }

    let creds = settings.require_projections()?;
    let client = ProjectionsClient::new(creds.web_api_key.clone());

    let token = client
        .authenticate(&creds.email, &creds.password)
        .await
        .context("Failed to sign in to projections provider")?;

    let slates = client
        .fetch_slates(&token, date, NBA_SPORT, &settings.site)
        .await
        .context("Failed to fetch slates")?;

    if slates.is_empty() {
        warn!(%date, site = %settings.site, "no slates found");
    }

    let games = client
        .fetch_games(&token, date, NBA_SPORT, &settings.site, &slates)
        .await
        .context("Failed to fetch games")?;

    let projections = client
        .fetch_player_projections(&token, date, NBA_SPORT, &settings.site, &slates)
        .await
        .context("Failed to fetch player projections")?;

    let snapshot = ProjectionSnapshot {
        slates,
        games,
        projections,
    };
    save_to_cache(&snapshot, &cache_file)?;
    Ok(snapshot)
}

/// Fetch player-prop lines for every upcoming NBA event from the odds API or cache
pub async fn fetch_prop_lines(
    settings: &Settings,
    date: NaiveDate,
    use_cache: bool,
) -> Result<Vec<PropLine>> {
    let cache_file = settings.cache_file(&format!("prop_lines_{}.json", date));

    if use_cache && cache_file.exists() {
        info!(path = %cache_file.display(), "loading prop lines from cache");
        return load_from_cache(&cache_file);
    }

    let client = OddsApiClient::new(settings.odds_api_key.clone());
    let game_ids = client
        .fetch_game_ids(NBA_SPORT_KEY)
        .await
        .context("Failed to fetch NBA events")?;

    let lines = client
        .fetch_player_props(NBA_SPORT_KEY, &game_ids, &settings.prop_query())
        .await
        .context("Failed to fetch player props")?;

    save_to_cache(&lines, &cache_file)?;
    Ok(lines)
}

/// Merge projections with prop lines and score every bet, best z-score first
pub fn build_edge_bets(projections: &[PlayerProjection], lines: &[PropLine]) -> Vec<EdgeBet> {
    let mut bets = merge_projections_and_odds(projections, lines);
    apply_composite_z_scores(&mut bets);
    rank_by_z_score(&mut bets);
    bets
}

/// Fetch all props data from APIs or cache
pub async fn fetch_all_props_data(
    settings: &Settings,
    date: NaiveDate,
    use_cache: bool,
) -> Result<PropsData> {
    let snapshot = fetch_projection_snapshot(settings, date, use_cache).await?;
    let prop_lines = fetch_prop_lines(settings, date, use_cache).await?;
    let edge_bets = build_edge_bets(&snapshot.projections, &prop_lines);

    info!(
        games = snapshot.games.len(),
        projections = snapshot.projections.len(),
        lines = prop_lines.len(),
        bets = edge_bets.len(),
        "props data ready"
    );

    Ok(PropsData {
        date,
        games: snapshot.games,
        projections: snapshot.projections,
        prop_lines,
        edge_bets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn settings(cache_dir: PathBuf) -> Settings {
        Settings {
            odds_api_key: "unused".into(),
            projections: None,
            bookmakers: vec!["draftkings".into()],
            site: "fd".into(),
            cache_dir,
        }
    }

    #[tokio::test]
    async fn test_fetch_all_props_data_from_cache() {
        let dir = std::env::temp_dir().join(format!("nba_props_edge_lib_{}", std::process::id()));
        let settings = settings(dir);
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();

        let snapshot = ProjectionSnapshot {
            slates: vec![],
            games: vec![],
            projections: vec![PlayerProjection {
                player_name: "Jalen Brunson".into(),
                team: "NYK".into(),
                opp: "BOS".into(),
                points: 27.0,
                fd_points: 45.0,
                fd_std: 9.0,
                ..Default::default()
            }],
        };
        let lines = vec![
            PropLine {
                event_id: "e1".into(),
                bookmaker: "draftkings".into(),
                market: "player_points".into(),
                side: OverUnder::Over,
                player_name: "Jalen Brunson".into(),
                threshold: 25.5,
                decimal_odds: 1.87,
                american_odds: -114,
            },
            PropLine {
                event_id: "e1".into(),
                bookmaker: "draftkings".into(),
                market: "player_points".into(),
                side: OverUnder::Under,
                player_name: "Jalen Brunson".into(),
                threshold: 25.5,
                decimal_odds: 1.95,
                american_odds: -105,
            },
        ];

        save_to_cache(&snapshot, settings.cache_file("projections_2025-01-15.json")).unwrap();
        save_to_cache(&lines, settings.cache_file("prop_lines_2025-01-15.json")).unwrap();

        let data = fetch_all_props_data(&settings, date, true).await.unwrap();
        assert_eq!(data.projections.len(), 1);
        assert_eq!(data.prop_lines.len(), 2);
        assert_eq!(data.edge_bets.len(), 2);
        assert_eq!(data.edge_bets[0].side, OverUnder::Over);
        assert!(data.edge_bets[0].z_score > data.edge_bets[1].z_score);
    }

    #[tokio::test]
    async fn test_projections_require_credentials_without_cache() {
        let settings = settings(std::env::temp_dir().join("nba_props_edge_no_cache"));
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert!(fetch_projection_snapshot(&settings, date, false).await.is_err());
    }
}
