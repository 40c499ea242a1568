use crate::models::{OverUnder, PlayerProjection, PropLine, ScheduledGame};
use crate::utils::edge::EdgeBet;
use crate::utils::parlay::Parlay;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

/// Save any serializable value to a JSON cache file
pub fn save_to_cache<T: Serialize + ?Sized>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value).context("Failed to serialize cache data")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write cache file {}", path.display()))?;
    Ok(())
}

/// Load a value from a JSON cache file
pub fn load_from_cache<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read cache file {}", path.display()))?;
    let value = serde_json::from_str(&json)
        .with_context(|| format!("Failed to deserialize cache file {}", path.display()))?;
    Ok(value)
}

fn write_csv<T: Serialize>(rows: impl IntoIterator<Item = T>, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
    for row in rows {
        writer.serialize(row).context("Failed to write CSV row")?;
    }
    writer.flush().context("Failed to flush CSV file")?;
    Ok(())
}

pub fn save_projections_to_csv(projections: &[PlayerProjection], path: impl AsRef<Path>) -> Result<()> {
    write_csv(projections, path.as_ref())
}

pub fn save_games_to_csv(games: &[ScheduledGame], path: impl AsRef<Path>) -> Result<()> {
    write_csv(games, path.as_ref())
}

pub fn save_prop_lines_to_csv(lines: &[PropLine], path: impl AsRef<Path>) -> Result<()> {
    write_csv(lines, path.as_ref())
}

/// Save merged edge bets to CSV
pub fn save_edge_bets_to_csv(bets: &[EdgeBet], path: impl AsRef<Path>) -> Result<()> {
    write_csv(bets, path.as_ref())
}

/// Load merged edge bets previously written by `save_edge_bets_to_csv`
pub fn load_edge_bets_from_csv(path: impl AsRef<Path>) -> Result<Vec<EdgeBet>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;

    reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("Invalid edge bet on CSV row {}", i + 1)))
        .collect()
}

/// One parlay leg per row, tagged with its parlay's number and total odds
#[derive(Debug, Serialize)]
struct ParlayLegRow<'a> {
    #[serde(rename = "Parlay_Number")]
    parlay_number: usize,
    #[serde(rename = "Total_Odds")]
    total_odds: i64,
    #[serde(rename = "Total_Decimal_Odds")]
    total_decimal_odds: f64,
    #[serde(rename = "Hit_Probability")]
    hit_probability: f64,
    player_name: &'a str,
    team: &'a str,
    opp: &'a str,
    bet_type: &'a str,
    side: OverUnder,
    threshold: f64,
    projected_value: f64,
    edge: f64,
    bookmaker: &'a str,
    american_odds: i32,
    model_prob: f64,
}

/// Save parlays to CSV
pub fn save_parlays_to_csv(parlays: &[Parlay], path: impl AsRef<Path>) -> Result<()> {
    let rows = parlays.iter().enumerate().flat_map(|(i, parlay)| {
        parlay.legs.iter().map(move |leg| ParlayLegRow {
            parlay_number: i + 1,
            total_odds: parlay.combined_american_odds,
            total_decimal_odds: parlay.combined_decimal_odds,
            hit_probability: parlay.combined_model_prob,
            player_name: &leg.player_name,
            team: &leg.team,
            opp: &leg.opp,
            bet_type: &leg.bet_type,
            side: leg.side,
            threshold: leg.threshold,
            projected_value: leg.projected_value,
            edge: leg.edge,
            bookmaker: &leg.bookmaker,
            american_odds: leg.american_odds,
            model_prob: leg.model_prob,
        })
    });
    write_csv(rows, path.as_ref())
}
