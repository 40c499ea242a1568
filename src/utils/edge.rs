use crate::models::{OverUnder, PlayerProjection, PropLine, StatCategory};
use crate::utils::odds::{
    calculate_expected_value, decimal_odds_to_probability, over_probability, under_probability,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

const NAME_SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv"];

/// Clean a sportsbook player name the way the odds feed is matched
/// "P.J. Washington" -> "PJ Washington", "Gilgeous-Alexander" -> "Gilgeous Alexander"
pub fn clean_player_name(name: &str) -> String {
    name.replace('.', "")
        .replace('-', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the join key used to match projections to prop lines
/// "Jaren Jackson Jr." -> "jaren jackson"
pub fn normalize_player_name(name: &str) -> String {
    let cleaned = clean_player_name(name).replace('\'', "").to_lowercase();
    let mut parts: Vec<&str> = cleaned.split_whitespace().collect();

    while parts.len() > 1 && parts.last().is_some_and(|p| NAME_SUFFIXES.contains(p)) {
        parts.pop();
    }

    parts.join(" ")
}

/// A prop line joined with the player's projection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgeBet {
    pub player_name: String,
    pub team: String,
    pub opp: String,
    pub position: String,
    pub minutes: f64,
    pub bet_type: String,
    pub category: StatCategory,
    pub side: OverUnder,
    pub threshold: f64,
    pub projected_value: f64,
    pub edge: f64,
    pub bookmaker: String,
    pub decimal_odds: f64,
    pub american_odds: i32,
    pub implied_prob: f64,
    pub model_prob: f64,
    pub expected_value: f64,
    pub z_score: f64,
    pub event_id: String,
    pub gid: Option<String>,
}

impl EdgeBet {
    /// Stable identifier for a bet: one side of one line at one book
    pub fn id(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.player_name, self.bet_type, self.side, self.threshold, self.bookmaker
        )
    }

    pub fn matchup(&self) -> String {
        format!("{} vs {}", self.team, self.opp)
    }

    /// Format the bet as a readable string
    pub fn format(&self) -> String {
        format!(
            "{} ({}) | {} {} {:.1} ({:+}) on {} | Proj: {:.1} | Edge: {:+.2} | Model: {:.1}% | Implied: {:.1}% | EV: {:+.2}%",
            self.player_name,
            self.matchup(),
            self.category,
            self.side,
            self.threshold,
            self.american_odds,
            self.bookmaker,
            self.projected_value,
            self.edge,
            self.model_prob * 100.0,
            self.implied_prob * 100.0,
            self.expected_value * 100.0
        )
    }
}

/// Edge of one side of a line: how far the projection clears the threshold
pub fn calculate_edge(projected: f64, threshold: f64, side: OverUnder) -> f64 {
    match side {
        OverUnder::Over => projected - threshold,
        OverUnder::Under => threshold - projected,
    }
}

/// Standard deviation of a stat, scaled from the fantasy-point distribution
/// Falls back to a Poisson-like sqrt(mean) when the projection has no spread
pub fn stat_std_dev(proj: &PlayerProjection, projected: f64) -> f64 {
    if proj.fd_points > 0.0 && proj.fd_std > 0.0 {
        proj.fd_std * projected / proj.fd_points
    } else {
        projected.max(0.0).sqrt()
    }
}

/// Join projections and prop lines on player name and compute edge metrics
/// Lines for unknown markets or unmatched players are dropped
pub fn merge_projections_and_odds(
    projections: &[PlayerProjection],
    lines: &[PropLine],
) -> Vec<EdgeBet> {
    let mut by_name: HashMap<String, &PlayerProjection> = HashMap::new();
    for p in projections {
        by_name.entry(normalize_player_name(&p.player_name)).or_insert(p);
    }

    let mut unmatched = 0usize;
    let mut bets = Vec::new();

    for line in lines {
        let Some(category) = StatCategory::from_market(&line.market) else {
            continue;
        };

        let Some(proj) = by_name.get(&normalize_player_name(&line.player_name)) else {
            debug!(player = %line.player_name, "no projection found for player");
            unmatched += 1;
            continue;
        };

        let projected = category.projected_value(proj);
        let std_dev = stat_std_dev(proj, projected);
        let model_prob = match line.side {
            OverUnder::Over => over_probability(projected, std_dev, line.threshold),
            OverUnder::Under => under_probability(projected, std_dev, line.threshold),
        };

        bets.push(EdgeBet {
            player_name: proj.player_name.clone(),
            team: proj.team.clone(),
            opp: proj.opp.clone(),
            position: proj.position.clone(),
            minutes: proj.minutes,
            bet_type: line.market.clone(),
            category,
            side: line.side,
            threshold: line.threshold,
            projected_value: projected,
            edge: calculate_edge(projected, line.threshold, line.side),
            bookmaker: line.bookmaker.clone(),
            decimal_odds: line.decimal_odds,
            american_odds: line.american_odds,
            implied_prob: decimal_odds_to_probability(line.decimal_odds),
            model_prob,
            expected_value: calculate_expected_value(model_prob, line.decimal_odds),
            z_score: 0.0,
            event_id: line.event_id.clone(),
            gid: proj.gid.clone(),
        });
    }

    if unmatched > 0 {
        info!(unmatched, "prop lines without a matching projection were skipped");
    }

    bets.sort_by(|a, b| {
        b.edge
            .partial_cmp(&a.edge)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    bets
}

/// Bets where the projection is already on the winning side of the line
/// Restricted to the single-stat points, assists and rebounds markets
pub fn best_bets(bets: &[EdgeBet]) -> Vec<EdgeBet> {
    bets.iter()
        .filter(|b| {
            matches!(
                b.category,
                StatCategory::Points | StatCategory::Assists | StatCategory::Rebounds
            ) && b.edge > 0.0
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection(name: &str, points: f64, rebounds: f64, assists: f64) -> PlayerProjection {
        PlayerProjection {
            player_name: name.to_string(),
            team: "LAL".to_string(),
            opp: "HOU".to_string(),
            minutes: 34.0,
            fd_points: 50.0,
            fd_std: 10.0,
            points,
            rebounds,
            assists,
            ..Default::default()
        }
    }

    fn line(player: &str, market: &str, side: OverUnder, threshold: f64, price: f64) -> PropLine {
        PropLine {
            event_id: "evt".to_string(),
            bookmaker: "draftkings".to_string(),
            market: market.to_string(),
            side,
            player_name: player.to_string(),
            threshold,
            decimal_odds: price,
            american_odds: crate::utils::odds::decimal_to_american(price),
        }
    }

    #[test]
    fn test_normalize_player_name() {
        assert_eq!(normalize_player_name("LeBron James"), "lebron james");
        assert_eq!(normalize_player_name("Jaren Jackson Jr."), "jaren jackson");
        assert_eq!(normalize_player_name("P.J. Washington"), "pj washington");
        assert_eq!(
            normalize_player_name("Shai Gilgeous-Alexander"),
            "shai gilgeous alexander"
        );
        assert_eq!(normalize_player_name("Gary Trent Jr"), "gary trent");
        assert_eq!(normalize_player_name("De'Aaron  Fox"), "deaaron fox");
        assert_eq!(normalize_player_name("Robert Williams III"), "robert williams");
    }

    #[test]
    fn test_calculate_edge() {
        assert_eq!(calculate_edge(25.0, 22.5, OverUnder::Over), 2.5);
        assert_eq!(calculate_edge(25.0, 22.5, OverUnder::Under), -2.5);
    }

    #[test]
    fn test_merge_keeps_first_projection_for_shared_name() {
        let projections = vec![
            projection("Gary Trent Jr.", 14.0, 2.5, 1.5),
            projection("Gary Trent", 4.0, 1.0, 0.5),
        ];
        let lines = vec![line("Gary Trent Jr", "player_points", OverUnder::Over, 11.5, 1.9)];

        let bets = merge_projections_and_odds(&projections, &lines);
        assert_eq!(bets.len(), 1);
        assert_eq!(bets[0].player_name, "Gary Trent Jr.");
        assert_eq!(bets[0].projected_value, 14.0);
    }

    #[test]
    fn test_merge_matches_on_normalized_name() {
        let projections = vec![
            projection("Jaren Jackson Jr.", 22.0, 6.0, 1.5),
            projection("LeBron James", 25.0, 7.5, 8.0),
        ];
        let lines = vec![
            line("Jaren Jackson", "player_points", OverUnder::Over, 20.5, 1.9),
            line("LeBron James", "player_assists_alternate", OverUnder::Under, 10.5, 1.8),
            line("Nobody Here", "player_points", OverUnder::Over, 10.5, 1.9),
            line("LeBron James", "player_double_double", OverUnder::Over, 0.5, 1.5),
        ];

        let bets = merge_projections_and_odds(&projections, &lines);
        assert_eq!(bets.len(), 2);

        // Sorted by edge descending
        assert_eq!(bets[0].player_name, "LeBron James");
        assert_eq!(bets[0].category, StatCategory::Assists);
        assert!((bets[0].edge - 2.5).abs() < 1e-9);

        assert_eq!(bets[1].player_name, "Jaren Jackson Jr.");
        assert!((bets[1].edge - 1.5).abs() < 1e-9);
        assert!(bets[1].model_prob > 0.5);
        assert!((bets[1].implied_prob - 1.0 / 1.9).abs() < 1e-9);
    }

    #[test]
    fn test_model_probability_uses_scaled_std() {
        let proj = projection("A", 25.0, 0.0, 0.0);
        // fd_std 10 over fd_points 50 scales to 5 points of spread
        assert!((stat_std_dev(&proj, 25.0) - 5.0).abs() < 1e-9);

        let bets = merge_projections_and_odds(
            &[proj],
            &[line("A", "player_points", OverUnder::Over, 20.0, 2.0)],
        );
        assert!((bets[0].model_prob - 0.8413).abs() < 1e-3);
        assert!(bets[0].expected_value > 0.0);
    }

    #[test]
    fn test_std_dev_fallback() {
        let proj = PlayerProjection::default();
        assert!((stat_std_dev(&proj, 9.0) - 3.0).abs() < 1e-9);
        assert_eq!(stat_std_dev(&proj, 0.0), 0.0);
    }

    #[test]
    fn test_best_bets_only_core_markets() {
        let projections = vec![projection("A", 25.0, 10.0, 5.0)];
        let lines = vec![
            line("A", "player_points", OverUnder::Over, 20.5, 1.9),
            line("A", "player_points", OverUnder::Under, 20.5, 1.9),
            line("A", "player_points_rebounds", OverUnder::Over, 30.5, 1.9),
        ];
        let bets = merge_projections_and_odds(&projections, &lines);
        let best = best_bets(&bets);
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].side, OverUnder::Over);
        assert_eq!(best[0].category, StatCategory::Points);
    }
}
