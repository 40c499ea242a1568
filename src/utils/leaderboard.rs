use crate::models::{PlayerProjection, StatCategory};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Categories shown when the caller does not pick any
pub const DEFAULT_LEADERBOARD_CATEGORIES: [StatCategory; 6] = [
    StatCategory::Points,
    StatCategory::Rebounds,
    StatCategory::Assists,
    StatCategory::Threes,
    StatCategory::Blocks,
    StatCategory::Steals,
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub player_name: String,
    pub team: String,
    pub opp: String,
    pub minutes: f64,
    pub value: f64,
    pub efg_pct: Option<f64>,
}

impl LeaderboardEntry {
    pub fn efg_display(&self) -> String {
        self.efg_pct
            .map(|pct| format!("{:.1}%", pct))
            .unwrap_or_else(|| "-".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Leaderboard {
    pub category: StatCategory,
    pub entries: Vec<LeaderboardEntry>,
}

/// Top `top_n` projected players for each category, highest first
/// Ties keep the order of the input projections
pub fn create_leaderboards(
    projections: &[PlayerProjection],
    categories: &[StatCategory],
    top_n: usize,
) -> Vec<Leaderboard> {
    categories
        .iter()
        .map(|&category| {
            let mut ranked: Vec<(&PlayerProjection, f64)> = projections
                .iter()
                .map(|p| (p, category.projected_value(p)))
                .collect();
            ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

            let entries = ranked
                .into_iter()
                .take(top_n)
                .enumerate()
                .map(|(i, (p, value))| LeaderboardEntry {
                    rank: i + 1,
                    player_name: p.player_name.clone(),
                    team: p.team.clone(),
                    opp: p.opp.clone(),
                    minutes: p.minutes,
                    value,
                    efg_pct: p.effective_fg_pct(),
                })
                .collect();

            Leaderboard { category, entries }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection(name: &str, points: f64, rebounds: f64, assists: f64) -> PlayerProjection {
        PlayerProjection {
            player_name: name.to_string(),
            team: "DEN".to_string(),
            opp: "MIN".to_string(),
            points,
            rebounds,
            assists,
            ..Default::default()
        }
    }

    #[test]
    fn test_leaderboards_per_category() {
        let projections = vec![
            projection("Guard", 28.0, 4.0, 9.0),
            projection("Center", 24.0, 12.5, 9.5),
            projection("Wing", 18.0, 6.0, 3.0),
        ];

        let boards = create_leaderboards(
            &projections,
            &[StatCategory::Points, StatCategory::Rebounds, StatCategory::PointsReboundsAssists],
            2,
        );
        assert_eq!(boards.len(), 3);

        let points = &boards[0];
        assert_eq!(points.category, StatCategory::Points);
        assert_eq!(points.entries.len(), 2);
        assert_eq!(points.entries[0].player_name, "Guard");
        assert_eq!(points.entries[0].rank, 1);
        assert_eq!(points.entries[1].player_name, "Center");

        assert_eq!(boards[1].entries[0].player_name, "Center");
        assert_eq!(boards[2].entries[0].player_name, "Center");
        assert!((boards[2].entries[0].value - 46.0).abs() < 1e-9);
    }

    #[test]
    fn test_leaderboard_with_fewer_players_than_top_n() {
        let boards = create_leaderboards(&[projection("Solo", 10.0, 1.0, 1.0)], &[StatCategory::Assists], 10);
        assert_eq!(boards[0].entries.len(), 1);

        let empty = create_leaderboards(&[], &DEFAULT_LEADERBOARD_CATEGORIES, 5);
        assert!(empty.iter().all(|b| b.entries.is_empty()));
    }

    #[test]
    fn test_entries_carry_effective_fg_pct() {
        let shooter = PlayerProjection {
            two_pt_fg: 5.0,
            two_pt_attempts: 10.0,
            three_pt_fg: 2.0,
            three_pt_attempts: 6.0,
            ..projection("Shooter", 20.0, 3.0, 2.0)
        };
        let boards = create_leaderboards(
            &[shooter, projection("Rim Runner", 8.0, 9.0, 1.0)],
            &[StatCategory::Points],
            2,
        );

        let entries = &boards[0].entries;
        assert_eq!(entries[0].efg_display(), "50.0%");
        assert_eq!(entries[1].efg_pct, None);
        assert_eq!(entries[1].efg_display(), "-");
    }
}
