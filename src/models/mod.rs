use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A provider-defined grouping of games for one DFS site on one date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slate {
    pub id: String,
    pub site: String,
    pub name: Option<String>,
    pub game_count: Option<u32>,
}

/// A game on the schedule for a slate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledGame {
    pub gid: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub home_wins: Option<u32>,
    pub away_wins: Option<u32>,
    pub start_time: Option<DateTime<Utc>>,
}

impl ScheduledGame {
    pub fn matchup(&self) -> String {
        format!("{} @ {}", self.away_team, self.home_team)
    }

    /// Tip-off in US Eastern time, e.g. `2024-01-17 07:00 PM ET`
    pub fn start_time_display(&self) -> String {
        self.start_time
            .and_then(|t| {
                let local = t.with_timezone(&us_eastern_offset(t)?);
                Some(local.format("%Y-%m-%d %I:%M %p ET").to_string())
            })
            .unwrap_or_else(|| "TBD".to_string())
    }
}

/// UTC instant of 2:00 AM local on the nth Sunday of a month
fn sunday_transition(year: i32, month: u32, n: u8, utc_hour: u32) -> Option<DateTime<Utc>> {
    let day = NaiveDate::from_weekday_of_month_opt(year, month, Weekday::Sun, n)?;
    Some(Utc.from_utc_datetime(&day.and_hms_opt(utc_hour, 0, 0)?))
}

/// EDT from the second Sunday in March to the first Sunday in November, EST otherwise
fn us_eastern_offset(t: DateTime<Utc>) -> Option<FixedOffset> {
    let dst_start = sunday_transition(t.year(), 3, 2, 7)?;
    let dst_end = sunday_transition(t.year(), 11, 1, 6)?;
    let hours = if t >= dst_start && t < dst_end { 4 } else { 5 };
    FixedOffset::west_opt(hours * 3600)
}

/// Projected box score for a single player on a slate
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlayerProjection {
    pub player_name: String,
    pub position: String,
    pub team: String,
    pub opp: String,
    pub minutes: f64,
    pub possessions: f64,
    pub fd_points: f64,
    pub fd_std: f64,
    #[serde(default)]
    pub fd_25_percentile: f64,
    #[serde(default)]
    pub fd_50_percentile: f64,
    #[serde(default)]
    pub fd_75_percentile: f64,
    #[serde(default)]
    pub fd_85_percentile: f64,
    #[serde(default)]
    pub fd_95_percentile: f64,
    #[serde(default)]
    pub fd_99_percentile: f64,
    pub points: f64,
    pub assists: f64,
    pub rebounds: f64,
    pub offensive_rebounds: f64,
    pub defensive_rebounds: f64,
    pub blocks: f64,
    pub steals: f64,
    pub fouls: f64,
    pub turnovers: f64,
    pub two_pt_attempts: f64,
    pub two_pt_fg: f64,
    pub three_pt_attempts: f64,
    pub three_pt_fg: f64,
    pub free_throw_attempts: f64,
    pub free_throws_made: f64,
    pub double_doubles: f64,
    pub triple_doubles: f64,
    pub injury: Option<String>,
    pub confirmed: bool,
    pub gid: Option<String>,
    pub slate_id: Option<String>,
}

impl PlayerProjection {
    pub fn matchup(&self) -> String {
        format!("{} vs {}", self.team, self.opp)
    }

    /// Effective field goal percentage, weighting made threes by 1.5
    pub fn effective_fg_pct(&self) -> Option<f64> {
        let attempts = self.two_pt_attempts + self.three_pt_attempts;
        if attempts <= 0.0 {
            return None;
        }
        let made = self.two_pt_fg + self.three_pt_fg + 0.5 * self.three_pt_fg;
        Some(made / attempts * 100.0)
    }
}

/// Which side of a prop line a bet takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverUnder {
    Over,
    Under,
}

impl fmt::Display for OverUnder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverUnder::Over => write!(f, "Over"),
            OverUnder::Under => write!(f, "Under"),
        }
    }
}

impl FromStr for OverUnder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "over" => Ok(OverUnder::Over),
            "under" => Ok(OverUnder::Under),
            other => Err(format!("not an over/under side: {}", other)),
        }
    }
}

/// Statistical category a player-prop market settles on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatCategory {
    Points,
    Rebounds,
    Assists,
    Threes,
    Blocks,
    Steals,
    Turnovers,
    PointsReboundsAssists,
    PointsRebounds,
    PointsAssists,
    ReboundsAssists,
}

impl StatCategory {
    /// Map an odds API market key (e.g. `player_points_alternate`) to its category
    pub fn from_market(market: &str) -> Option<Self> {
        let base = market.strip_suffix("_alternate").unwrap_or(market);
        match base {
            "player_points" => Some(StatCategory::Points),
            "player_rebounds" => Some(StatCategory::Rebounds),
            "player_assists" => Some(StatCategory::Assists),
            "player_threes" => Some(StatCategory::Threes),
            "player_blocks" => Some(StatCategory::Blocks),
            "player_steals" => Some(StatCategory::Steals),
            "player_turnovers" => Some(StatCategory::Turnovers),
            "player_points_rebounds_assists" => Some(StatCategory::PointsReboundsAssists),
            "player_points_rebounds" => Some(StatCategory::PointsRebounds),
            "player_points_assists" => Some(StatCategory::PointsAssists),
            "player_rebounds_assists" => Some(StatCategory::ReboundsAssists),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatCategory::Points => "points",
            StatCategory::Rebounds => "rebounds",
            StatCategory::Assists => "assists",
            StatCategory::Threes => "threes",
            StatCategory::Blocks => "blocks",
            StatCategory::Steals => "steals",
            StatCategory::Turnovers => "turnovers",
            StatCategory::PointsReboundsAssists => "pts+reb+ast",
            StatCategory::PointsRebounds => "pts+reb",
            StatCategory::PointsAssists => "pts+ast",
            StatCategory::ReboundsAssists => "reb+ast",
        }
    }

    /// The projected value of this stat for a player
    pub fn projected_value(&self, proj: &PlayerProjection) -> f64 {
        match self {
            StatCategory::Points => proj.points,
            StatCategory::Rebounds => proj.rebounds,
            StatCategory::Assists => proj.assists,
            StatCategory::Threes => proj.three_pt_fg,
            StatCategory::Blocks => proj.blocks,
            StatCategory::Steals => proj.steals,
            StatCategory::Turnovers => proj.turnovers,
            StatCategory::PointsReboundsAssists => proj.points + proj.rebounds + proj.assists,
            StatCategory::PointsRebounds => proj.points + proj.rebounds,
            StatCategory::PointsAssists => proj.points + proj.assists,
            StatCategory::ReboundsAssists => proj.rebounds + proj.assists,
        }
    }
}

impl fmt::Display for StatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single bookmaker price on one side of a player-prop line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropLine {
    pub event_id: String,
    pub bookmaker: String,
    pub market: String,
    pub side: OverUnder,
    pub player_name: String,
    pub threshold: f64,
    pub decimal_odds: f64,
    pub american_odds: i32,
}
