use crate::models::OverUnder;
use crate::utils::edge::EdgeBet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Favorites priced at or below this are excluded by default
pub const DEFAULT_MIN_AMERICAN_ODDS: i32 = -300;

/// Which side of the line to keep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideFilter {
    Over,
    Under,
    #[default]
    Both,
}

impl SideFilter {
    fn accepts(&self, side: OverUnder) -> bool {
        match self {
            SideFilter::Over => side == OverUnder::Over,
            SideFilter::Under => side == OverUnder::Under,
            SideFilter::Both => true,
        }
    }
}

impl FromStr for SideFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "over" => Ok(SideFilter::Over),
            "under" => Ok(SideFilter::Under),
            "both" | "" => Ok(SideFilter::Both),
            other => Err(format!("unknown side '{}', expected over, under or both", other)),
        }
    }
}

/// Row filters applied before ranking or optimizing
/// Empty lists and `None` thresholds mean "no restriction"
#[derive(Debug, Clone, PartialEq)]
pub struct BetFilter {
    /// Matches either the player's team or the opponent
    pub teams: Vec<String>,
    pub bet_types: Vec<String>,
    pub bookmakers: Vec<String>,
    pub min_minutes: Option<f64>,
    pub min_edge: Option<f64>,
    /// Exclusive lower bound on American odds
    pub min_american_odds: Option<i32>,
    pub side: SideFilter,
}

impl Default for BetFilter {
    fn default() -> Self {
        Self {
            teams: Vec::new(),
            bet_types: Vec::new(),
            bookmakers: Vec::new(),
            min_minutes: None,
            min_edge: None,
            min_american_odds: Some(DEFAULT_MIN_AMERICAN_ODDS),
            side: SideFilter::Both,
        }
    }
}

impl BetFilter {
    /// A filter that keeps everything
    pub fn none() -> Self {
        Self {
            min_american_odds: None,
            ..Default::default()
        }
    }

    pub fn matches(&self, bet: &EdgeBet) -> bool {
        if !self.teams.is_empty()
            && !self
                .teams
                .iter()
                .any(|t| t.eq_ignore_ascii_case(&bet.team) || t.eq_ignore_ascii_case(&bet.opp))
        {
            return false;
        }

        if !self.bet_types.is_empty() && !self.bet_types.iter().any(|b| b == &bet.bet_type) {
            return false;
        }

        if !self.bookmakers.is_empty()
            && !self
                .bookmakers
                .iter()
                .any(|b| b.eq_ignore_ascii_case(&bet.bookmaker))
        {
            return false;
        }

        if self.min_minutes.is_some_and(|m| bet.minutes < m) {
            return false;
        }

        if self.min_edge.is_some_and(|e| bet.edge < e) {
            return false;
        }

        if self.min_american_odds.is_some_and(|o| bet.american_odds <= o) {
            return false;
        }

        self.side.accepts(bet.side)
    }

    pub fn apply(&self, bets: &[EdgeBet]) -> Vec<EdgeBet> {
        bets.iter().filter(|b| self.matches(b)).cloned().collect()
    }
}

/// Bet types selected by default: everything except blocks, steals and threes
pub fn default_bet_types(all: &[String]) -> Vec<String> {
    all.iter()
        .filter(|bt| !["blocks", "steals", "threes"].iter().any(|s| bt.contains(s)))
        .cloned()
        .collect()
}

/// Distinct bet types present in a set of bets, sorted
pub fn available_bet_types(bets: &[EdgeBet]) -> Vec<String> {
    bets.iter()
        .map(|b| b.bet_type.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct teams (players' teams and opponents) present in a set of bets, sorted
pub fn available_teams(bets: &[EdgeBet]) -> Vec<String> {
    bets.iter()
        .flat_map(|b| [b.team.clone(), b.opp.clone()])
        .filter(|t| !t.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
