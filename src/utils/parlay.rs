use crate::utils::edge::{normalize_player_name, EdgeBet};
use crate::utils::odds::{calculate_expected_value, decimal_to_american_wide};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

pub const MAX_LEGS: usize = 10;

/// Upper bound on combinations scored in one run; the candidate pool shrinks to fit
pub const MAX_COMBINATIONS: u128 = 2_000_000;

#[derive(Debug, Error, PartialEq)]
pub enum ParlayError {
    #[error("invalid parlay configuration: {0}")]
    InvalidConfig(String),
}

/// How candidate legs are chosen and scored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParlayStrategy {
    /// Positive edge only, scored by edge times decimal odds
    #[default]
    Balanced,
    /// Positive edge only, scored by edge
    Conservative,
    /// Any edge, scored by decimal odds
    HighRisk,
}

impl ParlayStrategy {
    fn admits(&self, bet: &EdgeBet) -> bool {
        match self {
            ParlayStrategy::Balanced | ParlayStrategy::Conservative => bet.edge > 0.0,
            ParlayStrategy::HighRisk => true,
        }
    }

    pub fn score(&self, bet: &EdgeBet) -> f64 {
        match self {
            ParlayStrategy::Balanced => bet.edge * bet.decimal_odds,
            ParlayStrategy::Conservative => bet.edge,
            ParlayStrategy::HighRisk => bet.decimal_odds,
        }
    }
}

impl fmt::Display for ParlayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParlayStrategy::Balanced => write!(f, "balanced"),
            ParlayStrategy::Conservative => write!(f, "conservative"),
            ParlayStrategy::HighRisk => write!(f, "high-risk"),
        }
    }
}

impl FromStr for ParlayStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "balanced" => Ok(ParlayStrategy::Balanced),
            "conservative" => Ok(ParlayStrategy::Conservative),
            "high-risk" | "highrisk" => Ok(ParlayStrategy::HighRisk),
            other => Err(format!(
                "unknown strategy '{}', expected balanced, conservative or high-risk",
                other
            )),
        }
    }
}

/// What ranks one combination above another
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParlayRanking {
    #[default]
    CombinedOdds,
    Score,
}

impl FromStr for ParlayRanking {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "odds" | "combined-odds" => Ok(ParlayRanking::CombinedOdds),
            "score" => Ok(ParlayRanking::Score),
            other => Err(format!("unknown ranking '{}', expected odds or score", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParlayConfig {
    pub min_legs: usize,
    pub max_legs: usize,
    pub num_parlays: usize,
    pub strategy: ParlayStrategy,
    pub ranking: ParlayRanking,
    /// Candidate pool size is `max_legs * candidate_factor`
    pub candidate_factor: usize,
    /// No bet appears in more than one returned parlay
    pub unique_legs: bool,
}

impl ParlayConfig {
    pub fn new(legs: usize, num_parlays: usize) -> Self {
        Self {
            min_legs: legs,
            max_legs: legs,
            num_parlays,
            strategy: ParlayStrategy::default(),
            ranking: ParlayRanking::default(),
            candidate_factor: 10,
            unique_legs: true,
        }
    }

    pub fn validate(&self) -> Result<(), ParlayError> {
        if self.min_legs == 0 || self.max_legs > MAX_LEGS {
            return Err(ParlayError::InvalidConfig(format!(
                "legs must be between 1 and {}",
                MAX_LEGS
            )));
        }
        if self.min_legs > self.max_legs {
            return Err(ParlayError::InvalidConfig(format!(
                "min_legs ({}) exceeds max_legs ({})",
                self.min_legs, self.max_legs
            )));
        }
        if self.num_parlays == 0 {
            return Err(ParlayError::InvalidConfig(
                "num_parlays must be at least 1".to_string(),
            ));
        }
        if self.candidate_factor == 0 {
            return Err(ParlayError::InvalidConfig(
                "candidate_factor must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ParlayConfig {
    fn default() -> Self {
        Self::new(4, 2)
    }
}

/// A combination of independent bets paid only if every leg wins
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parlay {
    pub legs: Vec<EdgeBet>,
    pub combined_decimal_odds: f64,
    pub combined_american_odds: i64,
    /// Product of leg model probabilities, treating legs as independent
    pub combined_model_prob: f64,
    pub expected_value: f64,
    pub score: f64,
}

impl Parlay {
    pub fn from_legs(legs: Vec<EdgeBet>, strategy: ParlayStrategy) -> Self {
        let combined_decimal_odds: f64 = legs.iter().map(|l| l.decimal_odds).product();
        let combined_model_prob: f64 = legs.iter().map(|l| l.model_prob).product();
        let score: f64 = legs.iter().map(|l| strategy.score(l)).sum();

        Self {
            combined_american_odds: decimal_to_american_wide(combined_decimal_odds),
            expected_value: calculate_expected_value(combined_model_prob, combined_decimal_odds),
            combined_decimal_odds,
            combined_model_prob,
            score,
            legs,
        }
    }

    pub fn total_edge(&self) -> f64 {
        self.legs.iter().map(|l| l.edge).sum()
    }

    /// Format the parlay header as a readable string
    pub fn format(&self) -> String {
        format!(
            "{} legs | Total Odds: {:+} ({:.2}) | Hit: {:.1}% | EV: {:+.2}% | Edge: {:+.2} | Score: {:.2}",
            self.legs.len(),
            self.combined_american_odds,
            self.combined_decimal_odds,
            self.combined_model_prob * 100.0,
            self.expected_value * 100.0,
            self.total_edge(),
            self.score
        )
    }
}

/// Lexicographic k-combinations of `0..n`
struct Combinations {
    n: usize,
    indices: Vec<usize>,
    done: bool,
}

impl Combinations {
    fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            done: k == 0 || k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let current = self.indices.clone();
        let k = self.indices.len();

        // Find the rightmost index that can still move right
        let mut i = k;
        loop {
            if i == 0 {
                self.done = true;
                break;
            }
            i -= 1;
            if self.indices[i] < self.n - k + i {
                self.indices[i] += 1;
                for j in (i + 1)..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                break;
            }
        }

        Some(current)
    }
}

/// n choose k, saturating
fn binomial(n: usize, k: usize) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        result = result.saturating_mul((n - i) as u128) / (i as u128 + 1);
    }
    result
}

fn combination_count(n: usize, min_legs: usize, max_legs: usize) -> u128 {
    (min_legs..=max_legs)
        .map(|k| binomial(n, k))
        .fold(0u128, |acc, c| acc.saturating_add(c))
}

/// A scored combination, kept as candidate indices until it is selected
struct RankedCombo {
    indices: Vec<usize>,
    combined_odds: f64,
    score: f64,
}

/// Build up to `num_parlays` parlays from the strongest `max_legs * candidate_factor` bets
/// Every combination of `min_legs..=max_legs` legs is scored; same player and stat can't appear twice
pub fn optimize_parlays(bets: &[EdgeBet], config: &ParlayConfig) -> Result<Vec<Parlay>, ParlayError> {
    config.validate()?;
    let strategy = config.strategy;

    let mut candidates: Vec<(&EdgeBet, f64, String)> = bets
        .iter()
        .filter(|b| strategy.admits(b))
        .map(|b| (b, strategy.score(b), b.id()))
        .collect();

    candidates.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.2.cmp(&b.2))
    });

    let mut pool_size = candidates.len().min(config.max_legs * config.candidate_factor);
    while pool_size > config.max_legs
        && combination_count(pool_size, config.min_legs, config.max_legs) > MAX_COMBINATIONS
    {
        pool_size -= 1;
    }
    candidates.truncate(pool_size);

    if candidates.len() < config.min_legs {
        debug!(
            candidates = candidates.len(),
            min_legs = config.min_legs,
            "not enough candidate bets to build a parlay"
        );
        return Ok(Vec::new());
    }

    // Candidates on the same player and stat share a conflict group
    let mut groups = HashMap::new();
    let conflict_group: Vec<usize> = candidates
        .iter()
        .map(|(b, _, _)| {
            let next = groups.len();
            *groups
                .entry((normalize_player_name(&b.player_name), b.category))
                .or_insert(next)
        })
        .collect();

    let mut ranked = Vec::new();
    for legs in config.min_legs..=config.max_legs {
        for combo in Combinations::new(candidates.len(), legs) {
            let conflicted = combo.iter().enumerate().any(|(pos, &i)| {
                combo[pos + 1..]
                    .iter()
                    .any(|&j| conflict_group[i] == conflict_group[j])
            });
            if conflicted {
                continue;
            }

            let combined_odds: f64 = combo.iter().map(|&i| candidates[i].0.decimal_odds).product();
            let score: f64 = combo.iter().map(|&i| candidates[i].1).sum();
            ranked.push(RankedCombo {
                indices: combo,
                combined_odds,
                score,
            });
        }
    }

    debug!(
        candidates = candidates.len(),
        combinations = ranked.len(),
        "scored parlay combinations"
    );

    ranked.sort_by(|a, b| {
        let (primary, secondary) = match config.ranking {
            ParlayRanking::CombinedOdds => (
                b.combined_odds.partial_cmp(&a.combined_odds),
                b.score.partial_cmp(&a.score),
            ),
            ParlayRanking::Score => (
                b.score.partial_cmp(&a.score),
                b.combined_odds.partial_cmp(&a.combined_odds),
            ),
        };
        primary
            .unwrap_or(Ordering::Equal)
            .then(secondary.unwrap_or(Ordering::Equal))
            .then_with(|| a.indices.cmp(&b.indices))
    });

    let mut used: HashSet<usize> = HashSet::new();
    let mut parlays = Vec::new();

    for combo in ranked {
        if parlays.len() >= config.num_parlays {
            break;
        }
        if config.unique_legs && combo.indices.iter().any(|i| used.contains(i)) {
            continue;
        }

        used.extend(combo.indices.iter().copied());
        let legs = combo
            .indices
            .iter()
            .map(|&i| candidates[i].0.clone())
            .collect();
        parlays.push(Parlay::from_legs(legs, strategy));
    }

    Ok(parlays)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OverUnder, StatCategory};
    use crate::utils::odds::decimal_to_american;

    fn bet(player: &str, category: StatCategory, edge: f64, decimal_odds: f64) -> EdgeBet {
        EdgeBet {
            player_name: player.to_string(),
            team: "LAL".into(),
            opp: "HOU".into(),
            position: "SF".into(),
            minutes: 32.0,
            bet_type: "player_points".into(),
            category,
            side: OverUnder::Over,
            threshold: 20.5,
            projected_value: 20.5 + edge,
            edge,
            bookmaker: "draftkings".into(),
            decimal_odds,
            american_odds: decimal_to_american(decimal_odds),
            implied_prob: 1.0 / decimal_odds,
            model_prob: 0.6,
            expected_value: 0.0,
            z_score: 0.0,
            event_id: "e".into(),
            gid: None,
        }
    }

    #[test]
    fn test_combinations_enumerates_lexicographically() {
        let combos: Vec<_> = Combinations::new(4, 2).collect();
        assert_eq!(
            combos,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
        assert_eq!(Combinations::new(3, 3).count(), 1);
        assert_eq!(Combinations::new(2, 3).count(), 0);
        assert_eq!(Combinations::new(10, 4).count() as u128, binomial(10, 4));
    }

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(5, 2), 10);
        assert_eq!(binomial(40, 4), 91_390);
        assert_eq!(binomial(3, 5), 0);
        assert_eq!(combination_count(5, 1, 2), 15);
    }

    #[test]
    fn test_config_validation() {
        assert!(ParlayConfig::new(3, 2).validate().is_ok());
        assert!(ParlayConfig::new(0, 2).validate().is_err());
        assert!(ParlayConfig::new(11, 2).validate().is_err());
        assert!(ParlayConfig::new(3, 0).validate().is_err());

        let mut config = ParlayConfig::new(3, 1);
        config.min_legs = 4;
        assert!(matches!(config.validate(), Err(ParlayError::InvalidConfig(_))));
    }

    #[test]
    fn test_parlay_combined_odds() {
        let parlay = Parlay::from_legs(
            vec![
                bet("A", StatCategory::Points, 1.0, 2.0),
                bet("B", StatCategory::Points, 1.0, 1.5),
            ],
            ParlayStrategy::Balanced,
        );
        assert!((parlay.combined_decimal_odds - 3.0).abs() < 1e-9);
        assert_eq!(parlay.combined_american_odds, 200);
        assert!((parlay.combined_model_prob - 0.36).abs() < 1e-9);
        // 0.36 * 2 - 0.64
        assert!((parlay.expected_value - 0.08).abs() < 1e-9);
        assert!((parlay.score - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_ten_leg_parlay_odds_are_not_truncated() {
        let legs = (0..10)
            .map(|i| bet(&format!("P{}", i), StatCategory::Points, 1.0, 10.0))
            .collect();
        let parlay = Parlay::from_legs(legs, ParlayStrategy::HighRisk);
        assert!(parlay.combined_american_odds > i64::from(i32::MAX));
        assert!(parlay.format().contains("+999999999900"));
    }

    #[test]
    fn test_optimize_ranks_by_combined_odds_with_unique_legs() {
        let bets = vec![
            bet("A", StatCategory::Points, 2.0, 2.2),
            bet("B", StatCategory::Points, 1.5, 2.0),
            bet("C", StatCategory::Rebounds, 1.0, 1.8),
            bet("D", StatCategory::Assists, 0.5, 1.9),
            bet("E", StatCategory::Points, -1.0, 5.0),
        ];

        let parlays = optimize_parlays(&bets, &ParlayConfig::new(2, 2)).unwrap();
        assert_eq!(parlays.len(), 2);

        let names = |p: &Parlay| p.legs.iter().map(|l| l.player_name.clone()).collect::<Vec<_>>();
        // Best pair by odds is A+B (4.4), next disjoint pair is C+D
        assert_eq!(names(&parlays[0]), vec!["A", "B"]);
        assert_eq!(names(&parlays[1]), vec!["C", "D"]);
        assert!(parlays
            .iter()
            .all(|p| p.legs.iter().all(|l| l.player_name != "E")));
    }

    #[test]
    fn test_overlapping_parlays_when_unique_legs_disabled() {
        let bets = vec![
            bet("A", StatCategory::Points, 2.0, 2.2),
            bet("B", StatCategory::Points, 1.5, 2.0),
            bet("C", StatCategory::Rebounds, 1.0, 1.8),
        ];
        let mut config = ParlayConfig::new(2, 3);
        config.unique_legs = false;

        let parlays = optimize_parlays(&bets, &config).unwrap();
        assert_eq!(parlays.len(), 3);
        assert!(parlays[0].combined_decimal_odds >= parlays[1].combined_decimal_odds);
        assert!(parlays[1].combined_decimal_odds >= parlays[2].combined_decimal_odds);
    }

    #[test]
    fn test_same_player_and_stat_never_share_a_parlay() {
        let mut under = bet("A", StatCategory::Points, 1.0, 2.5);
        under.side = OverUnder::Under;
        let bets = vec![
            bet("A", StatCategory::Points, 2.0, 2.5),
            under,
            bet("A", StatCategory::Rebounds, 1.0, 1.5),
        ];

        let mut config = ParlayConfig::new(2, 5);
        config.unique_legs = false;
        let parlays = optimize_parlays(&bets, &config).unwrap();

        assert_eq!(parlays.len(), 2);
        for parlay in &parlays {
            let points_legs = parlay
                .legs
                .iter()
                .filter(|l| l.category == StatCategory::Points)
                .count();
            assert_eq!(points_legs, 1);
        }
    }

    #[test]
    fn test_high_risk_admits_negative_edge() {
        let bets = vec![
            bet("A", StatCategory::Points, -2.0, 6.0),
            bet("B", StatCategory::Points, 1.0, 1.5),
        ];

        let mut config = ParlayConfig::new(1, 1);
        config.strategy = ParlayStrategy::HighRisk;
        let parlays = optimize_parlays(&bets, &config).unwrap();
        assert_eq!(parlays[0].legs[0].player_name, "A");

        config.strategy = ParlayStrategy::Conservative;
        let parlays = optimize_parlays(&bets, &config).unwrap();
        assert_eq!(parlays[0].legs[0].player_name, "B");
    }

    #[test]
    fn test_leg_range_and_too_few_candidates() {
        let bets = vec![
            bet("A", StatCategory::Points, 2.0, 2.0),
            bet("B", StatCategory::Points, 1.0, 2.0),
        ];

        assert!(optimize_parlays(&bets, &ParlayConfig::new(3, 1))
            .unwrap()
            .is_empty());

        let mut config = ParlayConfig::new(1, 1);
        config.max_legs = 2;
        let parlays = optimize_parlays(&bets, &config).unwrap();
        assert_eq!(parlays[0].legs.len(), 2);
    }

    #[test]
    fn test_score_ranking() {
        let bets = vec![
            bet("A", StatCategory::Points, 0.5, 3.0),
            bet("B", StatCategory::Points, 3.0, 1.5),
        ];
        let mut config = ParlayConfig::new(1, 1);
        config.strategy = ParlayStrategy::Conservative;
        config.ranking = ParlayRanking::Score;

        let parlays = optimize_parlays(&bets, &config).unwrap();
        assert_eq!(parlays[0].legs[0].player_name, "B");
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("Balanced".parse::<ParlayStrategy>(), Ok(ParlayStrategy::Balanced));
        assert_eq!("high_risk".parse::<ParlayStrategy>(), Ok(ParlayStrategy::HighRisk));
        assert!("yolo".parse::<ParlayStrategy>().is_err());
        assert_eq!("odds".parse::<ParlayRanking>(), Ok(ParlayRanking::CombinedOdds));
    }
}
