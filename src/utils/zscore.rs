use crate::utils::edge::EdgeBet;

/// Mean and standard deviation of one metric across the current pool of bets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolStats {
    pub mean: f64,
    pub stdev: f64,
}

/// Standard deviations below this count as zero
const STDEV_EPSILON: f64 = 1e-9;

/// Mean and sample standard deviation; fewer than two values report a stdev of 0
pub fn compute_pool_stats(values: &[f64]) -> PoolStats {
    if values.is_empty() {
        return PoolStats {
            mean: 0.0,
            stdev: 0.0,
        };
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return PoolStats { mean, stdev: 0.0 };
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    PoolStats {
        mean,
        stdev: variance.sqrt(),
    }
}

/// Z-score of a value, or 0.0 when the pool has no spread
pub fn compute_zscore(value: f64, stats: &PoolStats) -> f64 {
    if stats.stdev < STDEV_EPSILON {
        return 0.0;
    }
    (value - stats.mean) / stats.stdev
}

/// Set each bet's `z_score` to the mean of its edge, EV and model-probability z-scores
pub fn apply_composite_z_scores(bets: &mut [EdgeBet]) {
    let edges: Vec<f64> = bets.iter().map(|b| b.edge).collect();
    let evs: Vec<f64> = bets.iter().map(|b| b.expected_value).collect();
    let probs: Vec<f64> = bets.iter().map(|b| b.model_prob).collect();

    let edge_stats = compute_pool_stats(&edges);
    let ev_stats = compute_pool_stats(&evs);
    let prob_stats = compute_pool_stats(&probs);

    for bet in bets.iter_mut() {
        let edge_z = compute_zscore(bet.edge, &edge_stats);
        let ev_z = compute_zscore(bet.expected_value, &ev_stats);
        let prob_z = compute_zscore(bet.model_prob, &prob_stats);
        bet.z_score = (edge_z + ev_z + prob_z) / 3.0;
    }
}

/// Sort bets by composite z-score, best first
pub fn rank_by_z_score(bets: &mut [EdgeBet]) {
    bets.sort_by(|a, b| {
        b.z_score
            .partial_cmp(&a.z_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
