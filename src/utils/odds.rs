/// Convert decimal odds to American odds
/// 2.50 -> +150, 1.50 -> -200, even money (2.00) is +100
/// Odds of exactly 1.0 (no payout) or below are reported as 0
pub fn decimal_to_american(decimal_odds: f64) -> i32 {
    let odds = decimal_to_american_wide(decimal_odds);
    odds.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Same conversion in i64, for parlay prices past the i32 range
pub fn decimal_to_american_wide(decimal_odds: f64) -> i64 {
    if decimal_odds <= 1.0 || !decimal_odds.is_finite() {
        return 0;
    }

    if decimal_odds >= 2.0 {
        ((decimal_odds - 1.0) * 100.0) as i64
    } else {
        (-100.0 / (decimal_odds - 1.0)) as i64
    }
}

/// Convert American odds to decimal odds
pub fn american_to_decimal(odds: i32) -> f64 {
    if odds > 0 {
        1.0 + odds as f64 / 100.0
    } else if odds < 0 {
        1.0 + 100.0 / odds.abs() as f64
    } else {
        1.0
    }
}

/// Implied probability of decimal odds, ignoring the bookmaker's margin
pub fn decimal_odds_to_probability(decimal_odds: f64) -> f64 {
    if decimal_odds <= 0.0 {
        return 0.0;
    }
    1.0 / decimal_odds
}

/// Calculate expected value for a one-unit bet at decimal odds
/// EV = (probability of winning * profit) - (probability of losing * stake)
pub fn calculate_expected_value(model_prob: f64, decimal_odds: f64) -> f64 {
    let profit = decimal_odds - 1.0;
    let prob_lose = 1.0 - model_prob;

    (model_prob * profit) - prob_lose
}

/// Probability that a normally distributed stat lands above the threshold
/// A non-positive std dev collapses the distribution to its mean
pub fn over_probability(projection: f64, std_dev: f64, threshold: f64) -> f64 {
    if std_dev <= 0.0 || !std_dev.is_finite() {
        return step(projection - threshold);
    }
    1.0 - normal_cdf(threshold, projection, std_dev)
}

/// Probability that a normally distributed stat lands below the threshold
pub fn under_probability(projection: f64, std_dev: f64, threshold: f64) -> f64 {
    if std_dev <= 0.0 || !std_dev.is_finite() {
        return step(threshold - projection);
    }
    normal_cdf(threshold, projection, std_dev)
}

fn step(margin: f64) -> f64 {
    if margin > 0.0 {
        1.0
    } else if margin < 0.0 {
        0.0
    } else {
        0.5
    }
}

/// Normal cumulative distribution function with the given mean and std dev
pub fn normal_cdf(x: f64, mean: f64, std_dev: f64) -> f64 {
    let z = (x - mean) / std_dev;
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Approximation of the error function using Abramowitz and Stegun formula
fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_to_american() {
        assert_eq!(decimal_to_american(2.5), 150);
        assert_eq!(decimal_to_american(2.0), 100);
        assert_eq!(decimal_to_american(1.5), -200);
        // Truncates toward zero like the sportsbooks' display
        assert_eq!(decimal_to_american(1.91), -109);
        assert_eq!(decimal_to_american(1.0), 0);
        assert_eq!(decimal_to_american(0.5), 0);
    }

    #[test]
    fn test_american_to_decimal() {
        assert!((american_to_decimal(150) - 2.5).abs() < 1e-9);
        assert!((american_to_decimal(-200) - 1.5).abs() < 1e-9);
        assert_eq!(american_to_decimal(0), 1.0);
    }

    #[test]
    fn test_long_parlay_prices_do_not_saturate() {
        // Ten legs at +900
        let decimal = 10.0f64.powi(10);
        assert_eq!(decimal_to_american_wide(decimal), 999_999_999_900);
        assert_eq!(decimal_to_american(decimal), i32::MAX);
        assert_eq!(decimal_to_american_wide(1.5), -200);
    }

    #[test]
    fn test_decimal_odds_to_probability() {
        assert!((decimal_odds_to_probability(2.0) - 0.5).abs() < 1e-9);
        assert!((decimal_odds_to_probability(1.25) - 0.8).abs() < 1e-9);
        assert_eq!(decimal_odds_to_probability(0.0), 0.0);
    }

    #[test]
    fn test_calculate_expected_value() {
        // 60% on +150 is a good bet
        let ev = calculate_expected_value(0.6, 2.5);
        assert!((ev - 0.5).abs() < 1e-9);

        // 40% on -150 is not
        let ev = calculate_expected_value(0.4, american_to_decimal(-150));
        assert!(ev < 0.0);
    }

    #[test]
    fn test_over_under_probability() {
        // Projection equal to the line is a coin flip
        let p = over_probability(20.0, 5.0, 20.0);
        assert!((p - 0.5).abs() < 1e-6);

        // One std dev above the line
        let p = over_probability(25.0, 5.0, 20.0);
        assert!((p - 0.8413).abs() < 1e-3);
        let q = under_probability(25.0, 5.0, 20.0);
        assert!((p + q - 1.0).abs() < 1e-9);

        // Degenerate std dev
        assert_eq!(over_probability(10.0, 0.0, 9.5), 1.0);
        assert_eq!(under_probability(10.0, 0.0, 9.5), 0.0);
        assert_eq!(over_probability(10.0, 0.0, 10.0), 0.5);
    }
}
