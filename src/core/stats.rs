use super::{QuantileRow, QuantileTable, RiskSummary};

/// Linearly interpolated order statistic at level `q` (clamped to `[0, 1]`).
pub fn quantile(outcomes: &[f64], q: f64) -> f64 {
    let mut sorted = outcomes.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    quantile_sorted(&sorted, q)
}

/// Sorts once and evaluates every level against the same sorted values.
pub fn quantile_table(outcomes: &[f64], levels: &[f64]) -> QuantileTable {
    let mut sorted = outcomes.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    QuantileTable {
        rows: levels
            .iter()
            .map(|&level| QuantileRow {
                level,
                value: quantile_sorted(&sorted, level),
            })
            .collect(),
    }
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }

    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let base = pos.floor() as usize;
    let frac = pos - base as f64;

    match sorted.get(base + 1) {
        Some(&next) => sorted[base] + frac * (next - sorted[base]),
        None => sorted[base],
    }
}

/// Share of outcomes strictly below `threshold`.
pub fn ruin_probability(outcomes: &[f64], threshold: f64) -> f64 {
    if outcomes.is_empty() {
        return 0.0;
    }
    ruin_count(outcomes, threshold) as f64 / outcomes.len() as f64
}

fn ruin_count(outcomes: &[f64], threshold: f64) -> usize {
    outcomes.iter().filter(|&&x| x < threshold).count()
}

pub fn risk_summary(outcomes: &[f64], threshold: f64) -> RiskSummary {
    if outcomes.is_empty() {
        return RiskSummary {
            ruin_probability: 0.0,
            ruin_count: 0,
            trials: 0,
            mean_final_level: 0.0,
            min_final_level: 0.0,
            max_final_level: 0.0,
        };
    }

    let n = outcomes.len();
    let (min, max, sum) = outcomes.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0),
        |(min, max, sum), &x| (min.min(x), max.max(x), sum + x),
    );

    RiskSummary {
        ruin_probability: ruin_probability(outcomes, threshold),
        ruin_count: ruin_count(outcomes, threshold),
        trials: n,
        mean_final_level: sum / n as f64,
        min_final_level: min,
        max_final_level: max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::QUANTILE_LEVELS;
    use proptest::collection::vec;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn quantile_hits_order_statistics_exactly() {
        let outcomes = [5.0, 3.0, 1.0, 4.0, 2.0];
        assert_approx(quantile(&outcomes, 0.5), 3.0);
        assert_approx(quantile(&outcomes, 0.0), 1.0);
        assert_approx(quantile(&outcomes, 1.0), 5.0);
    }

    #[test]
    fn quantile_interpolates_between_points() {
        let outcomes = [1.0, 2.0, 3.0, 4.0];
        assert_approx(quantile(&outcomes, 0.25), 1.75);
        assert_approx(quantile(&outcomes, 0.95), 3.85);
    }

    #[test]
    fn quantile_handles_single_and_empty_input() {
        assert_approx(quantile(&[7.0], 0.3), 7.0);
        assert_approx(quantile(&[], 0.5), 0.0);
    }

    #[test]
    fn quantile_clamps_levels_outside_unit_interval() {
        let outcomes = [1.0, 2.0, 3.0];
        assert_approx(quantile(&outcomes, -0.5), 1.0);
        assert_approx(quantile(&outcomes, 1.5), 3.0);
    }

    #[test]
    fn quantile_table_matches_individual_quantiles() {
        let outcomes = [0.0, 12.0, 3.0, 8.0, 5.5, 1.0, 20.0];
        let table = quantile_table(&outcomes, &QUANTILE_LEVELS);
        assert_eq!(table.rows.len(), QUANTILE_LEVELS.len());
        for row in &table.rows {
            assert_approx(row.value, quantile(&outcomes, row.level));
        }
    }

    #[test]
    fn ruin_probability_counts_strictly_below_threshold() {
        assert_approx(ruin_probability(&[0.5, 2.0, 1.5, 0.9], 1.0), 0.5);
        assert_approx(ruin_probability(&[1.0, 1.0], 1.0), 0.0);
        assert_approx(ruin_probability(&[], 1.0), 0.0);
    }

    #[test]
    fn risk_summary_reports_extremes_and_mean() {
        let summary = risk_summary(&[0.5, 2.0, 1.5, 0.9], 1.0);
        assert_approx(summary.ruin_probability, 0.5);
        assert_eq!(summary.ruin_count, 2);
        assert_eq!(summary.trials, 4);
        assert_approx(summary.mean_final_level, 1.225);
        assert_approx(summary.min_final_level, 0.5);
        assert_approx(summary.max_final_level, 2.0);
    }

    #[test]
    fn risk_summary_agrees_with_ruin_probability() {
        let outcomes = [0.0, 0.99, 1.0, 3.0, 0.5, 7.0, 1.01];
        for threshold in [0.5, 1.0, 2.0] {
            let summary = risk_summary(&outcomes, threshold);
            assert_approx(summary.ruin_probability, ruin_probability(&outcomes, threshold));
            assert_approx(
                summary.ruin_count as f64 / summary.trials as f64,
                summary.ruin_probability,
            );
        }
    }

    proptest! {
        #[test]
        fn prop_quantiles_are_monotone(values in vec(-100.0f64..100.0, 1..50), a in 0.0f64..1.0, b in 0.0f64..1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(quantile(&values, lo) <= quantile(&values, hi) + 1e-9);
        }

        #[test]
        fn prop_quantile_stays_within_sample_range(values in vec(-100.0f64..100.0, 1..50), q in 0.0f64..=1.0) {
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let v = quantile(&values, q);
            prop_assert!(v >= min - 1e-9 && v <= max + 1e-9);
        }

        #[test]
        fn prop_ruin_probability_is_a_fraction(values in vec(-5.0f64..5.0, 0..50)) {
            let p = ruin_probability(&values, 1.0);
            prop_assert!((0.0..=1.0).contains(&p));
        }
    }
}
