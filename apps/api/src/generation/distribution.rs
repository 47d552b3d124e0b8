//! Percentages → exact per-level question counts.
//!
//! Each level gets `round(pct × total / 100)`. The rounding drift is then put on
//! Apply so the counts sum to `total` exactly. When Apply cannot absorb a
//! negative drift, the remainder comes off the largest buckets (ties go to the
//! higher level).

use crate::models::{BloomBuckets, BloomLevel};

/// Bucket that absorbs rounding drift.
pub const OVERFLOW_LEVEL: BloomLevel = BloomLevel::Apply;

/// Computes per-level counts that sum to exactly `total`.
///
/// `percentages` is expected to sum to 100 (checked by intent validation); the
/// postcondition holds regardless.
pub fn compute_bloom_counts(percentages: &BloomBuckets, total: u32) -> BloomBuckets {
    let mut counts = BloomBuckets::default();
    for (level, pct) in percentages.iter() {
        let exact = f64::from(pct) * f64::from(total) / 100.0;
        counts.set(level, exact.round() as u32);
    }

    let drift = i64::from(total) - counts.total() as i64;
    if drift >= 0 {
        let apply = counts.get(OVERFLOW_LEVEL);
        counts.set(OVERFLOW_LEVEL, apply + drift as u32);
        return counts;
    }

    let mut excess = drift.unsigned_abs() as u32;
    let apply = counts.get(OVERFLOW_LEVEL);
    let taken = apply.min(excess);
    counts.set(OVERFLOW_LEVEL, apply - taken);
    excess -= taken;

    while excess > 0 {
        // Largest bucket first; on ties the higher level gives up a question.
        let Some((level, value)) = counts
            .iter()
            .filter(|(_, v)| *v > 0)
            .max_by_key(|(level, v)| (*v, level.number()))
        else {
            break;
        };
        counts.set(level, value - 1);
        excess -= 1;
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pct(values: [u32; 6]) -> BloomBuckets {
        BloomBuckets::new(values)
    }

    #[test]
    fn test_reference_scenario_sums_to_ten() {
        let counts = compute_bloom_counts(&pct([30, 30, 20, 10, 5, 5]), 10);
        assert_eq!(counts.total(), 10);
        assert_eq!(counts.get(BloomLevel::Remember), 3);
        assert_eq!(counts.get(BloomLevel::Understand), 3);
        assert_eq!(counts.get(BloomLevel::Analyze), 1);
        // 0.5 rounds up for Evaluate and Create, so Apply gives one back.
        assert_eq!(counts.get(BloomLevel::Apply), 1);
    }

    #[test]
    fn test_positive_drift_goes_to_apply() {
        // 3 × 33.3% of 10 → 3.3 each rounds down; drift +1 lands on Apply.
        let counts = compute_bloom_counts(&pct([33, 33, 0, 34, 0, 0]), 10);
        assert_eq!(counts.total(), 10);
        assert_eq!(counts.get(BloomLevel::Apply), 1);
    }

    #[test]
    fn test_negative_drift_without_apply_takes_from_largest() {
        // 50/50 split across Evaluate/Create at 1 question: both round 0.5 → 1.
        let counts = compute_bloom_counts(&pct([0, 0, 0, 0, 50, 50]), 1);
        assert_eq!(counts.total(), 1);
        assert_eq!(counts.get(BloomLevel::Apply), 0);
        // Tie goes to the higher level giving one up.
        assert_eq!(counts.get(BloomLevel::Create), 0);
        assert_eq!(counts.get(BloomLevel::Evaluate), 1);
    }

    #[test]
    fn test_exact_sum_for_many_distributions() {
        let distributions = [
            [100, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 100],
            [17, 17, 17, 17, 16, 16],
            [30, 30, 20, 10, 5, 5],
            [5, 5, 5, 5, 40, 40],
            [1, 1, 1, 1, 1, 95],
            [25, 25, 0, 25, 25, 0],
            [10, 20, 30, 20, 15, 5],
        ];
        for values in distributions {
            for total in 1..=100 {
                let counts = compute_bloom_counts(&pct(values), total);
                assert_eq!(
                    counts.total(),
                    u64::from(total),
                    "distribution {values:?} with {total} questions"
                );
            }
        }
    }

    #[test]
    fn test_zero_percent_levels_stay_empty_when_no_drift() {
        let counts = compute_bloom_counts(&pct([50, 50, 0, 0, 0, 0]), 10);
        assert_eq!(counts.get(BloomLevel::Create), 0);
        assert_eq!(counts.get(BloomLevel::Apply), 0);
        assert_eq!(counts.total(), 10);
    }
}
