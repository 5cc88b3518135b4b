//! Largest-remainder rounding of call amounts to currency units.
//!
//! Amounts are truncated to `dp` places and the residual units are handed
//! out one at a time to the largest truncated remainders, so the rounded
//! amounts always sum to `total.round_dp(dp)`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::Money;

/// Finest precision a `Decimal` can carry.
pub const MAX_ROUNDING_DP: u32 = 28;

/// Round `raw` amounts to `dp` decimal places so that they sum exactly to
/// `total` rounded to the same precision. Ties go to the earlier entry.
/// `dp` above [`MAX_ROUNDING_DP`] is treated as `MAX_ROUNDING_DP`.
pub fn largest_remainder(total: Money, raw: &[Money], dp: u32) -> Vec<Money> {
    if raw.is_empty() {
        return Vec::new();
    }
    let dp = dp.min(MAX_ROUNDING_DP);

    let target = total.round_dp(dp);
    let unit = Decimal::new(1, dp);

    let mut rounded: Vec<Money> = raw
        .iter()
        .map(|a| a.round_dp_with_strategy(dp, RoundingStrategy::ToZero))
        .collect();
    let remainders: Vec<Money> = raw.iter().zip(&rounded).map(|(a, r)| *a - *r).collect();

    let floored_sum: Money = rounded.iter().copied().sum();
    let residual_units = ((target - floored_sum) / unit).round().to_i64().unwrap_or(0);

    // Largest remainder first; stable sort keeps input order on ties.
    let mut order: Vec<usize> = (0..raw.len()).collect();
    order.sort_by(|a, b| remainders[*b].cmp(&remainders[*a]));

    if residual_units > 0 {
        for k in 0..residual_units as usize {
            rounded[order[k % order.len()]] += unit;
        }
    } else if residual_units < 0 {
        // Only reachable through precision loss upstream: take units back
        // from the smallest remainders that still hold a unit.
        let mut to_remove = residual_units.unsigned_abs() as usize;
        for idx in order.iter().rev() {
            if to_remove == 0 {
                break;
            }
            if rounded[*idx] >= unit {
                rounded[*idx] -= unit;
                to_remove -= 1;
            }
        }
    }

    rounded
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_thirds_to_cents() {
        let third = dec!(100) / dec!(3);
        let out = largest_remainder(dec!(100), &[third, third, third], 2);
        assert_eq!(out, vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
        assert_eq!(out.iter().copied().sum::<Decimal>(), dec!(100));
    }

    #[test]
    fn test_largest_remainder_wins() {
        // 10.004 / 20.006 / 29.990 -> remainders .004 .006 .000
        let out = largest_remainder(dec!(60), &[dec!(10.004), dec!(20.006), dec!(29.990)], 2);
        assert_eq!(out, vec![dec!(10.00), dec!(20.01), dec!(29.99)]);
    }

    #[test]
    fn test_whole_units() {
        let out = largest_remainder(dec!(10), &[dec!(3.5), dec!(6.5)], 0);
        assert_eq!(out.iter().copied().sum::<Decimal>(), dec!(10));
        assert_eq!(out, vec![dec!(4), dec!(6)]);
    }

    #[test]
    fn test_already_exact() {
        let out = largest_remainder(dec!(1000), &[dec!(600), dec!(400)], 2);
        assert_eq!(out, vec![dec!(600), dec!(400)]);
    }

    #[test]
    fn test_precision_beyond_decimal_scale_is_capped() {
        let third = dec!(1) / dec!(3);
        let out = largest_remainder(dec!(1), &[third, third, third], 40);
        assert_eq!(out.iter().copied().sum::<Decimal>(), dec!(1));
        assert!(out.iter().all(|a| a.scale() <= MAX_ROUNDING_DP));
    }

    #[test]
    fn test_empty() {
        assert!(largest_remainder(dec!(10), &[], 2).is_empty());
    }
}
