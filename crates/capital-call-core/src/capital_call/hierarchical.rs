//! Two-level capital call for multi-level (master / intermediate) structures.
//!
//! The intermediate level is called first: its share of the call is
//! `total * sum(level-2 ownership %) / 100`. The master level receives the
//! remainder. Within each level the share is distributed pro-rata to
//! commitment, scoped to that level's commitment subtotal.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::pro_rata::{
    allocate_group, validate_call_amount, validate_investors, validate_rounding_dp,
};
use super::{push_warning, InvestorAllocation};
use crate::error::CapitalCallError;
use crate::types::*;
use crate::CapitalCallResult;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// Input for a two-level allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchicalInput {
    pub total_call_amount: Money,
    /// Investors tagged with `hierarchy_level` (untagged = master level)
    pub investors: Vec<CallInvestor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounding_dp: Option<u32>,
}

/// Totals for one hierarchy level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub hierarchy_level: u8,
    pub investor_count: usize,
    /// Sum of ownership percent points of the level's investors
    pub ownership_percent: Percent,
    pub total_commitment: Money,
    /// Portion of the call attributed to this level
    pub call_share: Money,
    /// Portion actually distributed to investors
    pub allocated: Money,
    /// Portion the level could not absorb (no commitment)
    pub unallocated: Money,
}

/// Per-level breakdown of a hierarchical call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelBreakdown {
    pub intermediate: LevelSummary,
    pub master: LevelSummary,
}

/// Result of a hierarchical allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchicalOutput {
    /// Level-2 allocations first, then level 1
    pub allocations: Vec<InvestorAllocation>,
    pub levels: LevelBreakdown,
    pub total_allocated: Money,
    pub unallocated: Money,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Allocate a capital call across the intermediate and master levels.
pub fn allocate_hierarchical(
    input: &HierarchicalInput,
) -> CapitalCallResult<ComputationOutput<HierarchicalOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_call_amount(input.total_call_amount)?;
    validate_rounding_dp(input.rounding_dp)?;
    validate_investors(&input.investors)?;

    let output = split_by_level(
        input.total_call_amount,
        &input.investors,
        input.rounding_dp,
        &mut warnings,
    )?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Two-level capital call: intermediate level by ownership, master level residual, pro-rata within level",
        &serde_json::json!({
            "total_call_amount": input.total_call_amount.to_string(),
            "investor_count": input.investors.len(),
            "rounding_dp": input.rounding_dp,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Partition investors by level and allocate each level its share.
/// Inputs are assumed validated.
pub(crate) fn split_by_level(
    total_call_amount: Money,
    investors: &[CallInvestor],
    rounding_dp: Option<u32>,
    warnings: &mut Vec<String>,
) -> CapitalCallResult<HierarchicalOutput> {
    let mut intermediate: Vec<&CallInvestor> = Vec::new();
    let mut master: Vec<&CallInvestor> = Vec::new();
    for inv in investors {
        match level_of(inv)? {
            HierarchyLevel::Intermediate => intermediate.push(inv),
            HierarchyLevel::Master => master.push(inv),
        }
    }

    let intermediate_pct: Percent = intermediate
        .iter()
        .map(|i| i.ownership_percent.unwrap_or(Decimal::ZERO))
        .sum();
    if intermediate_pct > dec!(100) {
        return Err(CapitalCallError::invalid(
            "investors.ownership_percent",
            format!("Level-2 ownership totals {intermediate_pct}%, above 100%"),
        ));
    }

    let total = match rounding_dp {
        Some(dp) => total_call_amount.round_dp(dp),
        None => total_call_amount,
    };
    let raw_intermediate_share = total * intermediate_pct / dec!(100);
    let intermediate_share = match rounding_dp {
        Some(dp) => raw_intermediate_share.round_dp(dp),
        None => raw_intermediate_share,
    };
    let master_share = total - intermediate_share;

    tracing::debug!(
        target: "capital_call",
        intermediate = intermediate.len(),
        master = master.len(),
        %intermediate_share,
        %master_share,
        "split call by hierarchy level"
    );

    let (intermediate_allocs, intermediate_summary) = allocate_level(
        HierarchyLevel::Intermediate,
        intermediate_share,
        &intermediate,
        rounding_dp,
        warnings,
    );
    let (master_allocs, master_summary) = allocate_level(
        HierarchyLevel::Master,
        master_share,
        &master,
        rounding_dp,
        warnings,
    );

    let total_allocated = intermediate_summary.allocated + master_summary.allocated;
    let unallocated = intermediate_summary.unallocated + master_summary.unallocated;

    let mut allocations = intermediate_allocs;
    allocations.extend(master_allocs);

    Ok(HierarchicalOutput {
        allocations,
        levels: LevelBreakdown {
            intermediate: intermediate_summary,
            master: master_summary,
        },
        total_allocated,
        unallocated,
    })
}

fn allocate_level(
    level: HierarchyLevel,
    share: Money,
    members: &[&CallInvestor],
    rounding_dp: Option<u32>,
    warnings: &mut Vec<String>,
) -> (Vec<InvestorAllocation>, LevelSummary) {
    let allocations = allocate_group(share, members, rounding_dp);
    let total_commitment: Money = members.iter().map(|i| i.commitment).sum();
    let allocated: Money = allocations.iter().map(|a| a.call_amount).sum();

    let unallocated = if total_commitment.is_zero() {
        share
    } else {
        Decimal::ZERO
    };
    if unallocated > Decimal::ZERO {
        push_warning(
            warnings,
            format!(
                "Level {} has no commitment to absorb its share of {}; amount left unallocated",
                level.as_number(),
                share
            ),
        );
    }

    let summary = LevelSummary {
        hierarchy_level: level.as_number(),
        investor_count: members.len(),
        ownership_percent: members
            .iter()
            .map(|i| i.ownership_percent.unwrap_or(Decimal::ZERO))
            .sum(),
        total_commitment,
        call_share: share,
        allocated,
        unallocated,
    };
    (allocations, summary)
}

fn level_of(investor: &CallInvestor) -> CapitalCallResult<HierarchyLevel> {
    match investor.hierarchy_level {
        None => Ok(HierarchyLevel::Master),
        Some(n) => HierarchyLevel::from_number(n).ok_or_else(|| {
            CapitalCallError::invalid(
                format!("investors[{}].hierarchy_level", investor.id),
                format!("Unsupported hierarchy level {n}; expected 1 or 2"),
            )
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Decimal, b: Decimal, eps: Decimal) -> bool {
        (a - b).abs() < eps
    }

    fn tagged(id: &str, commitment: Decimal, level: u8, pct: Option<Decimal>) -> CallInvestor {
        let mut inv = CallInvestor::new(id, id, commitment, Decimal::ZERO);
        inv.hierarchy_level = Some(level);
        inv.ownership_percent = pct;
        inv
    }

    fn default_input() -> HierarchicalInput {
        HierarchicalInput {
            total_call_amount: dec!(1000000),
            investors: vec![
                tagged("M1", dec!(3000000), 1, Some(dec!(30))),
                tagged("M2", dec!(1000000), 1, Some(dec!(10))),
                tagged("F1", dec!(4000000), 2, Some(dec!(40))),
                tagged("F2", dec!(2000000), 2, Some(dec!(20))),
            ],
            rounding_dp: None,
        }
    }

    #[test]
    fn test_level_shares() {
        let out = allocate_hierarchical(&default_input()).unwrap();
        let levels = &out.result.levels;
        assert_eq!(levels.intermediate.call_share, dec!(600000));
        assert_eq!(levels.master.call_share, dec!(400000));
        assert_eq!(levels.intermediate.ownership_percent, dec!(60));
    }

    #[test]
    fn test_pro_rata_within_level() {
        let out = allocate_hierarchical(&default_input()).unwrap();
        let a = &out.result.allocations;
        // Level 2 first: F1, F2 then M1, M2
        assert_eq!(a[0].investor_id, "F1");
        assert_eq!(a[0].call_amount, dec!(400000));
        assert_eq!(a[1].call_amount, dec!(200000));
        assert_eq!(a[2].investor_id, "M1");
        assert_eq!(a[2].call_amount, dec!(300000));
        assert_eq!(a[3].call_amount, dec!(100000));
    }

    #[test]
    fn test_levels_sum_to_total() {
        let mut input = default_input();
        input.total_call_amount = dec!(777777.77);
        input.investors[2].ownership_percent = Some(dec!(33.3));
        let out = allocate_hierarchical(&input).unwrap();
        let total: Decimal = out.result.allocations.iter().map(|a| a.call_amount).sum();
        assert!(approx_eq(total, dec!(777777.77), dec!(0.000000001)));
        let lvl2: Decimal = out
            .result
            .allocations
            .iter()
            .filter(|a| a.hierarchy_level == Some(2))
            .map(|a| a.call_amount)
            .sum();
        let expected = dec!(777777.77) * dec!(53.3) / dec!(100);
        assert!(approx_eq(lvl2, expected, dec!(0.000000001)));
    }

    #[test]
    fn test_rounded_levels_exact() {
        let mut input = default_input();
        input.total_call_amount = dec!(1000);
        input.investors[2].ownership_percent = Some(dec!(33.3333));
        input.rounding_dp = Some(2);
        let out = allocate_hierarchical(&input).unwrap();
        let total: Decimal = out.result.allocations.iter().map(|a| a.call_amount).sum();
        assert_eq!(total, dec!(1000));
        let level = &out.result.levels.intermediate;
        assert_eq!(level.allocated, level.call_share);
    }

    #[test]
    fn test_untagged_treated_as_master() {
        let mut input = default_input();
        input.investors[0].hierarchy_level = None;
        let out = allocate_hierarchical(&input).unwrap();
        assert_eq!(out.result.levels.master.investor_count, 2);
    }

    #[test]
    fn test_no_intermediate_investors() {
        let mut input = default_input();
        input.investors.truncate(2);
        let out = allocate_hierarchical(&input).unwrap();
        assert_eq!(out.result.levels.intermediate.call_share, Decimal::ZERO);
        assert_eq!(out.result.levels.master.call_share, dec!(1000000));
        assert_eq!(out.result.allocations[0].call_amount, dec!(750000));
    }

    #[test]
    fn test_empty_master_level_unallocated() {
        let mut input = default_input();
        input.investors.drain(0..2);
        let out = allocate_hierarchical(&input).unwrap();
        assert_eq!(out.result.unallocated, dec!(400000));
        assert_eq!(out.result.total_allocated, dec!(600000));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_reject_level_two_over_100() {
        let mut input = default_input();
        input.investors[2].ownership_percent = Some(dec!(90));
        assert!(allocate_hierarchical(&input).is_err());
    }

    #[test]
    fn test_reject_unknown_level() {
        let mut input = default_input();
        input.investors[0].hierarchy_level = Some(3);
        assert!(allocate_hierarchical(&input).is_err());
    }

    #[test]
    fn test_reject_rounding_beyond_decimal_scale() {
        let mut input = default_input();
        input.rounding_dp = Some(29);
        assert!(allocate_hierarchical(&input).is_err());
    }

    #[test]
    fn test_zero_call() {
        let mut input = default_input();
        input.total_call_amount = Decimal::ZERO;
        let out = allocate_hierarchical(&input).unwrap();
        assert!(out.result.allocations.iter().all(|a| a.call_amount.is_zero()));
        assert!(out.warnings.is_empty());
    }
}
