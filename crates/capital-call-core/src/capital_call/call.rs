//! Capital call for a fund structure.
//!
//! Chooses the single-level or two-level allocation from the structure's
//! hierarchy flag, then reports the called / uncalled position of the
//! structure before and after the call. Conditions the caller should see
//! before submitting (over-calls, commitment mismatches, nothing to
//! allocate) are reported as warnings rather than errors.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

use super::hierarchical::{split_by_level, LevelBreakdown};
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

/// Input for a capital call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalCallInput {
    /// Structure being called. Without it nothing is allocated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<Structure>,
    pub total_call_amount: Money,
    #[serde(default)]
    pub investors: Vec<CallInvestor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Round call amounts to this many decimal places (2 for cents)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounding_dp: Option<u32>,
    /// Free-text purpose of the call (investment, fees, expenses)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

/// Structure-level position before and after the call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSummary {
    pub investor_count: usize,
    pub total_commitment: Money,
    pub total_called_before: Money,
    pub total_call_amount: Money,
    pub total_called_after: Money,
    pub total_uncalled_after: Money,
    /// Called / commitment before the call (decimal)
    pub called_pct_before: Rate,
    /// Called / commitment after the call (decimal)
    pub called_pct_after: Rate,
    /// Requested amount that could not be allocated
    pub unallocated_amount: Money,
}

impl CallSummary {
    fn empty(total_call_amount: Money) -> Self {
        CallSummary {
            investor_count: 0,
            total_commitment: Decimal::ZERO,
            total_called_before: Decimal::ZERO,
            total_call_amount: Decimal::ZERO,
            total_called_after: Decimal::ZERO,
            total_uncalled_after: Decimal::ZERO,
            called_pct_before: Decimal::ZERO,
            called_pct_after: Decimal::ZERO,
            unallocated_amount: total_call_amount,
        }
    }
}

/// Output of a capital call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalCallOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure_name: Option<String>,
    pub currency: Currency,
    /// True when the two-level allocation was used
    pub multi_level: bool,
    pub allocations: Vec<InvestorAllocation>,
    pub summary: CallSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub levels: Option<LevelBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Days between call date and due date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice_days: Option<i64>,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Compute a capital call for a structure and its investors.
pub fn calculate_capital_call(
    input: &CapitalCallInput,
) -> CapitalCallResult<ComputationOutput<CapitalCallOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_call_amount(input.total_call_amount)?;
    validate_rounding_dp(input.rounding_dp)?;
    validate_investors(&input.investors)?;
    let notice_days = validate_dates(input.call_date, input.due_date)?;

    let structure = match &input.structure {
        Some(s) => s,
        None => {
            push_warning(
                &mut warnings,
                "No structure selected; nothing allocated".to_string(),
            );
            let output = empty_output(input, None, notice_days);
            return Ok(finish(input, "None", warnings, start, output));
        }
    };

    if input.investors.is_empty() {
        push_warning(
            &mut warnings,
            format!("Structure '{}' has no investors; nothing allocated", structure.name),
        );
        let output = empty_output(input, Some(structure), notice_days);
        return Ok(finish(input, "None", warnings, start, output));
    }

    let multi_level = structure.is_multi_level_master();
    tracing::debug!(
        target: "capital_call",
        structure = %structure.id,
        multi_level,
        investors = input.investors.len(),
        "calculating capital call"
    );

    let (allocations, levels, unallocated) = if multi_level {
        let out = split_by_level(
            input.total_call_amount,
            &input.investors,
            input.rounding_dp,
            &mut warnings,
        )?;
        (out.allocations, Some(out.levels), out.unallocated)
    } else {
        let members: Vec<&CallInvestor> = input.investors.iter().collect();
        let allocations = allocate_group(input.total_call_amount, &members, input.rounding_dp);
        let commitment: Money = input.investors.iter().map(|i| i.commitment).sum();
        let unallocated = if commitment.is_zero() {
            input.total_call_amount
        } else {
            Decimal::ZERO
        };
        if unallocated > Decimal::ZERO {
            push_warning(
                &mut warnings,
                format!(
                    "Total commitment is zero; call of {} cannot be allocated",
                    input.total_call_amount
                ),
            );
        }
        (allocations, None, unallocated)
    };

    let summary = summarise(&allocations, unallocated);
    check_structure(structure, &summary, &mut warnings);
    check_over_calls(&input.investors, &allocations, &mut warnings);

    let output = CapitalCallOutput {
        structure_id: Some(structure.id.clone()),
        structure_name: Some(structure.name.clone()),
        currency: structure.currency.clone(),
        multi_level,
        allocations,
        summary,
        levels,
        call_date: input.call_date,
        due_date: input.due_date,
        notice_days,
    };

    let methodology = if multi_level {
        "Two-level"
    } else {
        "Pro-rata"
    };
    Ok(finish(input, methodology, warnings, start, output))
}

fn summarise(allocations: &[InvestorAllocation], unallocated: Money) -> CallSummary {
    let total_commitment: Money = allocations.iter().map(|a| a.commitment).sum();
    let total_called_before: Money = allocations.iter().map(|a| a.called_to_date).sum();
    let total_call_amount: Money = allocations.iter().map(|a| a.call_amount).sum();
    let total_called_after = total_called_before + total_call_amount;

    let (called_pct_before, called_pct_after) = if total_commitment.is_zero() {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        (
            total_called_before / total_commitment,
            total_called_after / total_commitment,
        )
    };

    CallSummary {
        investor_count: allocations.len(),
        total_commitment,
        total_called_before,
        total_call_amount,
        total_called_after,
        total_uncalled_after: total_commitment - total_called_after,
        called_pct_before,
        called_pct_after,
        unallocated_amount: unallocated,
    }
}

fn check_structure(structure: &Structure, summary: &CallSummary, warnings: &mut Vec<String>) {
    if !structure.total_commitment.is_zero()
        && structure.total_commitment != summary.total_commitment
    {
        push_warning(
            warnings,
            format!(
                "Investor commitments total {} but structure '{}' reports {}",
                summary.total_commitment, structure.name, structure.total_commitment
            ),
        );
    }
    if summary.total_uncalled_after < Decimal::ZERO {
        push_warning(
            warnings,
            format!(
                "Call exceeds remaining uncalled commitment by {}",
                -summary.total_uncalled_after
            ),
        );
    }
}

/// Warn for the part of each call that exceeds what the investor still had
/// unfunded. Overage carried in from earlier calls is not counted again.
fn check_over_calls(
    investors: &[CallInvestor],
    allocations: &[InvestorAllocation],
    warnings: &mut Vec<String>,
) {
    let by_id: HashMap<&str, &CallInvestor> =
        investors.iter().map(|i| (i.id.as_str(), i)).collect();
    for a in allocations {
        let Some(investor) = by_id.get(a.investor_id.as_str()) else {
            continue;
        };
        let excess = a.call_amount - investor.unfunded().max(Decimal::ZERO);
        if excess > Decimal::ZERO {
            push_warning(
                warnings,
                format!(
                    "Investor '{}' is called {} beyond its remaining commitment",
                    a.investor_name, excess
                ),
            );
        }
    }
}

fn empty_output(
    input: &CapitalCallInput,
    structure: Option<&Structure>,
    notice_days: Option<i64>,
) -> CapitalCallOutput {
    CapitalCallOutput {
        structure_id: structure.map(|s| s.id.clone()),
        structure_name: structure.map(|s| s.name.clone()),
        currency: structure.map(|s| s.currency.clone()).unwrap_or_default(),
        multi_level: structure.is_some_and(Structure::is_multi_level_master),
        allocations: Vec::new(),
        summary: CallSummary::empty(input.total_call_amount),
        levels: None,
        call_date: input.call_date,
        due_date: input.due_date,
        notice_days,
    }
}

fn finish(
    input: &CapitalCallInput,
    methodology: &str,
    warnings: Vec<String>,
    start: Instant,
    output: CapitalCallOutput,
) -> ComputationOutput<CapitalCallOutput> {
    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        &format!("Capital call ({methodology} allocation)"),
        &serde_json::json!({
            "total_call_amount": input.total_call_amount.to_string(),
            "investor_count": input.investors.len(),
            "rounding_dp": input.rounding_dp,
            "purpose": input.purpose,
        }),
        warnings,
        elapsed,
        output,
    )
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_dates(
    call: Option<NaiveDate>,
    due: Option<NaiveDate>,
) -> CapitalCallResult<Option<i64>> {
    match (call, due) {
        (Some(c), Some(d)) if d < c => Err(CapitalCallError::DateError(format!(
            "Due date {d} is before call date {c}"
        ))),
        (Some(c), Some(d)) => Ok(Some((d - c).num_days())),
        _ => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fund(level: Option<u8>) -> Structure {
        Structure {
            id: "S1".into(),
            name: "Growth Fund I".into(),
            total_commitment: dec!(1000000),
            hierarchy_level: level,
            parent_structure_id: None,
            currency: Currency::USD,
        }
    }

    fn default_input() -> CapitalCallInput {
        CapitalCallInput {
            structure: Some(fund(None)),
            total_call_amount: dec!(250000),
            investors: vec![
                CallInvestor::new("A", "Alpha", dec!(600000), dec!(120000)),
                CallInvestor::new("B", "Beta", dec!(400000), dec!(80000)),
            ],
            call_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 15),
            rounding_dp: Some(2),
            purpose: Some("Follow-on investment".into()),
        }
    }

    #[test]
    fn test_flat_call_summary() {
        let out = calculate_capital_call(&default_input()).unwrap();
        let r = &out.result;
        assert!(!r.multi_level);
        assert_eq!(r.allocations[0].call_amount, dec!(150000));
        assert_eq!(r.allocations[1].call_amount, dec!(100000));
        assert_eq!(r.summary.total_called_before, dec!(200000));
        assert_eq!(r.summary.total_called_after, dec!(450000));
        assert_eq!(r.summary.total_uncalled_after, dec!(550000));
        assert_eq!(r.summary.called_pct_before, dec!(0.2));
        assert_eq!(r.summary.called_pct_after, dec!(0.45));
        assert_eq!(r.notice_days, Some(14));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_missing_structure_yields_empty() {
        let mut input = default_input();
        input.structure = None;
        let out = calculate_capital_call(&input).unwrap();
        assert!(out.result.allocations.is_empty());
        assert_eq!(out.result.summary.unallocated_amount, dec!(250000));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_no_investors_yields_empty() {
        let mut input = default_input();
        input.investors.clear();
        let out = calculate_capital_call(&input).unwrap();
        assert!(out.result.allocations.is_empty());
        assert_eq!(out.result.structure_id.as_deref(), Some("S1"));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_master_structure_uses_levels() {
        let mut input = default_input();
        input.structure = Some(fund(Some(1)));
        input.investors[1].hierarchy_level = Some(2);
        input.investors[1].ownership_percent = Some(dec!(25));
        let out = calculate_capital_call(&input).unwrap();
        let r = &out.result;
        assert!(r.multi_level);
        let levels = r.levels.as_ref().unwrap();
        assert_eq!(levels.intermediate.call_share, dec!(62500));
        assert_eq!(levels.master.call_share, dec!(187500));
        assert_eq!(r.allocations[0].investor_id, "B");
    }

    #[test]
    fn test_level_tags_ignored_without_master_flag() {
        let mut input = default_input();
        input.investors[1].hierarchy_level = Some(2);
        input.investors[1].ownership_percent = Some(dec!(25));
        let out = calculate_capital_call(&input).unwrap();
        assert!(out.result.levels.is_none());
        assert_eq!(out.result.allocations[1].call_amount, dec!(100000));
    }

    #[test]
    fn test_over_call_warns() {
        let mut input = default_input();
        input.total_call_amount = dec!(900000);
        let out = calculate_capital_call(&input).unwrap();
        assert!(out.result.summary.total_uncalled_after < Decimal::ZERO);
        // structure-level warning plus one per investor
        assert_eq!(out.warnings.len(), 3);
    }

    #[test]
    fn test_over_call_counts_only_this_call() {
        // Beta was already called 50,000 past its commitment
        let mut input = default_input();
        input.total_call_amount = dec!(100000);
        input.investors[1].called_to_date = dec!(450000);
        let out = calculate_capital_call(&input).unwrap();
        assert_eq!(out.result.allocations[1].call_amount, dec!(40000));
        assert_eq!(out.result.allocations[1].uncalled_capital, dec!(-90000));
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("'Beta'"));
        assert!(out.warnings[0].contains("called 40000"));
    }

    #[test]
    fn test_partial_over_call_reports_excess() {
        // Alpha has 480,000 unfunded and is called 540,000
        let mut input = default_input();
        input.total_call_amount = dec!(900000);
        let out = calculate_capital_call(&input).unwrap();
        let alpha = out.warnings.iter().find(|w| w.contains("'Alpha'")).unwrap();
        assert!(alpha.contains("called 60000"));
    }

    #[test]
    fn test_reject_rounding_beyond_decimal_scale() {
        let mut input = default_input();
        input.rounding_dp = Some(29);
        assert!(matches!(
            calculate_capital_call(&input),
            Err(CapitalCallError::InvalidInput { ref field, .. }) if field == "rounding_dp"
        ));
    }

    #[test]
    fn test_commitment_mismatch_warns() {
        let mut input = default_input();
        if let Some(s) = input.structure.as_mut() {
            s.total_commitment = dec!(2000000);
        }
        let out = calculate_capital_call(&input).unwrap();
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_rounded_call_exact() {
        let mut input = default_input();
        input.total_call_amount = dec!(100000.01);
        input.investors.push(CallInvestor::new("C", "Gamma", dec!(333333), Decimal::ZERO));
        if let Some(s) = input.structure.as_mut() {
            s.total_commitment = dec!(1333333);
        }
        let out = calculate_capital_call(&input).unwrap();
        assert_eq!(out.result.summary.total_call_amount, dec!(100000.01));
        for a in &out.result.allocations {
            assert!(a.call_amount.scale() <= 2);
        }
    }

    #[test]
    fn test_reject_due_before_call() {
        let mut input = default_input();
        input.due_date = NaiveDate::from_ymd_opt(2024, 2, 1);
        assert!(matches!(
            calculate_capital_call(&input),
            Err(CapitalCallError::DateError(_))
        ));
    }

    #[test]
    fn test_reject_negative_total() {
        let mut input = default_input();
        input.total_call_amount = dec!(-10);
        assert!(calculate_capital_call(&input).is_err());
    }

    #[test]
    fn test_json_input_defaults() {
        let json = r#"{
            "structure": {"id": "S9", "name": "Fund IX", "total_commitment": "100"},
            "total_call_amount": "10",
            "investors": [{"id": "X", "name": "X", "commitment": "100"}]
        }"#;
        let input: CapitalCallInput = serde_json::from_str(json).unwrap();
        let out = calculate_capital_call(&input).unwrap();
        assert_eq!(out.result.allocations[0].call_amount, dec!(10));
        assert_eq!(out.result.currency, Currency::USD);
    }
}
