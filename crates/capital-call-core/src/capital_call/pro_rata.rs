//! Pro-rata capital call allocation.
//!
//! Each investor is called for `total_call_amount * commitment / total_commitment`.
//! A zero total commitment (or an empty investor list) yields zero calls
//! rather than an error.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::rounding::{largest_remainder, MAX_ROUNDING_DP};
use super::{push_warning, InvestorAllocation};
use crate::error::CapitalCallError;
use crate::types::*;
use crate::CapitalCallResult;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// Input for a single-level pro-rata allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProRataInput {
    /// Total amount to call across all investors
    pub total_call_amount: Money,
    /// Investors sharing the call
    pub investors: Vec<CallInvestor>,
    /// Round call amounts to this many decimal places
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounding_dp: Option<u32>,
}

/// Result of a pro-rata allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProRataOutput {
    pub allocations: Vec<InvestorAllocation>,
    /// Sum of investor commitments
    pub total_commitment: Money,
    /// Sum of computed call amounts
    pub total_allocated: Money,
    /// Part of the call no investor could absorb (zero commitment)
    pub unallocated: Money,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Distribute a capital call pro-rata to commitment.
pub fn allocate_pro_rata(
    input: &ProRataInput,
) -> CapitalCallResult<ComputationOutput<ProRataOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_call_amount(input.total_call_amount)?;
    validate_rounding_dp(input.rounding_dp)?;
    validate_investors(&input.investors)?;

    let members: Vec<&CallInvestor> = input.investors.iter().collect();
    let allocations = allocate_group(input.total_call_amount, &members, input.rounding_dp);

    let total_commitment: Money = input.investors.iter().map(|i| i.commitment).sum();
    let total_allocated: Money = allocations.iter().map(|a| a.call_amount).sum();
    let unallocated = if total_commitment.is_zero() {
        input.total_call_amount
    } else {
        Decimal::ZERO
    };

    if total_commitment.is_zero() && input.total_call_amount > Decimal::ZERO {
        push_warning(
            &mut warnings,
            format!(
                "Total commitment is zero; call of {} cannot be allocated",
                input.total_call_amount
            ),
        );
    }

    let output = ProRataOutput {
        allocations,
        total_commitment,
        total_allocated,
        unallocated,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Pro-rata capital call by share of commitment",
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

/// Pro-rata call amounts for a list of investors, without validation or
/// envelope. Returns zero calls when the total commitment is zero.
pub fn pro_rata_shares(
    total_call_amount: Money,
    investors: &[CallInvestor],
) -> Vec<InvestorAllocation> {
    let members: Vec<&CallInvestor> = investors.iter().collect();
    allocate_group(total_call_amount, &members, None)
}

/// Allocate `group_call` across one group of investors, scoped to the
/// group's own commitment subtotal.
pub(crate) fn allocate_group(
    group_call: Money,
    members: &[&CallInvestor],
    rounding_dp: Option<u32>,
) -> Vec<InvestorAllocation> {
    let group_commitment: Money = members.iter().map(|i| i.commitment).sum();

    let shares: Vec<Rate> = members
        .iter()
        .map(|i| {
            if group_commitment.is_zero() {
                Decimal::ZERO
            } else {
                i.commitment / group_commitment
            }
        })
        .collect();

    let raw_amounts: Vec<Money> = members
        .iter()
        .map(|i| {
            if group_commitment.is_zero() {
                Decimal::ZERO
            } else {
                group_call * i.commitment / group_commitment
            }
        })
        .collect();

    let amounts = match rounding_dp {
        Some(dp) if !group_commitment.is_zero() => largest_remainder(group_call, &raw_amounts, dp),
        _ => raw_amounts,
    };

    tracing::debug!(
        target: "capital_call",
        investors = members.len(),
        %group_call,
        %group_commitment,
        "allocated group pro-rata"
    );

    members
        .iter()
        .zip(shares)
        .zip(amounts)
        .map(|((investor, share), call_amount)| build_allocation(investor, share, call_amount))
        .collect()
}

fn build_allocation(
    investor: &CallInvestor,
    share: Rate,
    call_amount: Money,
) -> InvestorAllocation {
    let called_after_call = investor.called_to_date + call_amount;
    InvestorAllocation {
        investor_id: investor.id.clone(),
        investor_name: investor.name.clone(),
        investor_type: investor.investor_type.clone(),
        commitment: investor.commitment,
        ownership_percent: investor.ownership_percent.unwrap_or(share * dec!(100)),
        allocation_share: share,
        call_amount,
        called_to_date: investor.called_to_date,
        called_after_call,
        uncalled_capital: investor.commitment - called_after_call,
        hierarchy_level: investor.hierarchy_level,
        structure_name: investor.structure_name.clone(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub(crate) fn validate_call_amount(total_call_amount: Money) -> CapitalCallResult<()> {
    if total_call_amount < Decimal::ZERO {
        return Err(CapitalCallError::invalid(
            "total_call_amount",
            "Total call amount cannot be negative",
        ));
    }
    Ok(())
}

pub(crate) fn validate_rounding_dp(rounding_dp: Option<u32>) -> CapitalCallResult<()> {
    match rounding_dp {
        Some(dp) if dp > MAX_ROUNDING_DP => Err(CapitalCallError::invalid(
            "rounding_dp",
            format!("Rounding precision {dp} exceeds the maximum of {MAX_ROUNDING_DP} places"),
        )),
        _ => Ok(()),
    }
}

pub(crate) fn validate_investors(investors: &[CallInvestor]) -> CapitalCallResult<()> {
    for inv in investors {
        if inv.commitment < Decimal::ZERO {
            return Err(CapitalCallError::invalid(
                format!("investors[{}].commitment", inv.id),
                "Commitment cannot be negative",
            ));
        }
        if inv.called_to_date < Decimal::ZERO {
            return Err(CapitalCallError::invalid(
                format!("investors[{}].called_to_date", inv.id),
                "Called-to-date cannot be negative",
            ));
        }
        if let Some(pct) = inv.ownership_percent {
            if pct < Decimal::ZERO || pct > dec!(100) {
                return Err(CapitalCallError::invalid(
                    format!("investors[{}].ownership_percent", inv.id),
                    "Ownership percent must be between 0 and 100",
                ));
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
