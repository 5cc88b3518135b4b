//! Capital call allocation.
//!
//! - [`pro_rata`]: single-level distribution by share of commitment
//! - [`hierarchical`]: two-level split between intermediate and master holders
//! - [`rounding`]: largest-remainder rounding to currency units
//! - [`call`]: full capital call with summary, dates and warnings

pub mod call;
pub mod hierarchical;
pub mod pro_rata;
pub mod rounding;

use serde::{Deserialize, Serialize};

use crate::types::*;

/// Computed allocation of a capital call to one investor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorAllocation {
    pub investor_id: String,
    pub investor_name: String,
    pub investor_type: InvestorType,
    pub commitment: Money,
    /// Ownership in percent points. Echoes the investor record when present,
    /// otherwise `allocation_share * 100`.
    pub ownership_percent: Percent,
    /// Commitment / total commitment of the allocation group
    pub allocation_share: Rate,
    /// Amount called from this investor
    pub call_amount: Money,
    /// Capital called before this call
    pub called_to_date: Money,
    /// called_to_date + call_amount
    pub called_after_call: Money,
    /// commitment - called_to_date - call_amount
    pub uncalled_capital: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hierarchy_level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure_name: Option<String>,
}

/// Record a user-facing warning and mirror it to the log.
pub(crate) fn push_warning(warnings: &mut Vec<String>, message: String) {
    tracing::warn!(target: "capital_call", "{}", message);
    warnings.push(message);
}
