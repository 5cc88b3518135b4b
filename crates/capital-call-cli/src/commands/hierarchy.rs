use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use capital_call_core::capital_call::call;
use capital_call_core::hierarchy::{self, HierarchyInput};

use crate::input;

/// Arguments for structure hierarchy resolution
#[derive(Args)]
pub struct ResolveArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_resolve(args: ResolveArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let req: HierarchyInput = input::load(args.input.as_deref())?
        .ok_or("--input <file> or stdin required for hierarchy resolution")?;
    let result = hierarchy::resolve_call_investors(&req)?;
    Ok(serde_json::to_value(result)?)
}

/// Hierarchy plus the call to place on the resolved investors.
#[derive(Debug, Deserialize)]
struct PlanRequest {
    #[serde(flatten)]
    hierarchy: HierarchyInput,
    total_call_amount: Decimal,
    #[serde(default)]
    rounding_dp: Option<u32>,
    #[serde(default)]
    call_date: Option<NaiveDate>,
    #[serde(default)]
    due_date: Option<NaiveDate>,
    #[serde(default)]
    purpose: Option<String>,
}

/// Arguments for resolving a structure and calling its investors
#[derive(Args)]
pub struct PlanArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_plan(args: PlanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let req: PlanRequest = input::load(args.input.as_deref())?
        .ok_or("--input <file> or stdin required for capital call plan")?;

    let resolved = hierarchy::resolve_call_investors(&req.hierarchy)?;
    let mut call_input = resolved
        .result
        .into_call_input(req.total_call_amount, req.rounding_dp);
    call_input.call_date = req.call_date;
    call_input.due_date = req.due_date;
    call_input.purpose = req.purpose;

    let mut result = call::calculate_capital_call(&call_input)?;
    // Resolution warnings first, in the order they were raised.
    let mut warnings = resolved.warnings;
    warnings.append(&mut result.warnings);
    result.warnings = warnings;

    Ok(serde_json::to_value(result)?)
}
