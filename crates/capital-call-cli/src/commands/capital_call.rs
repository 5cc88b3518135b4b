use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use capital_call_core::capital_call::call::{self, CapitalCallInput};
use capital_call_core::capital_call::hierarchical::{self, HierarchicalInput};
use capital_call_core::capital_call::pro_rata::{self, ProRataInput};
use capital_call_core::types::{CallInvestor, Structure};

use crate::input;

/// Arguments for a capital call on a structure
#[derive(Args)]
pub struct CallArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Total amount to call
    #[arg(long)]
    pub total: Option<Decimal>,

    /// Investor as id:commitment[:called_to_date] (repeatable)
    #[arg(long = "investor", value_parser = parse_investor)]
    pub investors: Vec<CallInvestor>,

    /// Structure id
    #[arg(long, default_value = "cli")]
    pub structure_id: String,

    /// Structure name
    #[arg(long, default_value = "Ad-hoc structure")]
    pub structure_name: String,

    /// Round call amounts to this many decimal places
    #[arg(long)]
    pub rounding_dp: Option<u32>,

    /// Call (notice) date, YYYY-MM-DD
    #[arg(long)]
    pub call_date: Option<NaiveDate>,

    /// Payment due date, YYYY-MM-DD
    #[arg(long)]
    pub due_date: Option<NaiveDate>,
}

pub fn run_call(args: CallArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let call_input: CapitalCallInput = match input::load(args.input.as_deref())? {
        Some(req) => req,
        None => {
            let total = args
                .total
                .ok_or("--total is required (or provide --input)")?;
            if args.investors.is_empty() {
                return Err("at least one --investor is required (or provide --input)".into());
            }
            CapitalCallInput {
                structure: Some(Structure {
                    id: args.structure_id,
                    name: args.structure_name,
                    total_commitment: Decimal::ZERO,
                    hierarchy_level: None,
                    parent_structure_id: None,
                    currency: Default::default(),
                }),
                total_call_amount: total,
                investors: args.investors,
                call_date: args.call_date,
                due_date: args.due_date,
                rounding_dp: args.rounding_dp,
                purpose: None,
            }
        }
    };

    let result = call::calculate_capital_call(&call_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a bare allocation (no structure)
#[derive(Args)]
pub struct AllocateArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Use the two-level (intermediate / master) split
    #[arg(long)]
    pub hierarchical: bool,
}

pub fn run_allocate(args: AllocateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.hierarchical {
        let req: HierarchicalInput = input::load(args.input.as_deref())?
            .ok_or("--input <file> or stdin required for allocation")?;
        let result = hierarchical::allocate_hierarchical(&req)?;
        Ok(serde_json::to_value(result)?)
    } else {
        let req: ProRataInput = input::load(args.input.as_deref())?
            .ok_or("--input <file> or stdin required for allocation")?;
        let result = pro_rata::allocate_pro_rata(&req)?;
        Ok(serde_json::to_value(result)?)
    }
}

/// Parse `id:commitment[:called_to_date]`.
fn parse_investor(s: &str) -> Result<CallInvestor, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 || parts[0].is_empty() {
        return Err(format!("expected id:commitment[:called_to_date], got '{s}'"));
    }
    let commitment: Decimal = parts[1]
        .parse()
        .map_err(|e| format!("invalid commitment '{}': {e}", parts[1]))?;
    let called: Decimal = match parts.get(2) {
        Some(c) => c.parse().map_err(|e| format!("invalid called_to_date '{c}': {e}"))?,
        None => Decimal::ZERO,
    };
    Ok(CallInvestor::new(parts[0], parts[0], commitment, called))
}
