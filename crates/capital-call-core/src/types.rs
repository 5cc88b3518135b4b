use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Percent points (25 = 25%). Used for ownership figures as they arrive
/// from the fund administration records.
pub type Percent = Decimal;

/// Currency code
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    GBP,
    #[default]
    USD,
    EUR,
    CHF,
    JPY,
    CAD,
    AUD,
    HKD,
    SGD,
    MXN,
    Other(String),
}

/// Position of a structure or investor in a multi-tier fund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HierarchyLevel {
    /// Master / top entity
    Master,
    /// Intermediate holding entity between the master and end investors
    Intermediate,
}

impl HierarchyLevel {
    /// Map the numeric level used by the fund records (1 = master,
    /// 2 = intermediate). Anything else is unknown.
    pub fn from_number(level: u8) -> Option<Self> {
        match level {
            1 => Some(HierarchyLevel::Master),
            2 => Some(HierarchyLevel::Intermediate),
            _ => None,
        }
    }

    pub fn as_number(self) -> u8 {
        match self {
            HierarchyLevel::Master => 1,
            HierarchyLevel::Intermediate => 2,
        }
    }
}

/// Investor classification as carried on the investor record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvestorType {
    #[default]
    Individual,
    Institution,
    FundOfFunds,
    FamilyOffice,
    /// Another fund structure holding an interest (feeder / intermediate)
    Structure,
    Other(String),
}

/// A fund structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Structure {
    pub id: String,
    pub name: String,
    /// Total commitment raised by the structure
    pub total_commitment: Money,
    /// `Some(1)` marks a multi-level master structure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hierarchy_level: Option<u8>,
    /// Parent structure for intermediate vehicles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_structure_id: Option<String>,
    #[serde(default)]
    pub currency: Currency,
}

impl Structure {
    /// True when the structure is the master of a multi-level hierarchy.
    pub fn is_multi_level_master(&self) -> bool {
        self.hierarchy_level == Some(1)
    }
}

/// An investor participating in a capital call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallInvestor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub investor_type: InvestorType,
    /// Total amount pledged
    pub commitment: Money,
    /// Capital already called before this call
    #[serde(default)]
    pub called_to_date: Money,
    /// Ownership in percent points (0..=100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ownership_percent: Option<Percent>,
    /// 1 = master, 2 = intermediate. Absent is treated as master.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hierarchy_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure_name: Option<String>,
}

impl CallInvestor {
    /// Convenience constructor for a flat (single level) investor.
    pub fn new(id: &str, name: &str, commitment: Money, called_to_date: Money) -> Self {
        CallInvestor {
            id: id.to_string(),
            name: name.to_string(),
            investor_type: InvestorType::default(),
            commitment,
            called_to_date,
            ownership_percent: None,
            hierarchy_level: None,
            structure_name: None,
        }
    }

    /// Remaining unfunded commitment before the call.
    pub fn unfunded(&self) -> Money {
        self.commitment - self.called_to_date
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
