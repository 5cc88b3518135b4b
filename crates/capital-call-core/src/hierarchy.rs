//! Structure / investor hierarchy resolution.
//!
//! Fund records arrive as a flat list of structures (each optionally
//! pointing at a parent) and a flat list of commitments (investor x
//! structure). Resolution turns these into the tagged investor list a
//! capital call consumes:
//!
//! - **Master target** (`hierarchy_level == Some(1)`): commitments held
//!   directly in the master are level 1; commitments in direct child
//!   structures are level 2 and carry the child's name.
//! - **Any other target**: the target's own commitments, untagged.
//!
//! Repeated (investor, structure) records are merged.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::error::CapitalCallError;
use crate::types::*;
use crate::CapitalCallResult;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// One investor's commitment to one structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitmentRecord {
    pub investor_id: String,
    pub investor_name: String,
    #[serde(default)]
    pub investor_type: InvestorType,
    pub structure_id: String,
    pub commitment: Money,
    #[serde(default)]
    pub called_to_date: Money,
    /// Ownership of the structure in percent points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ownership_percent: Option<Percent>,
}

/// Input for hierarchy resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyInput {
    /// Structure the capital call is for
    pub structure_id: String,
    pub structures: Vec<Structure>,
    #[serde(default)]
    pub commitments: Vec<CommitmentRecord>,
}

/// Commitment totals for one structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureTotals {
    pub structure_id: String,
    pub structure_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hierarchy_level: Option<u8>,
    pub investor_count: usize,
    /// Sum of commitment records
    pub total_commitment: Money,
    pub total_called: Money,
    /// Commitment reported on the structure record itself
    pub reported_commitment: Money,
}

/// Resolved investors for a capital call on `structure`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyResolution {
    pub structure: Structure,
    pub multi_level: bool,
    /// Ids of direct child structures (level 2) when `multi_level`
    pub child_structure_ids: Vec<String>,
    pub investors: Vec<CallInvestor>,
    /// Totals for the target and each child structure
    pub totals: Vec<StructureTotals>,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve the investors taking part in a call on `input.structure_id`.
pub fn resolve_call_investors(
    input: &HierarchyInput,
) -> CapitalCallResult<ComputationOutput<HierarchyResolution>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_hierarchy_input(input)?;

    let target = input
        .structures
        .iter()
        .find(|s| s.id == input.structure_id)
        .ok_or_else(|| {
            CapitalCallError::invalid(
                "structure_id",
                format!("Structure '{}' not found", input.structure_id),
            )
        })?;

    let multi_level = target.is_multi_level_master();
    let children = if multi_level {
        children_of(&input.structures, &target.id)
    } else {
        Vec::new()
    };

    // structure id -> (level tag, structure name)
    let mut placement: HashMap<&str, (Option<u8>, &str)> = HashMap::new();
    if multi_level {
        placement.insert(target.id.as_str(), (Some(1), target.name.as_str()));
        for child in &children {
            placement.insert(child.id.as_str(), (Some(2), child.name.as_str()));
        }
    } else {
        placement.insert(target.id.as_str(), (None, target.name.as_str()));
    }

    let mut investors: Vec<CallInvestor> = Vec::new();
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut skipped_deeper = 0usize;

    for rec in &input.commitments {
        let Some((level, structure_name)) = placement.get(rec.structure_id.as_str()) else {
            if multi_level
                && depth_below(&input.structures, &rec.structure_id, &target.id) > Some(1)
            {
                skipped_deeper += 1;
            }
            continue;
        };

        let key = (rec.structure_id.as_str(), rec.investor_id.as_str());
        if let Some(&pos) = index.get(&key) {
            let merged = &mut investors[pos];
            merged.commitment += rec.commitment;
            merged.called_to_date += rec.called_to_date;
            merged.ownership_percent = match (merged.ownership_percent, rec.ownership_percent) {
                (Some(a), Some(b)) => Some(a + b),
                (a, b) => a.or(b),
            };
            warnings.push(format!(
                "Merged repeated commitment of '{}' in structure '{}'",
                rec.investor_name, structure_name
            ));
            continue;
        }

        index.insert(key, investors.len());
        investors.push(CallInvestor {
            id: rec.investor_id.clone(),
            name: rec.investor_name.clone(),
            investor_type: rec.investor_type.clone(),
            commitment: rec.commitment,
            called_to_date: rec.called_to_date,
            ownership_percent: rec.ownership_percent,
            hierarchy_level: *level,
            structure_name: Some(structure_name.to_string()),
        });
    }

    if skipped_deeper > 0 {
        warnings.push(format!(
            "Skipped {skipped_deeper} commitment(s) held more than one level below '{}'",
            target.name
        ));
    }
    if investors.is_empty() {
        warnings.push(format!("No commitments found for structure '{}'", target.name));
    }
    for w in &warnings {
        tracing::warn!(target: "hierarchy", "{}", w);
    }

    let mut scope: Vec<&Structure> = vec![target];
    scope.extend(children.iter().copied());
    let totals = structure_commitment_totals(&scope, &input.commitments);

    tracing::debug!(
        target: "hierarchy",
        structure = %target.id,
        multi_level,
        children = children.len(),
        investors = investors.len(),
        "resolved call investors"
    );

    let output = HierarchyResolution {
        structure: target.clone(),
        multi_level,
        child_structure_ids: children.iter().map(|c| c.id.clone()).collect(),
        investors,
        totals,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Structure hierarchy resolution (master = level 1, direct children = level 2)",
        &serde_json::json!({
            "structure_id": input.structure_id,
            "structure_count": input.structures.len(),
            "commitment_count": input.commitments.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Direct children of a structure, in input order.
pub fn children_of<'a>(structures: &'a [Structure], parent_id: &str) -> Vec<&'a Structure> {
    structures
        .iter()
        .filter(|s| s.parent_structure_id.as_deref() == Some(parent_id))
        .collect()
}

/// Sum commitment records per structure, in the order the structures are given.
pub fn structure_commitment_totals(
    structures: &[&Structure],
    commitments: &[CommitmentRecord],
) -> Vec<StructureTotals> {
    structures
        .iter()
        .map(|s| {
            let records: Vec<&CommitmentRecord> = commitments
                .iter()
                .filter(|c| c.structure_id == s.id)
                .collect();
            let distinct: HashSet<&str> = records.iter().map(|c| c.investor_id.as_str()).collect();
            StructureTotals {
                structure_id: s.id.clone(),
                structure_name: s.name.clone(),
                hierarchy_level: s.hierarchy_level,
                investor_count: distinct.len(),
                total_commitment: records.iter().map(|c| c.commitment).sum(),
                total_called: records.iter().map(|c| c.called_to_date).sum(),
                reported_commitment: s.total_commitment,
            }
        })
        .collect()
}

/// Number of parent hops from `structure_id` up to `ancestor_id`, if the
/// ancestor is on the chain.
fn depth_below(structures: &[Structure], structure_id: &str, ancestor_id: &str) -> Option<usize> {
    let by_id: HashMap<&str, &Structure> = structures.iter().map(|s| (s.id.as_str(), s)).collect();
    let mut current = by_id.get(structure_id)?;
    let mut depth = 0usize;
    while let Some(parent) = current.parent_structure_id.as_deref() {
        depth += 1;
        if parent == ancestor_id {
            return Some(depth);
        }
        current = by_id.get(parent)?;
        if depth > structures.len() {
            return None;
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_hierarchy_input(input: &HierarchyInput) -> CapitalCallResult<()> {
    if input.structures.is_empty() {
        return Err(CapitalCallError::InsufficientData(
            "At least one structure is required".into(),
        ));
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for s in &input.structures {
        if !seen.insert(s.id.as_str()) {
            return Err(CapitalCallError::invalid(
                "structures",
                format!("Duplicate structure id '{}'", s.id),
            ));
        }
    }

    check_acyclic(&input.structures)?;

    for c in &input.commitments {
        if c.commitment < Decimal::ZERO || c.called_to_date < Decimal::ZERO {
            return Err(CapitalCallError::invalid(
                format!("commitments[{}:{}]", c.structure_id, c.investor_id),
                "Commitment and called-to-date cannot be negative",
            ));
        }
    }
    Ok(())
}

fn check_acyclic(structures: &[Structure]) -> CapitalCallResult<()> {
    let parents: HashMap<&str, Option<&str>> = structures
        .iter()
        .map(|s| (s.id.as_str(), s.parent_structure_id.as_deref()))
        .collect();

    for s in structures {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = Some(s.id.as_str());
        while let Some(id) = current {
            if !visited.insert(id) {
                return Err(CapitalCallError::invalid(
                    "structures.parent_structure_id",
                    format!("Parent chain of '{}' loops back on itself", s.id),
                ));
            }
            current = parents.get(id).copied().flatten();
        }
    }
    Ok(())
}

#[cfg(feature = "capital_call")]
impl HierarchyResolution {
    /// Build a capital call input for the resolved investors.
    pub fn into_call_input(
        self,
        total_call_amount: Money,
        rounding_dp: Option<u32>,
    ) -> crate::capital_call::call::CapitalCallInput {
        crate::capital_call::call::CapitalCallInput {
            structure: Some(self.structure),
            total_call_amount,
            investors: self.investors,
            call_date: None,
            due_date: None,
            rounding_dp,
            purpose: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
