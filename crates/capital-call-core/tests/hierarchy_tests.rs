use capital_call_core::capital_call::call::calculate_capital_call;
use capital_call_core::hierarchy::{resolve_call_investors, CommitmentRecord, HierarchyInput};
use capital_call_core::types::{Currency, InvestorType, Structure};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Resolution feeding a capital call
// ===========================================================================

fn fund(
    id: &str,
    name: &str,
    level: Option<u8>,
    parent: Option<&str>,
    commitment: Decimal,
) -> Structure {
    Structure {
        id: id.into(),
        name: name.into(),
        total_commitment: commitment,
        hierarchy_level: level,
        parent_structure_id: parent.map(String::from),
        currency: Currency::USD,
    }
}

fn record(
    investor: &str,
    structure: &str,
    commitment: Decimal,
    called: Decimal,
    pct: Option<Decimal>,
) -> CommitmentRecord {
    CommitmentRecord {
        investor_id: investor.into(),
        investor_name: investor.to_uppercase(),
        investor_type: InvestorType::Institution,
        structure_id: structure.into(),
        commitment,
        called_to_date: called,
        ownership_percent: pct,
    }
}

fn master_feeder() -> HierarchyInput {
    HierarchyInput {
        structure_id: "master".into(),
        structures: vec![
            fund("master", "Global Master LP", Some(1), None, dec!(60000000)),
            fund("feeder-us", "US Feeder LP", Some(2), Some("master"), dec!(20000000)),
            fund("feeder-cay", "Cayman Feeder Ltd", Some(2), Some("master"), dec!(10000000)),
        ],
        commitments: vec![
            record("anchor", "master", dec!(30000000), dec!(6000000), Some(dec!(50))),
            record(
                "feeder-us-holdco",
                "feeder-us",
                dec!(20000000),
                dec!(4000000),
                Some(dec!(33.3333)),
            ),
            record(
                "feeder-cay-holdco",
                "feeder-cay",
                dec!(10000000),
                dec!(2000000),
                Some(dec!(16.6667)),
            ),
        ],
    }
}

#[test]
fn test_resolve_then_call() {
    let resolved = resolve_call_investors(&master_feeder()).unwrap().result;
    assert!(resolved.multi_level);
    assert_eq!(resolved.investors.len(), 3);

    let input = resolved.into_call_input(dec!(6000000), Some(2));
    let out = calculate_capital_call(&input).unwrap();
    let r = &out.result;

    assert!(r.multi_level);
    assert_eq!(r.summary.total_call_amount, dec!(6000000));
    let levels = r.levels.as_ref().unwrap();
    // 50% of the call goes to the two feeders
    assert_eq!(levels.intermediate.call_share, dec!(3000000));
    assert_eq!(levels.master.call_share, dec!(3000000));
    assert_eq!(r.allocations[0].structure_name.as_deref(), Some("US Feeder LP"));
    assert_eq!(r.allocations[0].call_amount, dec!(2000000));
    assert_eq!(r.allocations[1].call_amount, dec!(1000000));
    assert_eq!(r.allocations[2].call_amount, dec!(3000000));
}

#[test]
fn test_master_commitment_mismatch_surfaces_as_warning() {
    // Without the Cayman feeder the resolved commitments total 50M
    // against the 60M reported on the master.
    let mut input = master_feeder();
    input.commitments.pop();
    let resolved = resolve_call_investors(&input).unwrap().result;
    let out = calculate_capital_call(&resolved.into_call_input(dec!(1000000), None)).unwrap();
    assert_eq!(out.warnings.len(), 1);
    assert!(out.warnings[0].contains("structure 'Global Master LP'"));
}

#[test]
fn test_feeder_as_target_is_single_level() {
    let mut input = master_feeder();
    input.structure_id = "feeder-us".into();
    let resolved = resolve_call_investors(&input).unwrap().result;
    assert!(!resolved.multi_level);
    assert!(resolved.child_structure_ids.is_empty());
    assert_eq!(resolved.investors[0].structure_name.as_deref(), Some("US Feeder LP"));
}

#[test]
fn test_totals_report_called_capital() {
    let resolved = resolve_call_investors(&master_feeder()).unwrap().result;
    let called: Vec<Decimal> = resolved.totals.iter().map(|t| t.total_called).collect();
    assert_eq!(called, vec![dec!(6000000), dec!(4000000), dec!(2000000)]);
    assert!(resolved
        .totals
        .iter()
        .all(|t| t.total_commitment == t.reported_commitment || t.structure_id == "master"));
}
