use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Capital call
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_capital_call(input_json: String) -> NapiResult<String> {
    let input: capital_call_core::capital_call::call::CapitalCallInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = capital_call_core::capital_call::call::calculate_capital_call(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn allocate_pro_rata(input_json: String) -> NapiResult<String> {
    let input: capital_call_core::capital_call::pro_rata::ProRataInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = capital_call_core::capital_call::pro_rata::allocate_pro_rata(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn allocate_hierarchical(input_json: String) -> NapiResult<String> {
    let input: capital_call_core::capital_call::hierarchical::HierarchicalInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = capital_call_core::capital_call::hierarchical::allocate_hierarchical(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Hierarchy
// ---------------------------------------------------------------------------

#[napi]
pub fn resolve_call_investors(input_json: String) -> NapiResult<String> {
    let input: capital_call_core::hierarchy::HierarchyInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        capital_call_core::hierarchy::resolve_call_investors(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
