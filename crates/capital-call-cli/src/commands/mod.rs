pub mod capital_call;
pub mod hierarchy;
