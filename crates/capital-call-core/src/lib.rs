pub mod error;
pub mod types;

#[cfg(feature = "capital_call")]
pub mod capital_call;

#[cfg(feature = "hierarchy")]
pub mod hierarchy;

pub use error::CapitalCallError;
pub use types::*;

/// Standard result type for all capital-call operations
pub type CapitalCallResult<T> = Result<T, CapitalCallError>;
