#![forbid(unsafe_code)]

pub mod common;
pub mod credential;
pub mod predict;
pub mod report;

pub use common::{require_field, ContractViolation, SchemaVersion, Validate};
