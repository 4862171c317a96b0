#![forbid(unsafe_code)]

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct SchemaVersion(pub u32);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContractViolation {
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
}

impl ContractViolation {
    pub fn field(&self) -> &'static str {
        match self {
            ContractViolation::MissingField { field } => field,
            ContractViolation::InvalidValue { field, .. } => field,
        }
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), ContractViolation>;
}

/// Treats absent and whitespace-only values alike. The value itself is returned untouched.
pub fn require_field(field: &'static str, raw: Option<String>) -> Result<String, ContractViolation> {
    match raw {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ContractViolation::MissingField { field }),
    }
}

pub(crate) fn require_present(field: &'static str, value: &str) -> Result<(), ContractViolation> {
    if value.trim().is_empty() {
        return Err(ContractViolation::MissingField { field });
    }
    Ok(())
}

pub(crate) fn reject_line_breaks(field: &'static str, value: &str) -> Result<(), ContractViolation> {
    if value.contains(['\r', '\n']) {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must be a single line",
        });
    }
    Ok(())
}
