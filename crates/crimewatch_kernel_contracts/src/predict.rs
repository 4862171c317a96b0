#![forbid(unsafe_code)]

use crate::{require_field, ContractViolation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictRequest {
    pub state: String,
    pub year: i32,
    pub crime_type: String,
}

impl PredictRequest {
    pub fn from_fields(
        state: Option<String>,
        year: Option<String>,
        crime_type: Option<String>,
    ) -> Result<Self, ContractViolation> {
        let state = require_field("state", state)?;
        let year = require_field("year", year)?;
        let crime_type = require_field("crime_type", crime_type)?;
        let year = year
            .trim()
            .parse::<i32>()
            .map_err(|_| ContractViolation::InvalidValue {
                field: "year",
                reason: "must be an integer",
            })?;
        Ok(Self {
            state,
            year,
            crime_type,
        })
    }
}
