#![forbid(unsafe_code)]

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use crimewatch_engines::encoder::UnknownCategory;
use crimewatch_engines::predict::PredictError;
use crimewatch_kernel_contracts::ContractViolation;
use crimewatch_storage::StorageError;
use tracing::{error, warn};

use crate::pages;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ContractViolation),
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("request body too large: {0}")]
    PayloadTooLarge(String),
    #[error(transparent)]
    UnknownCategory(UnknownCategory),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("prediction unavailable: {0}")]
    Prediction(PredictError),
    #[error("session table lock poisoned")]
    SessionPoisoned,
    #[error("request reached a handler without a session")]
    SessionMissing,
}

impl From<PredictError> for AppError {
    fn from(value: PredictError) -> Self {
        match value {
            PredictError::UnknownCategory(unknown) => AppError::UnknownCategory(unknown),
            other => AppError::Prediction(other),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UnknownCategory(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Storage(_)
            | AppError::Prediction(_)
            | AppError::SessionPoisoned
            | AppError::SessionMissing => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Server-side failures are not echoed to the client.
    fn public_message(&self) -> String {
        if self.status().is_server_error() {
            "The service is temporarily unavailable. Please try again later.".to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "request failed");
        } else {
            warn!(error = %self, status = status.as_u16(), "request rejected");
        }
        (status, pages::error_page(status, &self.public_message())).into_response()
    }
}
