#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use crimewatch_kernel_contracts::predict::PredictRequest;
use tracing::debug;

use crate::artifacts::{ArtifactError, ArtifactPaths};
use crate::encoder::{CategoryColumn, CategoryEncoder, UnknownCategory};
use crate::estimator::{EstimatorError, LinearEstimator};

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategory),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Estimator(#[from] EstimatorError),
}

impl PredictError {
    pub fn unknown_category(&self) -> Option<&UnknownCategory> {
        match self {
            PredictError::UnknownCategory(v) => Some(v),
            _ => None,
        }
    }
}

/// Encodes both labels, builds `[state_code, year, crime_type_code]` and runs the estimator.
pub fn predict(
    estimator: &LinearEstimator,
    encoder: &CategoryEncoder,
    state: &str,
    year: i32,
    crime_type: &str,
) -> Result<f64, PredictError> {
    let state_code = encoder.encode(CategoryColumn::State, state)?;
    let crime_type_code = encoder.encode(CategoryColumn::CrimeType, crime_type)?;
    let features = [state_code as f64, year as f64, crime_type_code as f64];
    Ok(estimator.predict(&features)?)
}

/// Request-path entry point: reloads both artifacts from disk on every call.
#[derive(Debug, Clone)]
pub struct PredictionAdapter {
    artifacts: ArtifactPaths,
}

impl PredictionAdapter {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts: ArtifactPaths::new(model_dir),
        }
    }

    pub fn model_dir(&self) -> &Path {
        self.artifacts.dir()
    }

    pub fn is_ready(&self) -> bool {
        self.artifacts.exists()
    }

    pub fn load(&self) -> Result<(LinearEstimator, CategoryEncoder), PredictError> {
        Ok(self.artifacts.load()?)
    }

    pub fn predict_fresh(&self, request: &PredictRequest) -> Result<f64, PredictError> {
        let (estimator, encoder) = self.load()?;
        let value = predict(
            &estimator,
            &encoder,
            &request.state,
            request.year,
            &request.crime_type,
        )?;
        debug!(
            state = %request.state,
            year = request.year,
            crime_type = %request.crime_type,
            value,
            "prediction served"
        );
        Ok(value)
    }
}
