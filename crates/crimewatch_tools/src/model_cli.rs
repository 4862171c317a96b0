#![forbid(unsafe_code)]

use std::path::Path;

use crimewatch_engines::encoder::{CategoryColumn, EncoderMode};
use crimewatch_engines::fit::{fit_if_absent, FitConfig, FitOutcome};
use crimewatch_engines::predict::PredictionAdapter;
use crimewatch_kernel_contracts::predict::PredictRequest;

pub fn execute_fit(
    dataset: &Path,
    model_dir: &Path,
    shared_encoder: bool,
) -> Result<String, String> {
    let config = FitConfig {
        encoder_mode: if shared_encoder {
            EncoderMode::Shared
        } else {
            EncoderMode::PerColumn
        },
    };
    let outcome = fit_if_absent(dataset, model_dir, config).map_err(|e| format!("fit failed: {e}"))?;
    Ok(match outcome {
        FitOutcome::Trained {
            training_rows,
            states,
            crime_types,
        } => format!(
            "TRAINED rows={training_rows} states={states} crime_types={crime_types} model_dir={}",
            model_dir.display()
        ),
        FitOutcome::AlreadyPresent => format!("ALREADY_PRESENT model_dir={}", model_dir.display()),
    })
}

pub fn execute_check_model(model_dir: &Path) -> Result<String, String> {
    let (estimator, encoder) = PredictionAdapter::new(model_dir)
        .load()
        .map_err(|e| format!("model check failed: {e}"))?;
    let mode = match encoder.mode() {
        EncoderMode::Shared => "shared",
        EncoderMode::PerColumn => "per_column",
    };
    let mut lines = vec![
        format!("encoder_mode={mode}"),
        format!(
            "states={}",
            encoder.vocabulary(CategoryColumn::State).classes().join("|")
        ),
        format!(
            "crime_types={}",
            encoder.vocabulary(CategoryColumn::CrimeType).classes().join("|")
        ),
        format!("intercept={}", estimator.intercept),
    ];
    for (name, coefficient) in estimator.feature_names.iter().zip(&estimator.coefficients) {
        lines.push(format!("coefficient.{name}={coefficient}"));
    }
    Ok(lines.join("\n"))
}

pub fn execute_predict(
    model_dir: &Path,
    state: &str,
    year: &str,
    crime_type: &str,
) -> Result<String, String> {
    let request = PredictRequest::from_fields(
        Some(state.to_string()),
        Some(year.to_string()),
        Some(crime_type.to_string()),
    )
    .map_err(|e| e.to_string())?;
    let value = PredictionAdapter::new(model_dir)
        .predict_fresh(&request)
        .map_err(|e| format!("prediction failed: {e}"))?;
    Ok(format!("{value}"))
}
