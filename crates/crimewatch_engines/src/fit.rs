#![forbid(unsafe_code)]

//! Offline, one-shot fit of the prediction artifacts from a historical CSV.
//!
//! The dataset is a wide table: `State`, `Year` and one count column per crime type
//! (`Rape` is required). It is melted into `(state, year, crime_type, count)` rows
//! before fitting. Leading index columns (blank or `Unnamed: N` headers) are ignored.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::artifacts::{ArtifactError, ArtifactPaths};
use crate::encoder::{CategoryEncoder, EncoderMode, LabelVocabulary};
use crate::estimator::{EstimatorError, LinearEstimator, FEATURE_NAMES};

pub const YEAR_COLUMN: &str = "Year";
pub const STATE_COLUMN: &str = "State";
pub const REQUIRED_COUNT_COLUMN: &str = "Rape";

#[derive(Debug, thiserror::Error)]
pub enum FitError {
    #[error("dataset '{}' unavailable: {source}", .path.display())]
    DatasetUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("dataset is missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("dataset line {line}: {reason}")]
    Dataset { line: u64, reason: String },
    #[error("dataset has no rows")]
    EmptyDataset,
    #[error("dataset could not be read: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Estimator(#[from] EstimatorError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalRow {
    pub state: String,
    pub year: i32,
    pub crime_type: String,
    pub count: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoricalDataset {
    rows: Vec<HistoricalRow>,
    crime_types: Vec<String>,
}

impl HistoricalDataset {
    pub fn from_path(path: &Path) -> Result<Self, FitError> {
        let file = File::open(path).map_err(|source| FitError::DatasetUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, FitError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(FitError::MissingColumn(name))
        };
        let state_idx = column(STATE_COLUMN)?;
        let year_idx = column(YEAR_COLUMN)?;
        column(REQUIRED_COUNT_COLUMN)?;

        let count_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(idx, name)| {
                *idx != state_idx && *idx != year_idx && !is_index_column(name)
            })
            .map(|(idx, name)| (idx, name.to_string()))
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let field = |idx: usize| record.get(idx).unwrap_or("");
            let state = field(state_idx);
            if state.is_empty() {
                return Err(FitError::Dataset {
                    line,
                    reason: "State is empty".to_string(),
                });
            }
            let year = parse_year(field(year_idx)).ok_or_else(|| FitError::Dataset {
                line,
                reason: format!("Year '{}' is not an integer", field(year_idx)),
            })?;
            for (idx, crime_type) in &count_columns {
                let raw = field(*idx);
                let count = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| FitError::Dataset {
                        line,
                        reason: format!("{crime_type} count '{raw}' is not a number"),
                    })?;
                rows.push(HistoricalRow {
                    state: state.to_string(),
                    year,
                    crime_type: crime_type.clone(),
                    count,
                });
            }
        }
        Ok(Self {
            rows,
            crime_types: count_columns.into_iter().map(|(_, name)| name).collect(),
        })
    }

    pub fn rows(&self) -> &[HistoricalRow] {
        &self.rows
    }

    pub fn crime_types(&self) -> &[String] {
        &self.crime_types
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn is_index_column(name: &str) -> bool {
    name.is_empty() || name.starts_with("Unnamed")
}

fn parse_year(raw: &str) -> Option<i32> {
    if let Ok(year) = raw.parse::<i32>() {
        return Some(year);
    }
    let v = raw.parse::<f64>().ok()?;
    if v.fract() != 0.0 || v < i32::MIN as f64 || v > i32::MAX as f64 {
        return None;
    }
    Some(v as i32)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitConfig {
    pub encoder_mode: EncoderMode,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            encoder_mode: EncoderMode::PerColumn,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    pub estimator: LinearEstimator,
    pub encoder: CategoryEncoder,
    pub training_rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    Trained {
        training_rows: usize,
        states: usize,
        crime_types: usize,
    },
    AlreadyPresent,
}

/// Fits the estimator on `[state_code, year, crime_type_code]`.
///
/// In [`EncoderMode::Shared`] only the required count column is used, the vocabulary is
/// built from states alone and the crime-type feature is held at zero.
pub fn fit(dataset: &HistoricalDataset, config: FitConfig) -> Result<FittedModel, FitError> {
    let rows: Vec<&HistoricalRow> = match config.encoder_mode {
        EncoderMode::PerColumn => dataset.rows().iter().collect(),
        EncoderMode::Shared => dataset
            .rows()
            .iter()
            .filter(|row| row.crime_type == REQUIRED_COUNT_COLUMN)
            .collect(),
    };
    if rows.is_empty() {
        return Err(FitError::EmptyDataset);
    }

    let states = LabelVocabulary::fit(rows.iter().map(|row| row.state.as_str()));
    let encoder = match config.encoder_mode {
        EncoderMode::PerColumn => CategoryEncoder::PerColumn {
            crime_type: LabelVocabulary::fit(rows.iter().map(|row| row.crime_type.as_str())),
            state: states,
        },
        EncoderMode::Shared => CategoryEncoder::Shared { vocabulary: states },
    };

    let mut design = Vec::with_capacity(rows.len());
    let mut targets = Vec::with_capacity(rows.len());
    for row in &rows {
        let vocab_code = |column, label: &str| {
            encoder
                .vocabulary(column)
                .transform(label)
                .map(f64::from)
                .unwrap_or(0.0)
        };
        let state_code = vocab_code(crate::encoder::CategoryColumn::State, &row.state);
        let crime_type_code = match config.encoder_mode {
            EncoderMode::PerColumn => {
                vocab_code(crate::encoder::CategoryColumn::CrimeType, &row.crime_type)
            }
            EncoderMode::Shared => 0.0,
        };
        design.push(vec![state_code, row.year as f64, crime_type_code]);
        targets.push(row.count);
    }

    let estimator = LinearEstimator::fit_least_squares(
        FEATURE_NAMES.iter().map(|name| name.to_string()).collect(),
        &design,
        &targets,
    )?;
    Ok(FittedModel {
        estimator,
        encoder,
        training_rows: rows.len(),
    })
}

/// Fits and persists only when no artifacts exist yet. Never retrains.
pub fn fit_if_absent(
    dataset_path: &Path,
    model_dir: &Path,
    config: FitConfig,
) -> Result<FitOutcome, FitError> {
    let artifacts = ArtifactPaths::new(model_dir);
    if artifacts.exists() {
        info!(model_dir = %model_dir.display(), "model artifacts already present; skipping fit");
        return Ok(FitOutcome::AlreadyPresent);
    }
    info!(dataset = %dataset_path.display(), "model artifacts not found; fitting");
    let dataset = HistoricalDataset::from_path(dataset_path)?;
    let model = fit(&dataset, config)?;
    artifacts.persist(&model.estimator, &model.encoder)?;
    let outcome = FitOutcome::Trained {
        training_rows: model.training_rows,
        states: model
            .encoder
            .vocabulary(crate::encoder::CategoryColumn::State)
            .len(),
        crime_types: dataset.crime_types().len(),
    };
    info!(model_dir = %model_dir.display(), outcome = ?outcome, "model trained and saved");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::CategoryColumn;
    use crate::predict::{predict, PredictError};

    const WIDE: &str = "\
,State,Year,Rape,TypeX
0,StateA,2020,5,11
1,StateA,2021,7,12
2,StateB,2020,3,4
3,StateB,2021,4,6
";

    #[test]
    fn at_fit_01_wide_table_melts_into_one_row_per_crime_type() {
        let ds = HistoricalDataset::from_reader(WIDE.as_bytes()).unwrap();
        assert_eq!(ds.crime_types(), ["Rape", "TypeX"]);
        assert_eq!(ds.rows().len(), 8);
        assert_eq!(
            ds.rows()[1],
            HistoricalRow {
                state: "StateA".to_string(),
                year: 2020,
                crime_type: "TypeX".to_string(),
                count: 11.0,
            }
        );
    }

    #[test]
    fn at_fit_02_fitted_model_predicts_finite_and_deterministic() {
        let ds = HistoricalDataset::from_reader(WIDE.as_bytes()).unwrap();
        let a = fit(&ds, FitConfig::default()).unwrap();
        let b = fit(&ds, FitConfig::default()).unwrap();
        assert_eq!(a, b);
        let got = predict(&a.estimator, &a.encoder, "StateA", 2020, "TypeX").unwrap();
        assert!(got.is_finite());
        assert_eq!(
            got,
            predict(&b.estimator, &b.encoder, "StateA", 2020, "TypeX").unwrap()
        );
    }

    #[test]
    fn at_fit_03_unseen_state_is_unknown_category() {
        let ds = HistoricalDataset::from_reader(WIDE.as_bytes()).unwrap();
        let model = fit(&ds, FitConfig::default()).unwrap();
        let err = predict(&model.estimator, &model.encoder, "StateZ", 2020, "Rape")
            .expect_err("unseen state must not yield a number");
        assert!(matches!(
            err,
            PredictError::UnknownCategory(ref u) if u.column == CategoryColumn::State
        ));
    }

    #[test]
    fn at_fit_04_rape_only_table_reduces_to_year_and_state() {
        let csv = "Year,State,Rape\n2001,Goa,10\n2002,Goa,12\n2001,Assam,20\n2002,Assam,22\n";
        let ds = HistoricalDataset::from_reader(csv.as_bytes()).unwrap();
        let model = fit(&ds, FitConfig::default()).unwrap();
        assert_eq!(model.estimator.coefficients[2], 0.0);
        let got = predict(&model.estimator, &model.encoder, "Goa", 2003, "Rape").unwrap();
        assert!((got - 14.0).abs() < 1e-6, "got {got}");
    }

    #[test]
    fn at_fit_05_shared_mode_uses_state_vocabulary_for_both_columns() {
        let ds = HistoricalDataset::from_reader(WIDE.as_bytes()).unwrap();
        let model = fit(
            &ds,
            FitConfig {
                encoder_mode: EncoderMode::Shared,
            },
        )
        .unwrap();
        assert_eq!(model.training_rows, 4);
        let err = predict(&model.estimator, &model.encoder, "StateA", 2020, "Rape")
            .expect_err("crime types are outside the shared vocabulary");
        assert!(err.unknown_category().is_some());
        assert!(predict(&model.estimator, &model.encoder, "StateA", 2020, "StateB").is_ok());
    }

    #[test]
    fn at_fit_06_missing_required_column_is_reported() {
        let csv = "Year,State,DV\n2001,Goa,1\n";
        let err = HistoricalDataset::from_reader(csv.as_bytes()).expect_err("Rape is required");
        assert!(matches!(err, FitError::MissingColumn("Rape")));
    }

    #[test]
    fn at_fit_07_bad_year_names_the_line() {
        let csv = "Year,State,Rape\n2001,Goa,1\nlater,Goa,2\n";
        let err = HistoricalDataset::from_reader(csv.as_bytes()).expect_err("bad year");
        match err {
            FitError::Dataset { line, reason } => {
                assert_eq!(line, 3);
                assert!(reason.contains("later"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn at_fit_08_existing_artifacts_short_circuit_the_fit() {
        let dir = tempfile::tempdir().unwrap();
        let dataset_path = dir.path().join("CrimesOnWomenData.csv");
        std::fs::write(&dataset_path, WIDE).unwrap();
        let model_dir = dir.path().join("models");

        let first = fit_if_absent(&dataset_path, &model_dir, FitConfig::default()).unwrap();
        assert_eq!(
            first,
            FitOutcome::Trained {
                training_rows: 8,
                states: 2,
                crime_types: 2,
            }
        );

        std::fs::remove_file(&dataset_path).unwrap();
        let second = fit_if_absent(&dataset_path, &model_dir, FitConfig::default()).unwrap();
        assert_eq!(second, FitOutcome::AlreadyPresent);
    }

    #[test]
    fn at_fit_09_empty_table_is_rejected() {
        let ds = HistoricalDataset::from_reader("Year,State,Rape\n".as_bytes()).unwrap();
        assert!(ds.is_empty());
        assert!(matches!(
            fit(&ds, FitConfig::default()),
            Err(FitError::EmptyDataset)
        ));
    }
}
