#![forbid(unsafe_code)]

use crimewatch_kernel_contracts::SchemaVersion;

pub const ESTIMATOR_SCHEMA_VERSION: SchemaVersion = SchemaVersion(1);

/// Feature order every estimator in this crate is fitted and invoked with.
pub const FEATURE_NAMES: [&str; 3] = ["state_code", "year", "crime_type_code"];

/// Relative threshold below which a pivot is treated as zero.
const PIVOT_EPSILON: f64 = 1e-10;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimatorError {
    #[error("expected {expected} features, got {got}")]
    FeatureMismatch { expected: usize, got: usize },
    #[error("estimator produced a non-finite value")]
    NonFinite,
    #[error("cannot fit on an empty design")]
    EmptyDesign,
}

/// Ordinary least-squares model `y = intercept + Σ coefficients[i] * x[i]`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LinearEstimator {
    pub schema_version: SchemaVersion,
    pub feature_names: Vec<String>,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearEstimator {
    pub fn v1(feature_names: Vec<String>, intercept: f64, coefficients: Vec<f64>) -> Self {
        Self {
            schema_version: ESTIMATOR_SCHEMA_VERSION,
            feature_names,
            intercept,
            coefficients,
        }
    }

    pub fn feature_count(&self) -> usize {
        self.coefficients.len()
    }

    pub fn predict(&self, features: &[f64]) -> Result<f64, EstimatorError> {
        if features.len() != self.coefficients.len() {
            return Err(EstimatorError::FeatureMismatch {
                expected: self.coefficients.len(),
                got: features.len(),
            });
        }
        let y = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>();
        if !y.is_finite() {
            return Err(EstimatorError::NonFinite);
        }
        Ok(y)
    }

    /// Fits with an intercept by solving the centered normal equations.
    ///
    /// Columns that are constant or linearly dependent on earlier ones get a zero
    /// coefficient, so rank-deficient designs still yield a least-squares solution.
    pub fn fit_least_squares(
        feature_names: Vec<String>,
        rows: &[Vec<f64>],
        targets: &[f64],
    ) -> Result<Self, EstimatorError> {
        let n = rows.len();
        if n == 0 || n != targets.len() {
            return Err(EstimatorError::EmptyDesign);
        }
        let p = feature_names.len();
        if let Some(bad) = rows.iter().find(|row| row.len() != p) {
            return Err(EstimatorError::FeatureMismatch {
                expected: p,
                got: bad.len(),
            });
        }

        let count = n as f64;
        let mut x_mean = vec![0.0; p];
        for row in rows {
            for (m, x) in x_mean.iter_mut().zip(row) {
                *m += x / count;
            }
        }
        let y_mean = targets.iter().sum::<f64>() / count;

        // Augmented [XᵀX | Xᵀy] over centered data.
        let mut system = vec![vec![0.0; p + 1]; p];
        for (row, y) in rows.iter().zip(targets) {
            let dy = y - y_mean;
            for i in 0..p {
                let di = row[i] - x_mean[i];
                for j in 0..p {
                    system[i][j] += di * (row[j] - x_mean[j]);
                }
                system[i][p] += di * dy;
            }
        }

        let coefficients = solve_with_free_columns(&mut system, p);
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_mean)
                .map(|(c, m)| c * m)
                .sum::<f64>();
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(EstimatorError::NonFinite);
        }
        Ok(Self::v1(feature_names, intercept, coefficients))
    }
}

/// Gauss-Jordan elimination with partial pivoting. Columns without a usable pivot are
/// left free and set to zero.
fn solve_with_free_columns(system: &mut [Vec<f64>], p: usize) -> Vec<f64> {
    let scale = (0..p)
        .map(|i| system[i][i].abs())
        .fold(1.0_f64, f64::max);
    let tolerance = PIVOT_EPSILON * scale;

    let mut pivot_row_of_col = vec![None; p];
    let mut next_row = 0;
    for col in 0..p {
        if next_row == p {
            break;
        }
        let (best_row, best_abs) = (next_row..p)
            .map(|r| (r, system[r][col].abs()))
            .fold((next_row, 0.0), |acc, cur| if cur.1 > acc.1 { cur } else { acc });
        if best_abs <= tolerance {
            continue;
        }
        system.swap(next_row, best_row);
        let pivot = system[next_row][col];
        for v in system[next_row].iter_mut() {
            *v /= pivot;
        }
        for r in 0..p {
            if r == next_row {
                continue;
            }
            let factor = system[r][col];
            if factor == 0.0 {
                continue;
            }
            for c in 0..=p {
                let delta = factor * system[next_row][c];
                system[r][c] -= delta;
            }
        }
        pivot_row_of_col[col] = Some(next_row);
        next_row += 1;
    }

    pivot_row_of_col
        .iter()
        .map(|row| row.map(|r| system[r][p]).unwrap_or(0.0))
        .collect()
}
