//! Submission validation and the Gaussian log-likelihood ratio score.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::model::{CellValue, Table};
use crate::stats::{clip, clip_min, normal_logpdf};

/// Default name of the per-row identifier column.
pub const DEFAULT_ID_COLUMN: &str = "planet_id";

/// Smallest admissible predicted sigma; anything lower is clamped up rather
/// than rejected, so a degenerate prediction cannot blow up the likelihood.
const SIGMA_FLOOR: f64 = 1e-15;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Participant-visible rejection of a submission.
///
/// The messages are part of the contract: they are surfaced verbatim to
/// competitors.  No numeric work happens once validation fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Negative values in the submission")]
    NegativeValues,
    #[error("Submission column {0} must be numeric")]
    NonNumericColumn(String),
    #[error("Submission must have 2x columns of the solution")]
    ColumnCountMismatch,
}

// ---------------------------------------------------------------------------
// Calibration
// ---------------------------------------------------------------------------

/// Competition calibration constants, precomputed externally from training
/// statistics and shipped alongside the ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreConfig {
    /// Constant-prediction baseline mean.
    pub naive_mean: f64,
    /// Constant-prediction baseline sigma.
    pub naive_sigma: f64,
    /// Sigma of the theoretical best-possible prediction.
    pub sigma_true: f64,
}

impl ScoreConfig {
    /// Read a calibration file: a JSON object with the three constants.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading calibration file {}", path.display()))?;
        serde_json::from_str(&text).context("parsing calibration JSON")
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Scores one submission against one ground-truth solution.
#[derive(Debug, Clone)]
pub struct ScoreEvaluator {
    config: ScoreConfig,
    id_column: String,
}

impl ScoreEvaluator {
    pub fn new(config: ScoreConfig) -> Self {
        ScoreEvaluator {
            config,
            id_column: DEFAULT_ID_COLUMN.to_string(),
        }
    }

    /// Override the identifier column name (default `planet_id`).
    pub fn with_id_column(mut self, name: impl Into<String>) -> Self {
        self.id_column = name.into();
        self
    }

    /// Compute the normalized Gaussian log-likelihood ratio score, clipped
    /// to `[0, 1]`.
    ///
    /// The identifier column is dropped from both tables first (absent is
    /// fine).  The submission must then be all-numeric, non-negative, and
    /// exactly twice as wide as the solution: W predicted means followed by
    /// W predicted sigmas.  Row order must correspond between the tables;
    /// alignment is positional.
    ///
    /// The score places the submission's summed log-likelihood between the
    /// naive constant baseline (0) and perfect knowledge of the truth (1).
    pub fn evaluate(&self, solution: &Table, submission: &Table) -> Result<f64, ValidationError> {
        let solution = solution.drop_column(&self.id_column);
        let submission = submission.drop_column(&self.id_column);

        validate(&submission, solution.n_cols())?;

        let n_wavelengths = solution.n_cols();
        let cfg = &self.config;

        // Summed over the full flattened matrix, not per-row.
        let mut gll_pred = 0.0f64;
        let mut gll_true = 0.0f64;
        let mut gll_mean = 0.0f64;

        for (truth_row, pred_row) in solution.rows.iter().zip(&submission.rows) {
            for w in 0..n_wavelengths {
                let y_true = cell_f64(&truth_row[w]);
                let y_pred = cell_f64(&pred_row[w]);
                let sigma_pred = clip_min(cell_f64(&pred_row[n_wavelengths + w]), SIGMA_FLOOR);

                gll_pred += normal_logpdf(y_true, y_pred, sigma_pred);
                gll_true += normal_logpdf(y_true, y_true, cfg.sigma_true);
                gll_mean += normal_logpdf(y_true, cfg.naive_mean, cfg.naive_sigma);
            }
        }

        let score = (gll_pred - gll_mean) / (gll_true - gll_mean);
        Ok(clip(score, 0.0, 1.0))
    }
}

fn validate(submission: &Table, n_wavelengths: usize) -> Result<(), ValidationError> {
    for row in &submission.rows {
        for cell in row {
            if let Some(v) = cell.as_f64() {
                if v < 0.0 {
                    return Err(ValidationError::NegativeValues);
                }
            }
        }
    }
    for (idx, name) in submission.columns.iter().enumerate() {
        if !submission.column_is_numeric(idx) {
            return Err(ValidationError::NonNumericColumn(name.clone()));
        }
    }
    if submission.n_cols() != 2 * n_wavelengths {
        return Err(ValidationError::ColumnCountMismatch);
    }
    Ok(())
}

fn cell_f64(cell: &CellValue) -> f64 {
    cell.as_f64().unwrap_or(f64::NAN)
}
