//! Risk model port: Trait for the external classifier and its explainer.
//!
//! The model is produced outside this crate. Implementations wrap a loaded
//! artifact and must treat the input column order as significant.

use crate::domain::{AttributionVector, ModelError, ModelInput};

/// Trait for a binary risk classifier with per-prediction attribution.
pub trait RiskModel: Send + Sync {
    /// Column names the model was trained on, in training order.
    fn columns(&self) -> &[String];

    /// Columns the predictor expects as text, in column order.
    fn categorical_columns(&self) -> Vec<&str>;

    /// Predict the class label (0 or 1) for one row.
    ///
    /// A categorical-aware model expects its categorical columns as text.
    ///
    /// # Errors
    /// Returns `ColumnMismatch` if the row's columns differ from the model's,
    /// `TypeMismatch` if a cell has the wrong type.
    fn predict(&self, input: &ModelInput) -> Result<u8, ModelError>;

    /// Attribute the model output for one row to its features.
    ///
    /// Every cell must be numeric. The returned vector is aligned with the
    /// input columns.
    ///
    /// # Errors
    /// Returns `ColumnMismatch` or `TypeMismatch` as for [`RiskModel::predict`].
    fn explain(&self, input: &ModelInput) -> Result<AttributionVector, ModelError>;
}

/// Check that `input` carries exactly `expected` columns in order.
///
/// # Errors
/// Returns `ColumnMismatch` listing both column sets.
pub fn ensure_columns(expected: &[String], input: &ModelInput) -> Result<(), ModelError> {
    if expected == input.columns.as_slice() {
        return Ok(());
    }
    Err(ModelError::ColumnMismatch {
        expected: expected.join(", "),
        found: input.columns.join(", "),
    })
}
