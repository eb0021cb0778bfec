//! Additive model adapter: Implementation of RiskModel over a JSON export.
//!
//! The training pipeline exports each classifier as an additive logit
//! scorecard: one coefficient and training mean per numeric column, one
//! weight per level for categorical columns. Categorical columns are keyed by
//! the text form of their code, so `predict` expects them as text, exactly
//! like a categorical-aware booster. `explain` takes numeric cells only.
//!
//! Because the score is additive, the attribution of a column is its exact
//! contribution relative to the training expectation:
//! - numeric: `coefficient * (x - mean)`
//! - categorical: `weight[level] - expected`

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::coercion::encode_code;
use crate::domain::{AttributionVector, ModelError, ModelInput, ModelValue};
use crate::ports::{ensure_columns, RiskModel};

/// Format tag expected in exported files.
pub const ADDITIVE_FORMAT: &str = "additive-logit";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericTerm {
    pub coefficient: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalTerm {
    /// Weight per level, keyed by the text form of the code
    pub levels: BTreeMap<String, f64>,
    /// Expected weight over the training data; defaults to the level mean
    #[serde(default)]
    pub expected: Option<f64>,
}

impl CategoricalTerm {
    fn expected(&self) -> f64 {
        self.expected.unwrap_or_else(|| {
            if self.levels.is_empty() {
                0.0
            } else {
                self.levels.values().sum::<f64>() / self.levels.len() as f64
            }
        })
    }
}

/// Model parameters exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedAdditiveModel {
    pub format: String,
    pub version: u32,
    pub feature_names: Vec<String>,
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub numeric: BTreeMap<String, NumericTerm>,
    #[serde(default)]
    pub categorical: BTreeMap<String, CategoricalTerm>,
}

fn default_threshold() -> f64 {
    0.5
}

/// One column's term, resolved in feature order at load time.
#[derive(Debug, Clone)]
enum Term {
    Numeric(NumericTerm),
    Categorical(CategoricalTerm),
}

/// Additive logit scorecard loaded from JSON.
#[derive(Debug, Clone)]
pub struct AdditiveModel {
    columns: Vec<String>,
    terms: Vec<Term>,
    intercept: f64,
    threshold: f64,
}

impl AdditiveModel {
    /// Load and validate a model file.
    ///
    /// # Errors
    /// Returns `NotFound` if the file is absent and `InvalidArtifact` if it
    /// does not parse or fails validation.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = fs::read(path)
            .map_err(|e| ModelError::NotFound(format!("{}: {e}", path.display())))?;
        let exported: ExportedAdditiveModel = serde_json::from_slice(&bytes).map_err(|e| {
            ModelError::InvalidArtifact(format!("{}: {e}", path.display()))
        })?;

        let model = Self::from_export(exported)?;
        tracing::info!(
            path = %path.display(),
            columns = model.columns.len(),
            "Loaded additive model"
        );
        Ok(model)
    }

    /// Validate exported parameters.
    ///
    /// # Errors
    /// Returns `InvalidArtifact` on format, coverage or value problems.
    pub fn from_export(mut exported: ExportedAdditiveModel) -> Result<Self, ModelError> {
        if exported.format != ADDITIVE_FORMAT {
            return Err(ModelError::InvalidArtifact(format!(
                "unsupported format '{}'",
                exported.format
            )));
        }
        if exported.feature_names.is_empty() {
            return Err(ModelError::InvalidArtifact("no feature names".into()));
        }
        if !(exported.threshold > 0.0 && exported.threshold < 1.0) {
            return Err(ModelError::InvalidArtifact(format!(
                "threshold {} outside (0, 1)",
                exported.threshold
            )));
        }
        if !exported.intercept.is_finite() {
            return Err(ModelError::InvalidArtifact("intercept is not finite".into()));
        }

        let mut terms = Vec::with_capacity(exported.feature_names.len());
        for name in &exported.feature_names {
            let term = match (
                exported.numeric.remove(name),
                exported.categorical.remove(name),
            ) {
                (Some(n), None) => {
                    if !(n.coefficient.is_finite() && n.mean.is_finite()) {
                        return Err(ModelError::InvalidArtifact(format!(
                            "'{name}' has a non-finite term"
                        )));
                    }
                    Term::Numeric(n)
                }
                (None, Some(c)) => {
                    if c.levels.is_empty() || c.levels.values().any(|w| !w.is_finite()) {
                        return Err(ModelError::InvalidArtifact(format!(
                            "'{name}' needs finite level weights"
                        )));
                    }
                    Term::Categorical(c)
                }
                (None, None) => {
                    return Err(ModelError::InvalidArtifact(format!(
                        "'{name}' has no term or is declared twice"
                    )))
                }
                (Some(_), Some(_)) => {
                    return Err(ModelError::InvalidArtifact(format!(
                        "'{name}' is both numeric and categorical"
                    )))
                }
            };
            terms.push(term);
        }

        if let Some(extra) = exported.numeric.keys().chain(exported.categorical.keys()).next() {
            return Err(ModelError::InvalidArtifact(format!(
                "term for undeclared feature '{extra}'"
            )));
        }

        Ok(Self {
            columns: exported.feature_names,
            terms,
            intercept: exported.intercept,
            threshold: exported.threshold,
        })
    }

    /// Expected logit over the training data.
    #[must_use]
    pub fn expected_value(&self) -> f64 {
        self.terms.iter().fold(self.intercept, |acc, term| {
            acc + match term {
                Term::Numeric(n) => n.coefficient * n.mean,
                Term::Categorical(c) => c.expected(),
            }
        })
    }

    /// Raw logit for a predictor row.
    fn logit(&self, input: &ModelInput) -> Result<f64, ModelError> {
        ensure_columns(&self.columns, input)?;

        let mut logit = self.intercept;
        for ((column, value), term) in input.iter().zip(&self.terms) {
            logit += match (term, value) {
                (Term::Categorical(c), ModelValue::Text(level)) => level_weight(c, column, level)?,
                (Term::Categorical(_), other) => {
                    return Err(ModelError::TypeMismatch {
                        column: column.to_string(),
                        expected: "text",
                        found: other.type_name(),
                    })
                }
                (Term::Numeric(n), other) => n.coefficient * numeric(column, other)?,
            };
        }
        Ok(logit)
    }

    /// Probability of the positive class for a predictor row.
    ///
    /// # Errors
    /// Same as [`RiskModel::predict`].
    pub fn predict_proba(&self, input: &ModelInput) -> Result<f64, ModelError> {
        self.logit(input).map(sigmoid)
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn numeric(column: &str, value: &ModelValue) -> Result<f64, ModelError> {
    value.as_f64().ok_or_else(|| ModelError::TypeMismatch {
        column: column.to_string(),
        expected: "numeric",
        found: value.type_name(),
    })
}

fn level_weight(term: &CategoricalTerm, column: &str, level: &str) -> Result<f64, ModelError> {
    term.levels
        .get(level)
        .copied()
        .ok_or_else(|| ModelError::UnknownCategory {
            column: column.to_string(),
            value: level.to_string(),
        })
}

impl RiskModel for AdditiveModel {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn categorical_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .zip(&self.terms)
            .filter(|(_, t)| matches!(t, Term::Categorical(_)))
            .map(|(c, _)| c.as_str())
            .collect()
    }

    fn predict(&self, input: &ModelInput) -> Result<u8, ModelError> {
        let probability = self.predict_proba(input)?;
        tracing::debug!(probability, "Additive model scored row");
        Ok(u8::from(probability >= self.threshold))
    }

    fn explain(&self, input: &ModelInput) -> Result<AttributionVector, ModelError> {
        ensure_columns(&self.columns, input)?;

        let mut values = Vec::with_capacity(self.terms.len());
        for ((column, value), term) in input.iter().zip(&self.terms) {
            let x = numeric(column, value)?;
            let contribution = match term {
                Term::Numeric(n) => n.coefficient * (x - n.mean),
                Term::Categorical(c) => {
                    if x.fract() != 0.0 {
                        return Err(ModelError::TypeMismatch {
                            column: column.to_string(),
                            expected: "integer",
                            found: value.type_name(),
                        });
                    }
                    // Levels are keyed by the text form of the code.
                    level_weight(c, column, &encode_code(x as i64))? - c.expected()
                }
            };
            values.push(contribution);
        }

        Ok(AttributionVector {
            features: self.columns.clone(),
            values,
            expected_value: self.expected_value(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn export() -> ExportedAdditiveModel {
        serde_json::from_str(
            r#"{
                "format": "additive-logit",
                "version": 1,
                "feature_names": ["RACE", "UPCR"],
                "intercept": -1.0,
                "numeric": { "UPCR": { "coefficient": 0.8, "mean": 1.5 } },
                "categorical": {
                    "RACE": { "levels": { "0": 0.3, "1": -0.3, "2": 0.0 } }
                }
            }"#,
        )
        .expect("valid json")
    }

    fn row(race: ModelValue, upcr: f64) -> ModelInput {
        ModelInput {
            columns: vec!["RACE".into(), "UPCR".into()],
            values: vec![race, ModelValue::Real(upcr)],
        }
    }

    #[test]
    fn test_predict_requires_text_categoricals() {
        let model = AdditiveModel::from_export(export()).unwrap();

        assert!(model.predict(&row(ModelValue::Text("1".into()), 0.5)).is_ok());
        let err = model.predict(&row(ModelValue::Integer(1), 0.5)).unwrap_err();
        assert!(matches!(err, ModelError::TypeMismatch { expected: "text", .. }));
    }

    #[test]
    fn test_explain_rejects_text() {
        let model = AdditiveModel::from_export(export()).unwrap();
        let err = model.explain(&row(ModelValue::Text("1".into()), 0.5)).unwrap_err();
        assert!(matches!(err, ModelError::TypeMismatch { expected: "numeric", .. }));
    }

    #[test]
    fn test_attributions_sum_to_logit() {
        let model = AdditiveModel::from_export(export()).unwrap();

        let explained = model.explain(&row(ModelValue::Integer(0), 4.0)).unwrap();
        let logit = model.logit(&row(ModelValue::Text("0".into()), 4.0)).unwrap();

        assert!((explained.output() - logit).abs() < 1e-12);
        assert!((explained.values[1] - 0.8 * 2.5).abs() < 1e-12);
        assert!((explained.values[0] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_categorical_columns_follow_terms() {
        let model = AdditiveModel::from_export(export()).unwrap();
        assert_eq!(model.categorical_columns(), ["RACE"]);
    }

    #[test]
    fn test_threshold_decides_label() {
        let model = AdditiveModel::from_export(export()).unwrap();
        assert_eq!(model.predict(&row(ModelValue::Text("1".into()), 0.0)).unwrap(), 0);
        assert_eq!(model.predict(&row(ModelValue::Text("0".into()), 5.0)).unwrap(), 1);
    }

    #[test]
    fn test_column_order_is_enforced() {
        let model = AdditiveModel::from_export(export()).unwrap();
        let swapped = ModelInput {
            columns: vec!["UPCR".into(), "RACE".into()],
            values: vec![ModelValue::Real(1.0), ModelValue::Text("0".into())],
        };
        assert!(matches!(
            model.predict(&swapped),
            Err(ModelError::ColumnMismatch { .. })
        ));
    }

    #[test]
    fn test_export_validation() {
        let mut missing_term = export();
        missing_term.numeric.clear();
        assert!(AdditiveModel::from_export(missing_term).is_err());

        let mut extra = export();
        extra.numeric.insert(
            "EGFR".into(),
            NumericTerm {
                coefficient: 1.0,
                mean: 0.0,
            },
        );
        assert!(AdditiveModel::from_export(extra).is_err());

        let mut bad_format = export();
        bad_format.format = "pickle".into();
        assert!(AdditiveModel::from_export(bad_format).is_err());
    }

    #[test]
    fn test_unknown_level() {
        let model = AdditiveModel::from_export(export()).unwrap();
        let err = model.predict(&row(ModelValue::Text("7".into()), 1.0)).unwrap_err();
        assert!(matches!(err, ModelError::UnknownCategory { .. }));
    }
}
