//! Prediction and explanation result types.

use serde::{Deserialize, Serialize};

use super::schema::Target;

/// Risk verdict derived from a model label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Low risk or the condition is absent
    Low,
    /// High risk for the condition
    High,
}

impl RiskLevel {
    /// Verdict text shown to the clinician.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Ramalan: Risiko rendah atau tiada keadaan ini.",
            Self::High => "Ramalan: Risiko tinggi untuk keadaan ini.",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Model label with its target-specific interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PredictionResult {
    pub target: Target,
    /// Class label emitted by the model (0 or 1)
    pub label: u8,
    pub risk: RiskLevel,
}

impl PredictionResult {
    /// Interpret a label for the given target.
    #[must_use]
    pub fn interpret(target: Target, label: u8) -> Self {
        let risk = if label == target.high_risk_label() {
            RiskLevel::High
        } else {
            RiskLevel::Low
        };
        Self {
            target,
            label,
            risk,
        }
    }
}

/// Per-feature contributions to one prediction, in record order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributionVector {
    pub features: Vec<String>,
    pub values: Vec<f64>,
    /// Model output before any feature is considered
    pub expected_value: f64,
}

impl AttributionVector {
    /// Model output implied by the attributions (expected value plus all contributions).
    #[must_use]
    pub fn output(&self) -> f64 {
        self.expected_value + self.values.iter().sum::<f64>()
    }

    /// Features sorted by descending absolute contribution.
    #[must_use]
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .features
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        ranked
    }

    /// Waterfall steps: running total after each ranked contribution.
    #[must_use]
    pub fn waterfall(&self) -> Vec<WaterfallStep<'_>> {
        let mut running = self.expected_value;
        self.ranked()
            .into_iter()
            .map(|(feature, contribution)| {
                let start = running;
                running += contribution;
                WaterfallStep {
                    feature,
                    contribution,
                    start,
                    end: running,
                }
            })
            .collect()
    }
}

/// One bar of a waterfall explanation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterfallStep<'a> {
    pub feature: &'a str,
    pub contribution: f64,
    pub start: f64,
    pub end: f64,
}

/// Error type for model loading, prediction and explanation.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model artifact not found: {0}")]
    NotFound(String),

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("Column mismatch: model expects [{expected}], record has [{found}]")]
    ColumnMismatch { expected: String, found: String },

    #[error("Column '{column}' must be {expected}, got {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Categorical columns differ: schema has [{expected}], model has [{found}]")]
    CategoricalMismatch { expected: String, found: String },

    #[error("Unknown category '{value}' for column '{column}'")]
    UnknownCategory { column: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_interpretation_is_target_specific() {
        assert_eq!(PredictionResult::interpret(Target::Ckd, 1).risk, RiskLevel::High);
        assert_eq!(PredictionResult::interpret(Target::Ckd, 0).risk, RiskLevel::Low);
        assert_eq!(
            PredictionResult::interpret(Target::Remission, 0).risk,
            RiskLevel::High
        );
        assert_eq!(
            PredictionResult::interpret(Target::Remission, 1).risk,
            RiskLevel::Low
        );
    }

    #[test]
    fn test_ranked_and_waterfall() {
        let attribution = AttributionVector {
            features: vec!["A".into(), "B".into(), "C".into()],
            values: vec![0.2, -0.9, 0.5],
            expected_value: -1.0,
        };

        let order: Vec<&str> = attribution.ranked().iter().map(|(f, _)| *f).collect();
        assert_eq!(order, ["B", "C", "A"]);

        let steps = attribution.waterfall();
        assert_eq!(steps.len(), 3);
        assert!((steps[0].start + 1.0).abs() < 1e-12);
        assert!((steps[2].end - attribution.output()).abs() < 1e-12);
        assert!((attribution.output() + 1.2).abs() < 1e-12);
    }
}
