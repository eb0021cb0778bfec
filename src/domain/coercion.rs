//! Typed projections of a patient record for the external collaborators.
//!
//! The categorical-aware predictor takes certain categorical columns as text,
//! while the explainer takes every column as a number. Both views are derived
//! from the same canonical record; the record itself is never mutated.

use serde::Serialize;

use super::diagnosis::ModelError;
use super::patient::{FeatureValue, PatientRecord};

/// A single cell handed to the model or explainer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModelValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl ModelValue {
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
        }
    }

    /// Numeric value, `None` for text.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Real(r) => Some(*r),
            Self::Text(_) => None,
        }
    }
}

/// One input row with named columns in record order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInput {
    pub columns: Vec<String>,
    pub values: Vec<ModelValue>,
}

impl ModelInput {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelValue)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Text form of a category code.
#[must_use]
pub fn encode_code(code: i64) -> String {
    code.to_string()
}

/// Parse the text form of a category code back to its integer.
///
/// # Errors
/// Returns `UnknownCategory` if the text is not an integer.
pub fn parse_code(column: &str, text: &str) -> Result<i64, ModelError> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| ModelError::UnknownCategory {
            column: column.to_string(),
            value: text.to_string(),
        })
}

fn numeric_cell(value: FeatureValue) -> ModelValue {
    match value {
        FeatureValue::Code(c) => ModelValue::Integer(c),
        FeatureValue::Measure(m) => ModelValue::Real(m),
    }
}

/// View for the categorical-aware predictor: `text_columns` become text.
#[must_use]
pub fn predictor_view(record: &PatientRecord, text_columns: &[&str]) -> ModelInput {
    let mut columns = Vec::with_capacity(record.len());
    let mut values = Vec::with_capacity(record.len());

    for (name, value) in record.iter() {
        let cell = if text_columns.iter().any(|c| *c == name) {
            match value.as_code() {
                Some(code) => ModelValue::Text(encode_code(code)),
                None => numeric_cell(value),
            }
        } else {
            numeric_cell(value)
        };
        columns.push(name.to_string());
        values.push(cell);
    }

    ModelInput { columns, values }
}

/// View for the explainer: `integer_columns` are guaranteed integer-typed.
#[must_use]
pub fn explainer_view(record: &PatientRecord, integer_columns: &[&str]) -> ModelInput {
    let mut columns = Vec::with_capacity(record.len());
    let mut values = Vec::with_capacity(record.len());

    for (name, value) in record.iter() {
        let cell = match value.as_code() {
            Some(code) if integer_columns.iter().any(|c| *c == name) => ModelValue::Integer(code),
            _ => numeric_cell(value),
        };
        columns.push(name.to_string());
        values.push(cell);
    }

    ModelInput { columns, values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::patient::{assemble, RawInput, RawValue};
    use crate::domain::schema::{Pipeline, Target, TargetSchema};
    use proptest::prelude::*;

    fn record() -> PatientRecord {
        let schema = TargetSchema::from_feature_list(
            Pipeline::Baseline,
            Target::Remission,
            ["RACE", "BASELINE UPCR", "LA", "MSK"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            "inline",
        )
        .unwrap();
        let raw: RawInput = [
            ("MSK", RawValue::Choice(1)),
            ("LA", RawValue::Choice(2)),
            ("BASELINE UPCR", RawValue::Number(3.25)),
            ("RACE", RawValue::Choice(1)),
        ]
        .iter()
        .map(|(n, v)| (n.to_string(), *v))
        .collect();
        assemble(&schema, &raw).unwrap()
    }

    #[test]
    fn test_predictor_view_texts_subset_only() {
        let view = predictor_view(&record(), &["RACE", "LA"]);
        assert_eq!(view.columns, ["RACE", "BASELINE UPCR", "LA", "MSK"]);
        assert_eq!(
            view.values,
            [
                ModelValue::Text("1".into()),
                ModelValue::Real(3.25),
                ModelValue::Text("2".into()),
                ModelValue::Integer(1),
            ]
        );
    }

    #[test]
    fn test_explainer_view_has_no_text() {
        let record = record();
        let _ = predictor_view(&record, &["RACE", "LA"]);
        let view = explainer_view(&record, &["RACE", "LA"]);
        assert!(view.values.iter().all(|v| v.as_f64().is_some()));
        assert_eq!(view.values[0], ModelValue::Integer(1));
        assert_eq!(view.values[2], ModelValue::Integer(2));
    }

    #[test]
    fn test_parse_code_rejects_labels() {
        assert!(parse_code("RACE", "Cina").is_err());
        assert_eq!(parse_code("RACE", " 2 ").unwrap(), 2);
    }

    proptest! {
        #[test]
        fn prop_code_text_round_trip(code in 0i64..3) {
            prop_assert_eq!(parse_code("RACE", &encode_code(code)).unwrap(), code);
        }
    }
}
