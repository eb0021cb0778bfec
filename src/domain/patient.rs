//! Patient record assembly.
//!
//! Raw values come from the form keyed by feature name, in whatever order the
//! form collected them. Assembly coerces them to typed values, applies the
//! pipeline's missingness rules and reindexes by the declared schema order.

use std::collections::HashMap;

use serde::Serialize;

use super::schema::{MissingnessRule, Pipeline, SchemaError, Target, TargetSchema, MISSING_SENTINEL};

/// A value as produced by a form control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RawValue {
    /// Selected code of a choice control
    Choice(i64),
    /// Parsed numeric entry
    Number(f64),
}

/// Values collected from the form, keyed by feature name.
pub type RawInput = HashMap<String, RawValue>;

/// A typed feature value in an assembled record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    /// Categorical code
    Code(i64),
    /// Continuous measurement
    Measure(f64),
}

impl FeatureValue {
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Code(c) => *c as f64,
            Self::Measure(m) => *m,
        }
    }

    /// Integer view of the value, if it is integral.
    #[must_use]
    pub fn as_code(&self) -> Option<i64> {
        match self {
            Self::Code(c) => Some(*c),
            Self::Measure(m) if m.fract() == 0.0 && m.is_finite() => Some(*m as i64),
            Self::Measure(_) => None,
        }
    }
}

impl std::fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code(c) => write!(f, "{c}"),
            Self::Measure(m) => write!(f, "{m:?}"),
        }
    }
}

/// Finalized patient record, ordered exactly as the schema declares.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientRecord {
    pub pipeline: Pipeline,
    pub target: Target,
    entries: Vec<(String, FeatureValue)>,
}

impl PatientRecord {
    /// Feature names in record order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FeatureValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Assemble a finalized record from raw form values.
///
/// Choice outputs become integer codes and numeric entries become floats,
/// following the declared kind of each feature. Missingness rules run next,
/// then the record is reindexed by the declared order. Collected names that
/// the schema does not declare are dropped.
///
/// # Errors
/// Returns `InvalidValue` for a choice outside its legal codes or a
/// non-finite measurement, and `SchemaMismatch` when declared features are
/// still absent after conditioning.
pub fn assemble(schema: &TargetSchema, raw: &RawInput) -> Result<PatientRecord, SchemaError> {
    let mut values: HashMap<&str, FeatureValue> = HashMap::with_capacity(raw.len() + 2);

    for (name, value) in raw {
        let typed = match schema.get(name) {
            Some(feature) if feature.kind.is_choice() => {
                let code = match *value {
                    RawValue::Choice(code) => code,
                    RawValue::Number(n) if n.fract() == 0.0 && n.is_finite() => n as i64,
                    RawValue::Number(n) => {
                        return Err(SchemaError::InvalidValue {
                            feature: name.clone(),
                            reason: format!("{n} is not a category code"),
                        })
                    }
                };
                if !feature.kind.accepts_code(code) {
                    return Err(SchemaError::InvalidValue {
                        feature: name.clone(),
                        reason: format!("code {code} is not a legal option"),
                    });
                }
                FeatureValue::Code(code)
            }
            Some(_) => match *value {
                RawValue::Number(n) if !n.is_finite() => {
                    return Err(SchemaError::InvalidValue {
                        feature: name.clone(),
                        reason: "value must be a finite number".to_string(),
                    })
                }
                RawValue::Number(n) => FeatureValue::Measure(n),
                RawValue::Choice(c) => FeatureValue::Measure(c as f64),
            },
            None => match *value {
                RawValue::Choice(c) => FeatureValue::Code(c),
                RawValue::Number(n) => FeatureValue::Measure(n),
            },
        };
        values.insert(name.as_str(), typed);
    }

    apply_missingness(&mut values, schema.rules());

    let mut missing = Vec::new();
    let mut entries = Vec::with_capacity(schema.len());
    for name in schema.names() {
        match values.get(name) {
            Some(value) => entries.push((name.to_string(), *value)),
            None => missing.push(name.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(SchemaError::SchemaMismatch { missing });
    }

    Ok(PatientRecord {
        pipeline: schema.pipeline,
        target: schema.target,
        entries,
    })
}

/// Force each rule's dependent to its default where the flag is set.
///
/// The dependent is inserted even if it was never collected. Idempotent.
pub fn apply_missingness<'a>(
    values: &mut HashMap<&'a str, FeatureValue>,
    rules: &'a [MissingnessRule],
) {
    for rule in rules {
        let flagged = values
            .get(rule.flag)
            .and_then(FeatureValue::as_code)
            .is_some_and(|code| code == MISSING_SENTINEL);
        if flagged {
            values.insert(rule.dependent, FeatureValue::Measure(rule.default));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn baseline_schema() -> TargetSchema {
        TargetSchema::from_feature_list(
            Pipeline::Baseline,
            Target::Ckd,
            [
                "AGE AT LN",
                "RACE",
                "GLOBAL SCLEROSIS-MISSING",
                "GLOBAL SCLEROSIS",
                "CRESCENT-MISSING",
                "CRESCENT",
                "FIRST OR RELAPSE LN",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            "inline",
        )
        .expect("valid schema")
    }

    fn raw(pairs: &[(&str, RawValue)]) -> RawInput {
        pairs.iter().map(|(n, v)| (n.to_string(), *v)).collect()
    }

    #[test]
    fn test_flag_forces_uncollected_dependent() {
        let input = raw(&[
            ("FIRST OR RELAPSE LN", RawValue::Choice(2)),
            ("CRESCENT", RawValue::Number(12.5)),
            ("CRESCENT-MISSING", RawValue::Choice(0)),
            ("GLOBAL SCLEROSIS-MISSING", RawValue::Choice(1)),
            ("RACE", RawValue::Choice(1)),
            ("AGE AT LN", RawValue::Number(27.0)),
        ]);

        let record = assemble(&baseline_schema(), &input).expect("assembles");
        assert_eq!(record.get("GLOBAL SCLEROSIS"), Some(FeatureValue::Measure(0.0)));
        assert_eq!(record.get("CRESCENT"), Some(FeatureValue::Measure(12.5)));
        assert_eq!(record.get("RACE"), Some(FeatureValue::Code(1)));
    }

    #[test]
    fn test_flag_overrides_collected_dependent() {
        let input = raw(&[
            ("FIRST OR RELAPSE LN", RawValue::Choice(1)),
            ("CRESCENT", RawValue::Number(40.0)),
            ("CRESCENT-MISSING", RawValue::Choice(1)),
            ("GLOBAL SCLEROSIS", RawValue::Number(3.0)),
            ("GLOBAL SCLEROSIS-MISSING", RawValue::Choice(0)),
            ("RACE", RawValue::Choice(0)),
            ("AGE AT LN", RawValue::Number(31.0)),
        ]);

        let record = assemble(&baseline_schema(), &input).unwrap();
        assert_eq!(record.get("CRESCENT"), Some(FeatureValue::Measure(0.0)));
        assert_eq!(record.get("GLOBAL SCLEROSIS"), Some(FeatureValue::Measure(3.0)));
    }

    #[test]
    fn test_unset_flag_without_dependent_is_mismatch() {
        let input = raw(&[
            ("FIRST OR RELAPSE LN", RawValue::Choice(1)),
            ("CRESCENT-MISSING", RawValue::Choice(1)),
            ("GLOBAL SCLEROSIS-MISSING", RawValue::Choice(0)),
            ("RACE", RawValue::Choice(0)),
            ("AGE AT LN", RawValue::Number(31.0)),
        ]);

        match assemble(&baseline_schema(), &input) {
            Err(SchemaError::SchemaMismatch { missing }) => {
                assert_eq!(missing, ["GLOBAL SCLEROSIS"]);
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_illegal_code_rejected() {
        let input = raw(&[("FIRST OR RELAPSE LN", RawValue::Choice(0))]);
        let err = assemble(&baseline_schema(), &input).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidValue { ref feature, .. } if feature == "FIRST OR RELAPSE LN"));
    }

    #[test]
    fn test_extras_are_dropped() {
        let mut input = raw(&[
            ("FIRST OR RELAPSE LN", RawValue::Choice(1)),
            ("CRESCENT-MISSING", RawValue::Choice(1)),
            ("GLOBAL SCLEROSIS-MISSING", RawValue::Choice(1)),
            ("RACE", RawValue::Choice(2)),
            ("AGE AT LN", RawValue::Number(45.0)),
        ]);
        input.insert("NOT DECLARED".to_string(), RawValue::Number(9.0));

        let record = assemble(&baseline_schema(), &input).unwrap();
        assert_eq!(record.len(), baseline_schema().len());
        assert!(record.get("NOT DECLARED").is_none());
    }

    #[test]
    fn test_numeric_entry_keeps_float() {
        let input = raw(&[
            ("FIRST OR RELAPSE LN", RawValue::Choice(1)),
            ("CRESCENT-MISSING", RawValue::Choice(1)),
            ("GLOBAL SCLEROSIS-MISSING", RawValue::Choice(1)),
            ("RACE", RawValue::Choice(2)),
            ("AGE AT LN", RawValue::Choice(45)),
        ]);
        let record = assemble(&baseline_schema(), &input).unwrap();
        assert_eq!(record.get("AGE AT LN"), Some(FeatureValue::Measure(45.0)));
    }

    proptest! {
        #[test]
        fn prop_record_matches_schema_order(
            age in 0.0f64..100.0,
            race in 0i64..3,
            relapse in 1i64..3,
            gs_flag in 0i64..2,
            cr_flag in 0i64..2,
            gs in 0.0f64..100.0,
            cr in 0.0f64..100.0,
            shuffle in any::<bool>(),
        ) {
            let mut pairs = vec![
                ("AGE AT LN", RawValue::Number(age)),
                ("RACE", RawValue::Choice(race)),
                ("FIRST OR RELAPSE LN", RawValue::Choice(relapse)),
                ("GLOBAL SCLEROSIS-MISSING", RawValue::Choice(gs_flag)),
                ("CRESCENT-MISSING", RawValue::Choice(cr_flag)),
                ("GLOBAL SCLEROSIS", RawValue::Number(gs)),
                ("CRESCENT", RawValue::Number(cr)),
            ];
            if shuffle {
                pairs.reverse();
            }

            let schema = baseline_schema();
            let record = assemble(&schema, &raw(&pairs)).unwrap();
            let got: Vec<&str> = record.names().collect();
            let want: Vec<&str> = schema.names().collect();
            prop_assert_eq!(got, want);
        }

        #[test]
        fn prop_missingness_is_idempotent(prior in proptest::option::of(-1000.0f64..1000.0)) {
            let rules = Pipeline::Baseline.tables().missingness;
            let mut values: HashMap<&str, FeatureValue> = HashMap::new();
            values.insert("GLOBAL SCLEROSIS-MISSING", FeatureValue::Code(1));
            if let Some(prior) = prior {
                values.insert("GLOBAL SCLEROSIS", FeatureValue::Measure(prior));
            }

            apply_missingness(&mut values, rules);
            let once = values.clone();
            apply_missingness(&mut values, rules);

            prop_assert_eq!(&once, &values);
            prop_assert_eq!(values.get("GLOBAL SCLEROSIS"), Some(&FeatureValue::Measure(0.0)));
        }
    }
}
