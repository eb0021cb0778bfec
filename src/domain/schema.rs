//! Feature schemas for the two prediction pipelines.
//!
//! A schema combines the declared feature list of a target (produced by the
//! feature-selection step and shipped as JSON) with a static classification
//! table per pipeline. The declared order is also the column order the model
//! expects.

use std::collections::HashSet;

use serde::Serialize;

/// Prediction pipeline (one form and model family per pipeline).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Pipeline {
    /// Values at the time of assessment
    CurrentState,
    /// Values at lupus nephritis diagnosis
    Baseline,
}

impl Pipeline {
    pub const ALL: [Pipeline; 2] = [Pipeline::CurrentState, Pipeline::Baseline];

    /// Directory holding this pipeline's artifacts.
    #[must_use]
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::CurrentState => "current",
            Self::Baseline => "baseline",
        }
    }

    /// Parse a pipeline from its directory name.
    #[must_use]
    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.dir_name().eq_ignore_ascii_case(name.trim()))
    }

    #[must_use]
    pub fn toggle(self) -> Self {
        match self {
            Self::CurrentState => Self::Baseline,
            Self::Baseline => Self::CurrentState,
        }
    }

    /// Static classification table for this pipeline.
    #[must_use]
    pub fn tables(&self) -> &'static PipelineTables {
        match self {
            Self::CurrentState => &CURRENT_STATE_TABLES,
            Self::Baseline => &BASELINE_TABLES,
        }
    }
}

impl std::fmt::Display for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CurrentState => write!(f, "Current state"),
            Self::Baseline => write!(f, "Baseline"),
        }
    }
}

/// Clinical endpoint predicted by a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Target {
    /// Chronic kidney disease progression
    Ckd,
    /// Disease remission
    Remission,
}

impl Target {
    pub const ALL: [Target; 2] = [Target::Ckd, Target::Remission];

    /// Lowercase stem used in artifact and export filenames.
    #[must_use]
    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::Ckd => "ckd",
            Self::Remission => "remission",
        }
    }

    /// The label the model emits for the high-risk outcome.
    ///
    /// Not symmetric: a CKD model flags risk with 1, a remission model
    /// flags risk by predicting no remission (0).
    #[must_use]
    pub fn high_risk_label(&self) -> u8 {
        match self {
            Self::Ckd => 1,
            Self::Remission => 0,
        }
    }

    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Ckd => Self::Remission,
            Self::Remission => Self::Ckd,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ckd => write!(f, "CKD"),
            Self::Remission => write!(f, "Remission"),
        }
    }
}

/// One legal code of a choice control, with an optional display label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChoiceOption {
    pub code: i64,
    pub label: Option<&'static str>,
}

impl ChoiceOption {
    const fn plain(code: i64) -> Self {
        Self { code, label: None }
    }

    const fn labelled(code: i64, label: &'static str) -> Self {
        Self {
            code,
            label: Some(label),
        }
    }

    /// Text shown for this option: the label if any, otherwise the code.
    #[must_use]
    pub fn display(&self) -> String {
        match self.label {
            Some(label) => label.to_string(),
            None => self.code.to_string(),
        }
    }
}

/// Input classification of a feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FeatureKind {
    /// Free-form continuous measurement
    Numeric,
    /// Exactly {0, 1}, no display remap
    Binary,
    /// Enumerated small integer codes, optionally labelled
    Categorical { options: &'static [ChoiceOption] },
}

pub const BINARY_OPTIONS: &[ChoiceOption] = &[ChoiceOption::plain(0), ChoiceOption::plain(1)];

impl FeatureKind {
    /// Options offered by a choice control, `None` for numeric features.
    #[must_use]
    pub fn options(&self) -> Option<&'static [ChoiceOption]> {
        match self {
            Self::Numeric => None,
            Self::Binary => Some(BINARY_OPTIONS),
            Self::Categorical { options } => Some(*options),
        }
    }

    #[must_use]
    pub fn is_choice(&self) -> bool {
        !matches!(self, Self::Numeric)
    }

    /// Whether `code` is a legal value. Numeric features accept any code.
    #[must_use]
    pub fn accepts_code(&self, code: i64) -> bool {
        match self.options() {
            Some(options) => options.iter().any(|o| o.code == code),
            None => true,
        }
    }
}

/// A declared feature with its classification and declared position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSchema {
    pub name: String,
    pub kind: FeatureKind,
    pub order_index: usize,
}

/// Default substitution for a feature whose value was not observed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MissingnessRule {
    /// Binary indicator set to [`MISSING_SENTINEL`] when the value is missing
    pub flag: &'static str,
    /// Continuous feature overwritten when the flag is set
    pub dependent: &'static str,
    pub default: f64,
}

/// Flag value meaning "not observed".
pub const MISSING_SENTINEL: i64 = 1;

/// Static per-pipeline classification and conditioning tables.
#[derive(Debug)]
pub struct PipelineTables {
    pub binary: &'static [&'static str],
    pub categorical: &'static [(&'static str, &'static [ChoiceOption])],
    pub missingness: &'static [MissingnessRule],
    /// Categorical features the predictor wants as text
    pub text_categoricals: &'static [&'static str],
    /// Features with a precomputed dependence plot, per target
    pub dependence_ckd: &'static [&'static str],
    pub dependence_remission: &'static [&'static str],
}

impl PipelineTables {
    /// Classify a feature name. Unlisted names are numeric.
    #[must_use]
    pub fn classify(&self, name: &str) -> FeatureKind {
        if let Some(&(_, options)) = self.categorical.iter().find(|(n, _)| *n == name) {
            return FeatureKind::Categorical { options };
        }
        if self.binary.iter().any(|b| *b == name) {
            return FeatureKind::Binary;
        }
        FeatureKind::Numeric
    }

    #[must_use]
    pub fn dependence_features(&self, target: Target) -> &'static [&'static str] {
        match target {
            Target::Ckd => self.dependence_ckd,
            Target::Remission => self.dependence_remission,
        }
    }

    /// The rule whose dependent is `name`, if any.
    #[must_use]
    pub fn rule_for_dependent(&self, name: &str) -> Option<&'static MissingnessRule> {
        self.missingness.iter().find(|r| r.dependent == name)
    }
}

static CURRENT_STATE_TABLES: PipelineTables = PipelineTables {
    binary: &[
        "MSK",
        "MUCOCUTANEOS",
        "NPSLE",
        "GIT",
        "FIRST OR RELAPSE LN",
        "ANY CR 6 MTH",
        "AC KIDNEY INJURY INITIAL (AKI)",
        "CR 12 MTH PRED 7.5",
        "GLOBAL SCLEROSIS_MISSING",
        "CKD",
        "CR 6 MTH PRED 10",
        "CR 6 MTH PRED 7.5",
        "RB_diffuse",
        "ACE/ARB",
    ],
    categorical: &[
        (
            "GENDER",
            &[
                ChoiceOption::labelled(0, "Perempuan"),
                ChoiceOption::labelled(1, "Lelaki"),
            ],
        ),
        (
            "RACE",
            &[
                ChoiceOption::labelled(0, "Malay"),
                ChoiceOption::labelled(1, "Chinese"),
                ChoiceOption::labelled(2, "Indian/Other"),
            ],
        ),
        (
            "APL POSITIVE",
            &[
                ChoiceOption::plain(0),
                ChoiceOption::plain(1),
                ChoiceOption::plain(2),
            ],
        ),
        (
            "LA",
            &[
                ChoiceOption::labelled(0, "Negatif"),
                ChoiceOption::labelled(1, "Positif"),
                ChoiceOption::labelled(2, "Tidak Diuji"),
            ],
        ),
    ],
    missingness: &[],
    text_categoricals: &[],
    dependence_ckd: &["EGFR", "UPCR", "SERUM CREATININE", "CHRONICITY INDEX"],
    dependence_remission: &["UPCR", "SERUM ALBUMIN", "C3", "ACTIVITY INDEX"],
};

static BASELINE_TABLES: PipelineTables = PipelineTables {
    binary: &[
        "MSK",
        "MUCOCUTANEOS",
        "NPSLE",
        "GIT",
        "SEROSITIS",
        "HAEMATOLOGICAL",
        "HYPERTENSION",
        "GLOBAL SCLEROSIS-MISSING",
        "CRESCENT-MISSING",
        "ACE/ARB",
        "HCQ",
    ],
    categorical: &[
        (
            "GENDER",
            &[
                ChoiceOption::labelled(0, "Female"),
                ChoiceOption::labelled(1, "Male"),
            ],
        ),
        (
            "RACE",
            &[
                ChoiceOption::labelled(0, "Melayu"),
                ChoiceOption::labelled(1, "Cina"),
                ChoiceOption::labelled(2, "India"),
            ],
        ),
        (
            "APL POSITIVE",
            &[
                ChoiceOption::labelled(0, "Negative"),
                ChoiceOption::labelled(1, "Positive"),
                ChoiceOption::labelled(2, "Not tested"),
            ],
        ),
        (
            "LA",
            &[
                ChoiceOption::labelled(0, "Negative"),
                ChoiceOption::labelled(1, "Positive"),
                ChoiceOption::labelled(2, "Not tested"),
            ],
        ),
        // First episode = 1, relapse = 2.
        (
            "FIRST OR RELAPSE LN",
            &[ChoiceOption::plain(1), ChoiceOption::plain(2)],
        ),
    ],
    missingness: &[
        MissingnessRule {
            flag: "GLOBAL SCLEROSIS-MISSING",
            dependent: "GLOBAL SCLEROSIS",
            default: 0.0,
        },
        MissingnessRule {
            flag: "CRESCENT-MISSING",
            dependent: "CRESCENT",
            default: 0.0,
        },
    ],
    text_categoricals: &["GENDER", "RACE", "LA", "APL POSITIVE", "FIRST OR RELAPSE LN"],
    dependence_ckd: &["BASELINE EGFR", "BASELINE UPCR", "GLOBAL SCLEROSIS", "AGE AT LN"],
    dependence_remission: &["BASELINE UPCR", "SERUM ALBUMIN", "CRESCENT", "ANTI-DSDNA"],
};

/// Error type for schema loading and record assembly.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Feature schema not found for {pipeline} {target} at {path}: {reason}")]
    SchemaNotFound {
        pipeline: Pipeline,
        target: Target,
        path: String,
        reason: String,
    },

    #[error("Assembled record is missing declared features: {}", missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    #[error("{feature}: {reason}")]
    InvalidValue { feature: String, reason: String },
}

/// Ordered schema for one pipeline and target.
#[derive(Debug, Clone, Serialize)]
pub struct TargetSchema {
    pub pipeline: Pipeline,
    pub target: Target,
    pub features: Vec<FeatureSchema>,
}

impl TargetSchema {
    /// Build a schema from a declared feature list.
    ///
    /// # Errors
    /// Returns `SchemaNotFound` if the list is empty or names a feature twice.
    pub fn from_feature_list(
        pipeline: Pipeline,
        target: Target,
        names: Vec<String>,
        source: &str,
    ) -> Result<Self, SchemaError> {
        let not_found = |reason: String| SchemaError::SchemaNotFound {
            pipeline,
            target,
            path: source.to_string(),
            reason,
        };

        if names.is_empty() {
            return Err(not_found("feature list is empty".to_string()));
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if name.trim().is_empty() {
                return Err(not_found("feature list contains a blank name".to_string()));
            }
            if !seen.insert(name.as_str()) {
                return Err(not_found(format!("feature '{name}' is declared twice")));
            }
        }

        let tables = pipeline.tables();
        let features = names
            .into_iter()
            .enumerate()
            .map(|(order_index, name)| FeatureSchema {
                kind: tables.classify(&name),
                name,
                order_index,
            })
            .collect();

        Ok(Self {
            pipeline,
            target,
            features,
        })
    }

    /// Declared feature names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.name.as_str())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FeatureSchema> {
        self.features.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Missingness rules of this pipeline.
    #[must_use]
    pub fn rules(&self) -> &'static [MissingnessRule] {
        self.pipeline.tables().missingness
    }

    /// Text-coerced categorical features that this schema declares.
    #[must_use]
    pub fn text_categoricals(&self) -> Vec<&'static str> {
        self.pipeline
            .tables()
            .text_categoricals
            .iter()
            .copied()
            .filter(|name| self.get(name).is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_classification_tables_differ_per_pipeline() {
        let current = Pipeline::CurrentState.tables().classify("RACE");
        let baseline = Pipeline::Baseline.tables().classify("RACE");

        let labels = |kind: &FeatureKind| -> Vec<String> {
            kind.options()
                .expect("RACE is a choice")
                .iter()
                .map(ChoiceOption::display)
                .collect()
        };
        assert_eq!(labels(&current), ["Malay", "Chinese", "Indian/Other"]);
        assert_eq!(labels(&baseline), ["Melayu", "Cina", "India"]);
    }

    #[test]
    fn test_first_or_relapse_encoding() {
        assert_eq!(
            Pipeline::CurrentState.tables().classify("FIRST OR RELAPSE LN"),
            FeatureKind::Binary
        );

        let baseline = Pipeline::Baseline.tables().classify("FIRST OR RELAPSE LN");
        let codes: Vec<i64> = baseline.options().unwrap().iter().map(|o| o.code).collect();
        assert_eq!(codes, [1, 2]);
        assert!(!baseline.accepts_code(0));
        assert!(baseline.options().unwrap().iter().all(|o| o.label.is_none()));
    }

    #[test]
    fn test_unlisted_feature_is_numeric() {
        assert_eq!(
            Pipeline::CurrentState.tables().classify("EGFR"),
            FeatureKind::Numeric
        );
    }

    #[test]
    fn test_schema_preserves_declared_order() {
        let schema = TargetSchema::from_feature_list(
            Pipeline::CurrentState,
            Target::Ckd,
            names(&["EGFR", "GENDER", "MSK"]),
            "inline",
        )
        .expect("valid list");

        let order: Vec<&str> = schema.names().collect();
        assert_eq!(order, ["EGFR", "GENDER", "MSK"]);
        assert_eq!(schema.features[2].order_index, 2);
        assert_eq!(schema.features[2].kind, FeatureKind::Binary);
    }

    #[test]
    fn test_duplicate_and_empty_lists_rejected() {
        let dup = TargetSchema::from_feature_list(
            Pipeline::Baseline,
            Target::Remission,
            names(&["RACE", "RACE"]),
            "inline",
        );
        assert!(matches!(dup, Err(SchemaError::SchemaNotFound { .. })));

        let empty =
            TargetSchema::from_feature_list(Pipeline::Baseline, Target::Ckd, Vec::new(), "inline");
        assert!(matches!(empty, Err(SchemaError::SchemaNotFound { .. })));
    }

    #[test]
    fn test_text_categoricals_limited_to_declared() {
        let schema = TargetSchema::from_feature_list(
            Pipeline::Baseline,
            Target::Ckd,
            names(&["RACE", "BASELINE EGFR", "LA"]),
            "inline",
        )
        .unwrap();
        assert_eq!(schema.text_categoricals(), ["RACE", "LA"]);

        let current = TargetSchema::from_feature_list(
            Pipeline::CurrentState,
            Target::Ckd,
            names(&["RACE", "LA"]),
            "inline",
        )
        .unwrap();
        assert!(current.text_categoricals().is_empty());
    }

    #[test]
    fn test_risk_direction_is_target_specific() {
        assert_eq!(Target::Ckd.high_risk_label(), 1);
        assert_eq!(Target::Remission.high_risk_label(), 0);
    }

    #[test]
    fn test_pipeline_dir_names() {
        assert_eq!(Pipeline::from_dir_name("Baseline"), Some(Pipeline::Baseline));
        assert_eq!(Pipeline::from_dir_name("current"), Some(Pipeline::CurrentState));
        assert_eq!(Pipeline::from_dir_name("other"), None);
    }
}
