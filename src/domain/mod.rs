//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O. Schemas and tables are
//! static; records and results are built fresh per submission.

pub mod coercion;
mod diagnosis;
pub mod form;
mod patient;
mod schema;

pub use coercion::{explainer_view, predictor_view, ModelInput, ModelValue};
pub use diagnosis::{AttributionVector, ModelError, PredictionResult, RiskLevel, WaterfallStep};
pub use form::{render_form, Column, ControlKind, FormControl, FormLayout};
pub use patient::{apply_missingness, assemble, FeatureValue, PatientRecord, RawInput, RawValue};
pub use schema::{
    ChoiceOption, FeatureKind, FeatureSchema, MissingnessRule, Pipeline, PipelineTables,
    SchemaError, Target, TargetSchema, MISSING_SENTINEL,
};
