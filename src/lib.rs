//! # SLECare
//!
//! Schema-driven risk prediction front-end for lupus nephritis.
//!
//! This crate provides:
//! - Declarative feature schemas for two pipelines (current-state, baseline)
//! - Form descriptors, record assembly and missingness conditioning
//! - Typed projections of a patient record for an external model and explainer
//! - Terminal UI for local-only use
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Schemas, form controls, patient records, predictions
//! - `ports`: Trait definitions for the model and its artifacts
//! - `adapters`: Filesystem artifacts, additive model export, CSV export, log sanitizing
//! - `application`: Per-target sessions and the prediction use case
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use config::{AppConfig, ConfigError};
pub use domain::{Pipeline, PatientRecord, PredictionResult, RiskLevel, Target};

/// Result type for SLECare operations
pub type Result<T> = std::result::Result<T, SlecareError>;

/// Main error type for SLECare
#[derive(Debug, thiserror::Error)]
pub enum SlecareError {
    #[error(transparent)]
    Schema(#[from] domain::SchemaError),

    #[error("Model error: {0}")]
    Model(#[from] domain::ModelError),

    #[error("Export failed: {0}")]
    Export(#[from] adapters::ExportError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("Model not loaded: {0}")]
    ModelNotLoaded(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
