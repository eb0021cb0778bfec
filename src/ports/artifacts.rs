//! Artifact port: Trait for reading schema, model and reference artifacts.
//!
//! This trait abstracts where the externally produced artifacts live
//! (a local directory in production, memory in tests).

use std::path::PathBuf;

use crate::domain::{ModelError, Pipeline, SchemaError, Target};
use crate::ports::RiskModel;

/// Read-only source of per-target artifacts.
pub trait ArtifactSource: Send + Sync {
    /// Concrete model type produced by this source.
    type Model: RiskModel;

    /// Load the declared, ordered feature list for a target.
    ///
    /// # Errors
    /// Returns `SchemaNotFound` if the list is absent or malformed.
    fn feature_list(&self, pipeline: Pipeline, target: Target) -> Result<Vec<String>, SchemaError>;

    /// Load the serialized classifier for a target.
    ///
    /// # Errors
    /// Returns `NotFound` or `InvalidArtifact` if the model cannot be loaded.
    fn load_model(&self, pipeline: Pipeline, target: Target) -> Result<Self::Model, ModelError>;

    /// Resolve a reference asset by relative name.
    ///
    /// # Returns
    /// `None` if the asset does not exist.
    fn locate_asset(&self, relative: &str) -> Option<PathBuf>;

    /// Human-readable description of where a target's feature list lives.
    fn describe(&self, pipeline: Pipeline, target: Target) -> String;
}
