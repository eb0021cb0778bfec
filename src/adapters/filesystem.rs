//! Filesystem adapter: Implementation of ArtifactSource.
//!
//! Artifacts live under a model directory, one subdirectory per pipeline:
//!
//! ```text
//! models/
//!   current/   ckd_rfe_features.json  remission_rfe_features.json  *_model.json
//!   baseline/  ckd_features.json      remission_features.json      *_model.json
//! ```
//!
//! Reference plots live under a separate asset directory with the same
//! per-pipeline split.

use std::fs;
use std::path::PathBuf;

use crate::adapters::additive::AdditiveModel;
use crate::domain::{ModelError, Pipeline, SchemaError, Target};
use crate::ports::ArtifactSource;

/// Reads artifacts from local directories.
#[derive(Debug, Clone)]
pub struct FsArtifacts {
    model_dir: PathBuf,
    asset_dir: PathBuf,
}

impl FsArtifacts {
    #[must_use]
    pub fn new(model_dir: impl Into<PathBuf>, asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            asset_dir: asset_dir.into(),
        }
    }

    /// Path of the declared feature list for a target.
    #[must_use]
    pub fn feature_list_path(&self, pipeline: Pipeline, target: Target) -> PathBuf {
        let file = match pipeline {
            Pipeline::CurrentState => format!("{}_rfe_features.json", target.file_stem()),
            Pipeline::Baseline => format!("{}_features.json", target.file_stem()),
        };
        self.model_dir.join(pipeline.dir_name()).join(file)
    }

    /// Path of the serialized model for a target.
    #[must_use]
    pub fn model_path(&self, pipeline: Pipeline, target: Target) -> PathBuf {
        self.model_dir
            .join(pipeline.dir_name())
            .join(format!("{}_model.json", target.file_stem()))
    }
}

impl ArtifactSource for FsArtifacts {
    type Model = AdditiveModel;

    fn feature_list(&self, pipeline: Pipeline, target: Target) -> Result<Vec<String>, SchemaError> {
        let path = self.feature_list_path(pipeline, target);
        let not_found = |reason: String| SchemaError::SchemaNotFound {
            pipeline,
            target,
            path: path.display().to_string(),
            reason,
        };

        let content = fs::read(&path).map_err(|e| not_found(e.to_string()))?;
        let names: Vec<String> = serde_json::from_slice(&content)
            .map_err(|e| not_found(format!("expected a JSON array of feature names: {e}")))?;

        tracing::debug!(
            path = %path.display(),
            features = names.len(),
            "Read feature list"
        );
        Ok(names)
    }

    fn load_model(&self, pipeline: Pipeline, target: Target) -> Result<AdditiveModel, ModelError> {
        AdditiveModel::load(&self.model_path(pipeline, target))
    }

    fn locate_asset(&self, relative: &str) -> Option<PathBuf> {
        let path = self.asset_dir.join(relative);
        path.is_file().then_some(path)
    }

    fn describe(&self, pipeline: Pipeline, target: Target) -> String {
        self.feature_list_path(pipeline, target).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn scratch() -> (tempfile::TempDir, FsArtifacts) {
        let dir = tempfile::tempdir().expect("tempdir");
        let artifacts = FsArtifacts::new(dir.path().join("models"), dir.path().join("assets"));
        fs::create_dir_all(dir.path().join("models/current")).unwrap();
        fs::create_dir_all(dir.path().join("assets/current")).unwrap();
        (dir, artifacts)
    }

    #[test]
    fn test_reads_feature_list() {
        let (dir, artifacts) = scratch();
        fs::write(
            dir.path().join("models/current/ckd_rfe_features.json"),
            r#"["EGFR", "RACE"]"#,
        )
        .unwrap();

        let names = artifacts
            .feature_list(Pipeline::CurrentState, Target::Ckd)
            .expect("readable");
        assert_eq!(names, ["EGFR", "RACE"]);
    }

    #[test]
    fn test_missing_list_is_schema_not_found() {
        let (_dir, artifacts) = scratch();
        let err = artifacts
            .feature_list(Pipeline::CurrentState, Target::Remission)
            .unwrap_err();
        assert!(matches!(err, SchemaError::SchemaNotFound { .. }));
    }

    #[test]
    fn test_malformed_list_is_schema_not_found() {
        let (dir, artifacts) = scratch();
        fs::write(
            dir.path().join("models/current/ckd_rfe_features.json"),
            r#"{"features": ["EGFR"]}"#,
        )
        .unwrap();

        let err = artifacts
            .feature_list(Pipeline::CurrentState, Target::Ckd)
            .unwrap_err();
        assert!(err.to_string().contains("ckd_rfe_features.json"));
    }

    #[test]
    fn test_locate_asset() {
        let (dir, artifacts) = scratch();
        fs::write(dir.path().join("assets/current/ckd_shap_summary.png"), b"png").unwrap();

        assert!(artifacts.locate_asset("current/ckd_shap_summary.png").is_some());
        assert!(artifacts.locate_asset("current/remission_shap_summary.png").is_none());
    }

    #[test]
    fn test_artifact_paths() {
        let artifacts = FsArtifacts::new("models", "assets");
        assert_eq!(
            artifacts.feature_list_path(Pipeline::Baseline, Target::Remission),
            Path::new("models/baseline/remission_features.json")
        );
        assert_eq!(
            artifacts.model_path(Pipeline::CurrentState, Target::Ckd),
            Path::new("models/current/ckd_model.json")
        );
    }
}
