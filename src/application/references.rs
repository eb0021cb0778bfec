//! Precomputed reference plots for a target.

use std::path::PathBuf;

use serde::Serialize;

use crate::domain::{Pipeline, Target};
use crate::ports::ArtifactSource;

/// Most dependence plots shown per target.
pub const MAX_DEPENDENCE_PLOTS: usize = 4;

/// A reference plot that either exists on disk or is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ReferenceAsset {
    Present(PathBuf),
    Absent(String),
}

impl ReferenceAsset {
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferencePlot {
    pub title: String,
    pub asset: ReferenceAsset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct References {
    pub global: ReferencePlot,
    pub dependence: Vec<ReferencePlot>,
}

/// Filename slug: lowercase, runs of non-alphanumerics collapsed to `_`.
///
/// `"ANTI-DSDNA"` becomes `anti_dsdna`, `"AC KIDNEY INJURY INITIAL (AKI)"`
/// becomes `ac_kidney_injury_initial_aki`.
#[must_use]
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut gap = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if gap && !out.is_empty() {
                out.push('_');
            }
            gap = false;
            out.push(c.to_ascii_lowercase());
        } else {
            gap = true;
        }
    }
    out
}

fn resolve<A: ArtifactSource>(artifacts: &A, title: String, relative: String) -> ReferencePlot {
    let asset = match artifacts.locate_asset(&relative) {
        Some(path) => ReferenceAsset::Present(path),
        None => {
            tracing::warn!(asset = %relative, "Reference plot missing");
            ReferenceAsset::Absent(relative)
        }
    };
    ReferencePlot { title, asset }
}

/// Look up the global importance plot and the dependence plots for a target.
///
/// Missing files are reported as [`ReferenceAsset::Absent`], never as errors.
pub fn resolve_references<A: ArtifactSource>(
    artifacts: &A,
    pipeline: Pipeline,
    target: Target,
) -> References {
    let dir = pipeline.dir_name();
    let stem = target.file_stem();

    let global = resolve(
        artifacts,
        format!("Global feature importance ({target})"),
        format!("{dir}/{stem}_shap_summary.png"),
    );

    let dependence = pipeline
        .tables()
        .dependence_features(target)
        .iter()
        .take(MAX_DEPENDENCE_PLOTS)
        .map(|feature| {
            resolve(
                artifacts,
                format!("Dependence: {feature}"),
                format!("{dir}/{stem}_dependence_{}.png", slug(feature)),
            )
        })
        .collect();

    References { global, dependence }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FsArtifacts;

    #[test]
    fn test_slug() {
        assert_eq!(slug("ANTI-DSDNA"), "anti_dsdna");
        assert_eq!(slug("AC KIDNEY INJURY INITIAL (AKI)"), "ac_kidney_injury_initial_aki");
        assert_eq!(slug("ACE/ARB"), "ace_arb");
        assert_eq!(slug("GLOBAL SCLEROSIS-MISSING"), "global_sclerosis_missing");
        assert_eq!(slug("C3"), "c3");
    }

    #[test]
    fn test_missing_assets_are_absent() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = FsArtifacts::new(dir.path(), dir.path().join("assets"));

        let refs = resolve_references(&artifacts, Pipeline::CurrentState, Target::Ckd);
        assert_eq!(
            refs.global.asset,
            ReferenceAsset::Absent("current/ckd_shap_summary.png".to_string())
        );
        assert_eq!(refs.dependence.len(), MAX_DEPENDENCE_PLOTS);
        assert!(refs.dependence.iter().all(|p| !p.asset.is_present()));
    }

    #[test]
    fn test_present_assets_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let assets = dir.path().join("assets");
        std::fs::create_dir_all(assets.join("baseline")).unwrap();
        std::fs::write(assets.join("baseline/remission_shap_summary.png"), b"png").unwrap();
        std::fs::write(assets.join("baseline/remission_dependence_anti_dsdna.png"), b"png").unwrap();

        let artifacts = FsArtifacts::new(dir.path(), &assets);
        let refs = resolve_references(&artifacts, Pipeline::Baseline, Target::Remission);

        assert!(refs.global.asset.is_present());
        let present: Vec<&str> = refs
            .dependence
            .iter()
            .filter(|p| p.asset.is_present())
            .map(|p| p.title.as_str())
            .collect();
        assert_eq!(present, ["Dependence: ANTI-DSDNA"]);
    }
}
