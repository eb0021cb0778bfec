//! Per-target context: schema, form layout and model, loaded together once.

use std::collections::BTreeSet;

use crate::domain::{render_form, FormLayout, ModelError, Pipeline, Target, TargetSchema};
use crate::ports::{ArtifactSource, RiskModel};
use crate::Result;

/// Read-only artifacts for one pipeline and target.
pub struct TargetSession<M> {
    pub schema: TargetSchema,
    pub form: FormLayout,
    pub model: M,
}

impl<M: RiskModel> TargetSession<M> {
    /// Load the feature list and model for a target and check they agree.
    ///
    /// # Errors
    /// - `SchemaNotFound` if the feature list is missing or malformed
    /// - `Model` if the model cannot be loaded, its columns differ from the list,
    ///   or it expects text for a different set of categorical columns
    pub fn load<A>(artifacts: &A, pipeline: Pipeline, target: Target) -> Result<Self>
    where
        A: ArtifactSource<Model = M>,
    {
        let names = artifacts.feature_list(pipeline, target)?;
        let schema =
            TargetSchema::from_feature_list(pipeline, target, names, &artifacts.describe(pipeline, target))?;
        let model = artifacts.load_model(pipeline, target)?;

        let declared: Vec<String> = schema.names().map(str::to_string).collect();
        if model.columns() != declared.as_slice() {
            return Err(ModelError::ColumnMismatch {
                expected: model.columns().join(", "),
                found: declared.join(", "),
            }
            .into());
        }

        let wanted: BTreeSet<&str> = schema.text_categoricals().into_iter().collect();
        let offered: BTreeSet<&str> = model.categorical_columns().into_iter().collect();
        if wanted != offered {
            return Err(ModelError::CategoricalMismatch {
                expected: wanted.into_iter().collect::<Vec<_>>().join(", "),
                found: offered.into_iter().collect::<Vec<_>>().join(", "),
            }
            .into());
        }

        let form = render_form(&schema);
        tracing::info!(
            pipeline = %pipeline,
            target = %target,
            features = schema.len(),
            "Loaded target session"
        );

        Ok(Self {
            schema,
            form,
            model,
        })
    }
}

impl<M> std::fmt::Debug for TargetSession<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetSession")
            .field("pipeline", &self.schema.pipeline)
            .field("target", &self.schema.target)
            .field("features", &self.schema.len())
            .finish_non_exhaustive()
    }
}
