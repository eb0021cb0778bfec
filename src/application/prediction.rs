//! Prediction service: assemble, coerce, predict, explain.
//!
//! The service owns one [`TargetSession`] per loaded target. A submission
//! runs the whole pipeline synchronously:
//! 1. Assemble the collected values into the declared record
//! 2. Project it for the predictor (categorical subset as text) and predict
//! 3. Project it for the explainer (all numeric) and attribute
//! 4. Resolve the reference plots

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::application::references::{resolve_references, References};
use crate::application::session::TargetSession;
use crate::domain::{
    assemble, explainer_view, predictor_view, AttributionVector, PatientRecord, Pipeline,
    PredictionResult, RawInput, Target,
};
use crate::ports::{ArtifactSource, RiskModel};
use crate::{Result, SlecareError};

/// Everything the result screen shows for one submission.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub record: PatientRecord,
    pub prediction: PredictionResult,
    pub attribution: AttributionVector,
    pub references: References,
    pub created_at: DateTime<Local>,
}

pub struct PredictionService<A: ArtifactSource> {
    artifacts: Arc<A>,
    sessions: HashMap<(Pipeline, Target), TargetSession<A::Model>>,
}

impl<A: ArtifactSource> PredictionService<A> {
    pub fn new(artifacts: Arc<A>) -> Self {
        Self {
            artifacts,
            sessions: HashMap::new(),
        }
    }

    /// Load a target's session, or return the cached one.
    ///
    /// # Errors
    /// Returns the loading error; nothing is cached on failure.
    pub fn load(&mut self, pipeline: Pipeline, target: Target) -> Result<&TargetSession<A::Model>> {
        let key = (pipeline, target);
        if !self.sessions.contains_key(&key) {
            let session = TargetSession::load(self.artifacts.as_ref(), pipeline, target)?;
            self.sessions.insert(key, session);
        } else {
            tracing::debug!(pipeline = %pipeline, target = %target, "Reusing target session");
        }
        self.sessions
            .get(&key)
            .ok_or_else(|| SlecareError::ModelNotLoaded(format!("{pipeline} / {target}")))
    }

    #[must_use]
    pub fn session(&self, pipeline: Pipeline, target: Target) -> Option<&TargetSession<A::Model>> {
        self.sessions.get(&(pipeline, target))
    }

    /// Run one submission against a loaded target.
    ///
    /// # Errors
    /// - `ModelNotLoaded` if [`PredictionService::load`] has not succeeded for the target
    /// - `Schema` for missing declared features or illegal values
    /// - `Model` if the model rejects either projection
    pub fn predict(&self, pipeline: Pipeline, target: Target, raw: &RawInput) -> Result<Outcome> {
        let session = self
            .session(pipeline, target)
            .ok_or_else(|| SlecareError::ModelNotLoaded(format!("{pipeline} / {target}")))?;

        tracing::debug!(target = %target, collected = raw.len(), "Step 1: Assembling record");
        let record = assemble(&session.schema, raw)?;
        tracing::debug!(features = record.len(), "Assembled patient record");

        let subset = session.schema.text_categoricals();

        tracing::debug!(text_columns = subset.len(), "Step 2: Predicting");
        let label = session.model.predict(&predictor_view(&record, &subset))?;
        let prediction = PredictionResult::interpret(target, label);

        tracing::debug!("Step 3: Explaining");
        let attribution = session.model.explain(&explainer_view(&record, &subset))?;

        let references = resolve_references(self.artifacts.as_ref(), pipeline, target);

        tracing::info!(
            pipeline = %pipeline,
            target = %target,
            risk = %prediction.risk,
            "Prediction complete"
        );

        Ok(Outcome {
            record,
            prediction,
            attribution,
            references,
            created_at: Local::now(),
        })
    }
}
