//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports: loading a target's
//! artifacts once, and turning a form submission into a prediction with its
//! explanation and reference plots.

mod prediction;
mod references;
mod session;

pub use prediction::{Outcome, PredictionService};
pub use references::{resolve_references, slug, ReferenceAsset, ReferencePlot, References};
pub use session::TargetSession;
