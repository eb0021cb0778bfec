//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and externally produced artifacts (feature lists,
//! the trained classifier, reference plots).

mod artifacts;
mod model;

pub use artifacts::ArtifactSource;
pub use model::{ensure_columns, RiskModel};
