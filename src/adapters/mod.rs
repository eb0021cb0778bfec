//! Adapters layer: Concrete implementations of ports.
//!
//! - `additive`: JSON-exported additive classifier with exact attributions
//! - `filesystem`: feature lists, models and reference plots from local directories
//! - `export`: CSV export of a prediction
//! - `sanitize`: identifier redaction for logs

pub mod additive;
pub mod export;
pub mod filesystem;
pub mod sanitize;

pub use additive::AdditiveModel;
pub use export::ExportError;
pub use filesystem::FsArtifacts;
