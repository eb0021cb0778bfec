//! TUI module: Terminal User Interface using Ratatui.
//!
//! Three screens stand in for the clinician-facing page:
//! - Target selection (pipeline and CKD / remission)
//! - Patient data input, one control per declared feature
//! - Result with verdict, attributions and reference plots

mod app;
mod styles;
mod ui;

pub use app::{App, Screen};
pub use styles::MedicalTheme;
