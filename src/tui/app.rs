//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Service integration (synchronous: a submission completes within one key press)

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::export::write_csv;
use crate::adapters::FsArtifacts;
use crate::application::PredictionService;
use crate::config::AppConfig;

use super::ui::{
    patient::{render_patient_form, PatientFormState},
    render_disclaimer,
    result::{render_result, ResultState},
    selector::{render_selector, SelectorState},
};

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Selector,
    PatientForm,
    Result,
}

/// Main application state
pub struct App {
    screen: Screen,
    should_quit: bool,
    config: AppConfig,
    service: PredictionService<FsArtifacts>,
    selector_state: SelectorState,
    /// Present once a target has been loaded
    patient_form_state: Option<PatientFormState>,
    result_state: Option<ResultState>,
}

impl App {
    /// Create the application from configuration.
    ///
    /// # Errors
    /// Returns error if the model directory does not exist.
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let artifacts = FsArtifacts::new(&config.model_dir, &config.asset_dir);
        let service = PredictionService::new(Arc::new(artifacts));
        Ok(Self::with_dependencies(config, service))
    }

    /// Create application with an injected service (Composition Root pattern).
    #[must_use]
    pub fn with_dependencies(config: AppConfig, service: PredictionService<FsArtifacts>) -> Self {
        let selector_state = SelectorState::new(
            config.initial_pipeline,
            config.model_dir.display().to_string(),
        );
        Self {
            screen: Screen::Selector,
            should_quit: false,
            config,
            service,
            selector_state,
            patient_form_state: None,
            result_state: None,
        }
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(f.area());

                match (self.screen, &self.patient_form_state, &self.result_state) {
                    (Screen::PatientForm, Some(form), _) => render_patient_form(f, chunks[0], form),
                    (Screen::Result, _, Some(result)) => render_result(f, chunks[0], result),
                    _ => render_selector(f, chunks[0], &self.selector_state),
                }

                render_disclaimer(f, chunks[1]);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }
        }

        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Selector => self.handle_selector_key(key),
            Screen::PatientForm => self.handle_patient_form_key(key),
            Screen::Result => self.handle_result_key(key),
        }
    }

    fn handle_selector_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('p') | KeyCode::Char('P') => self.selector_state.toggle_pipeline(),
            KeyCode::Left | KeyCode::Right => self.selector_state.next_target(),
            KeyCode::Enter => self.open_form(),
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_patient_form_key(&mut self, key: KeyCode) {
        if key == KeyCode::Enter {
            self.submit_patient_form();
            return;
        }
        let Some(form) = self.patient_form_state.as_mut() else {
            self.screen = Screen::Selector;
            return;
        };

        match key {
            KeyCode::Esc => self.screen = Screen::Selector,
            KeyCode::Up | KeyCode::BackTab => form.prev_field(),
            KeyCode::Down | KeyCode::Tab => form.next_field(),
            KeyCode::Left => form.cycle_choice(false),
            KeyCode::Right => form.cycle_choice(true),
            KeyCode::Char('s') | KeyCode::Char('S') => form.load_sample_data(),
            KeyCode::Char(c) => form.input_char(c),
            KeyCode::Backspace => form.delete_char(),
            KeyCode::Delete => form.clear_field(),
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('e') | KeyCode::Char('E') => self.export_result(),
            KeyCode::Char('n') | KeyCode::Char('N') => {
                if let Some(form) = self.patient_form_state.as_mut() {
                    form.clear_sensitive();
                }
                self.screen = Screen::PatientForm;
            }
            KeyCode::Esc => self.screen = Screen::Selector,
            _ => {}
        }
    }

    /// Load the selected target and show its form.
    fn open_form(&mut self) {
        let pipeline = self.selector_state.pipeline;
        let target = self.selector_state.target;

        match self.service.load(pipeline, target) {
            Ok(session) => {
                self.patient_form_state =
                    Some(PatientFormState::new(pipeline, target, &session.form));
                self.result_state = None;
                self.selector_state.error = None;
                self.screen = Screen::PatientForm;
            }
            Err(e) => {
                tracing::error!(pipeline = %pipeline, target = %target, "Failed to load target: {}", e);
                self.selector_state.error = Some(e.to_string());
            }
        }
    }

    fn submit_patient_form(&mut self) {
        let Some(form) = self.patient_form_state.as_mut() else {
            return;
        };

        let raw = match form.to_raw_input() {
            Ok(raw) => raw,
            Err(message) => {
                form.error_message = Some(message);
                return;
            }
        };

        match self.service.predict(form.pipeline, form.target, &raw) {
            Ok(outcome) => {
                // Clear plaintext buffers from the UI immediately.
                form.clear_sensitive();
                self.result_state = Some(ResultState::new(outcome));
                self.screen = Screen::Result;
            }
            Err(e) => {
                tracing::warn!(target = %form.target, "Submission rejected: {}", e);
                form.error_message = Some(e.to_string());
            }
        }
    }

    fn export_result(&mut self) {
        let Some(result) = self.result_state.as_mut() else {
            return;
        };
        let outcome = &result.outcome;
        result.export_status = Some(
            write_csv(&self.config.export_dir, &outcome.record, &outcome.prediction)
                .map(|path| path.display().to_string())
                .map_err(|e| e.to_string()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn app(export_dir: PathBuf) -> App {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let config = AppConfig {
            model_dir: root.join("models"),
            asset_dir: root.join("assets"),
            export_dir,
            ..AppConfig::default()
        };
        App::new(config).expect("shipped models directory")
    }

    fn press(app: &mut App, key: KeyCode) {
        app.handle_key(key, KeyModifiers::NONE);
    }

    #[test]
    fn test_missing_model_dir_is_rejected() {
        let config = AppConfig {
            model_dir: PathBuf::from("/nonexistent/slecare-models"),
            ..AppConfig::default()
        };
        let err = App::new(config).err().expect("startup should fail");
        assert!(err.to_string().contains("SLECARE_MODEL_DIR"));
    }

    #[test]
    fn test_sample_submission_reaches_result_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path().to_path_buf());

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen(), Screen::PatientForm);

        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen(), Screen::Result);

        let form = app.patient_form_state.as_ref().unwrap();
        assert!(form.fields.iter().all(|f| f.entry.is_empty()));

        press(&mut app, KeyCode::Char('e'));
        let status = app.result_state.as_ref().unwrap().export_status.clone();
        assert!(matches!(status, Some(Ok(_))));
        assert!(dir.path().join("slecare_prediction_ckd.csv").is_file());
    }

    #[test]
    fn test_baseline_form_cycles_and_submits() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path().to_path_buf());

        press(&mut app, KeyCode::Char('p'));
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen(), Screen::PatientForm);

        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen(), Screen::Result);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen(), Screen::Selector);
    }
}
