//! Target selection screen: pipeline and prediction target.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::{key_hint, render_header};
use crate::domain::{Pipeline, Target};
use crate::tui::styles::MedicalTheme;

/// Selection state for rendering.
#[derive(Debug, Clone)]
pub struct SelectorState {
    pub pipeline: Pipeline,
    pub target: Target,
    pub model_dir: String,
    pub error: Option<String>,
}

impl SelectorState {
    #[must_use]
    pub fn new(pipeline: Pipeline, model_dir: String) -> Self {
        Self {
            pipeline,
            target: Target::Ckd,
            model_dir,
            error: None,
        }
    }

    pub fn toggle_pipeline(&mut self) {
        self.pipeline = self.pipeline.toggle();
        self.error = None;
    }

    pub fn next_target(&mut self) {
        self.target = self.target.next();
        self.error = None;
    }
}

pub fn render_selector(f: &mut Frame, area: Rect, state: &SelectorState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(5), // Pipeline
            Constraint::Length(5), // Target
            Constraint::Min(0),    // Status
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_header(
        f,
        chunks[0],
        "SLECare",
        "Lupus nephritis CKD and remission risk",
    );

    let pipelines: Vec<(String, bool)> = Pipeline::ALL
        .iter()
        .map(|p| (p.to_string(), *p == state.pipeline))
        .collect();
    render_radio(f, chunks[1], " Pipeline [P] ", &pipelines);

    let targets: Vec<(String, bool)> = Target::ALL
        .iter()
        .map(|t| (format!("Predict {t}"), *t == state.target))
        .collect();
    render_radio(f, chunks[2], " Target [←/→] ", &targets);

    render_status(f, chunks[3], state);

    let mut hints = Vec::new();
    hints.extend(key_hint("[P] ", "Pipeline "));
    hints.extend(key_hint("[←/→] ", "Target "));
    hints.extend(key_hint("[Enter] ", "Open form "));
    hints.extend(key_hint("[Q] ", "Quit"));
    let footer = Paragraph::new(Line::from(hints)).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(footer, chunks[4]);
}

fn render_radio(f: &mut Frame, area: Rect, title: &str, options: &[(String, bool)]) {
    let mut spans = vec![Span::raw(" ")];
    for (label, chosen) in options {
        let (marker, style) = if *chosen {
            ("(•) ", MedicalTheme::selected())
        } else {
            ("( ) ", MedicalTheme::text_secondary())
        };
        spans.push(Span::styled(format!("{marker}{label}"), style));
        spans.push(Span::raw("   "));
    }

    let block = Block::default()
        .title(Span::styled(title.to_string(), MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    f.render_widget(
        Paragraph::new(vec![Line::from(""), Line::from(spans)]).block(block),
        area,
    );
}

fn render_status(f: &mut Frame, area: Rect, state: &SelectorState) {
    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(" Model directory: ", MedicalTheme::text_secondary()),
            Span::styled(state.model_dir.clone(), MedicalTheme::text()),
        ]),
        Line::from(vec![
            Span::styled(" Artifacts: ", MedicalTheme::text_secondary()),
            Span::styled(
                format!("{}/", state.pipeline.dir_name()),
                MedicalTheme::text(),
            ),
        ]),
        Line::from(""),
    ];

    match &state.error {
        Some(message) => {
            lines.push(Line::from(Span::styled(
                " ! Cannot open this target",
                MedicalTheme::danger(),
            )));
            lines.push(Line::from(Span::styled(
                format!("   {message}"),
                MedicalTheme::text(),
            )));
        }
        None => lines.push(Line::from(Span::styled(
            " Press Enter to load the schema and model for this target.",
            MedicalTheme::text_muted(),
        ))),
    }

    let block = Block::default()
        .title(Span::styled(" Status ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(if state.error.is_some() {
            MedicalTheme::danger()
        } else {
            MedicalTheme::border()
        });

    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}
