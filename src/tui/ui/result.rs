//! Result view: verdict, attribution charts and reference plots.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::{key_hint, render_header};
use crate::application::{Outcome, ReferenceAsset, ReferencePlot};
use crate::domain::RiskLevel;
use crate::tui::styles::MedicalTheme;

/// Width of the longest attribution bar, in cells.
const BAR_WIDTH: usize = 24;

/// Result screen state
#[derive(Debug, Clone)]
pub struct ResultState {
    pub outcome: Outcome,
    /// Outcome of the last export: written path or error text
    pub export_status: Option<Result<String, String>>,
}

impl ResultState {
    #[must_use]
    pub fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            export_status: None,
        }
    }
}

/// Horizontal bar for `value` scaled so that `max_abs` fills `width` cells.
#[must_use]
pub fn signed_bar(value: f64, max_abs: f64, width: usize) -> String {
    if max_abs <= 0.0 || value == 0.0 || !value.is_finite() {
        return String::new();
    }
    let cells = ((value.abs() / max_abs) * width as f64).round() as usize;
    let glyph = if value >= 0.0 { '▶' } else { '◀' };
    std::iter::repeat(glyph).take(cells.clamp(1, width)).collect()
}

/// Render the result screen
pub fn render_result(f: &mut Frame, area: Rect, state: &ResultState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(5), // Verdict
            Constraint::Min(8),    // Charts
            Constraint::Length(8), // References
            Constraint::Length(3), // Footer
        ])
        .split(area);

    let outcome = &state.outcome;
    render_header(
        f,
        chunks[0],
        "Prediction Result",
        &format!(
            "{} │ Predict {} │ {}",
            outcome.record.pipeline,
            outcome.prediction.target,
            outcome.created_at.format("%Y-%m-%d %H:%M")
        ),
    );
    render_verdict(f, chunks[1], outcome);

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[2]);
    render_waterfall(f, charts[0], outcome);
    render_ranking(f, charts[1], outcome);

    render_references(f, chunks[3], outcome);
    render_result_footer(f, chunks[4], state);
}

fn render_verdict(f: &mut Frame, area: Rect, outcome: &Outcome) {
    let risk = outcome.prediction.risk;
    let risk_style = MedicalTheme::risk_level(risk);
    let icon = match risk {
        RiskLevel::Low => "OK",
        RiskLevel::High => "!",
    };

    let verdict = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("{icon} {risk} RISK"),
            risk_style.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(risk.description(), risk_style)),
        Line::from(Span::styled(
            format!("Model label: {}", outcome.prediction.label),
            MedicalTheme::text_muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(risk_style),
    );

    f.render_widget(verdict, area);
}

fn render_waterfall(f: &mut Frame, area: Rect, outcome: &Outcome) {
    let attribution = &outcome.attribution;
    let steps = attribution.waterfall();
    let max_abs = steps
        .iter()
        .map(|s| s.contribution.abs())
        .fold(0.0_f64, f64::max);

    let mut lines = vec![Line::from(Span::styled(
        format!(" E[f(x)] = {:+.3}", attribution.expected_value),
        MedicalTheme::text_secondary(),
    ))];
    for step in &steps {
        lines.push(Line::from(vec![
            Span::styled(format!(" {:<28.28}", step.feature), MedicalTheme::text()),
            Span::styled(
                format!("{:+8.3} ", step.contribution),
                MedicalTheme::contribution(step.contribution),
            ),
            Span::styled(
                signed_bar(step.contribution, max_abs, BAR_WIDTH),
                MedicalTheme::contribution(step.contribution),
            ),
        ]));
    }
    lines.push(Line::from(Span::styled(
        format!(" f(x) = {:+.3}", attribution.output()),
        MedicalTheme::focused(),
    )));

    let block = Block::default()
        .title(Span::styled(" Explanation (waterfall) ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_ranking(f: &mut Frame, area: Rect, outcome: &Outcome) {
    let ranked = outcome.attribution.ranked();
    let max_abs = ranked.first().map_or(0.0, |(_, v)| v.abs());

    let lines: Vec<Line> = ranked
        .iter()
        .map(|(feature, value)| {
            Line::from(vec![
                Span::styled(format!(" {:<22.22}", feature), MedicalTheme::text()),
                Span::styled(
                    "█".repeat(signed_bar(*value, max_abs, BAR_WIDTH / 2).chars().count()),
                    MedicalTheme::primary_bar(),
                ),
                Span::styled(format!(" {:.3}", value.abs()), MedicalTheme::text_muted()),
            ])
        })
        .collect();

    let block = Block::default()
        .title(Span::styled(" Feature impact |contribution| ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn reference_line(plot: &ReferencePlot) -> Line<'static> {
    match &plot.asset {
        ReferenceAsset::Present(path) => Line::from(vec![
            Span::styled(format!(" {}: ", plot.title), MedicalTheme::text_secondary()),
            Span::styled(path.display().to_string(), MedicalTheme::text()),
        ]),
        ReferenceAsset::Absent(name) => Line::from(vec![
            Span::styled(format!(" {}: ", plot.title), MedicalTheme::text_secondary()),
            Span::styled(format!("absent ({name})"), MedicalTheme::warning()),
        ]),
    }
}

fn render_references(f: &mut Frame, area: Rect, outcome: &Outcome) {
    let refs = &outcome.references;
    let lines: Vec<Line> = std::iter::once(&refs.global)
        .chain(refs.dependence.iter())
        .map(reference_line)
        .collect();

    let block = Block::default()
        .title(Span::styled(" Reference plots ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn render_result_footer(f: &mut Frame, area: Rect, state: &ResultState) {
    let content = match &state.export_status {
        Some(Ok(path)) => Line::from(vec![
            Span::styled("Exported: ", MedicalTheme::success()),
            Span::styled(path.clone(), MedicalTheme::text()),
        ]),
        Some(Err(message)) => Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(message.clone(), MedicalTheme::danger()),
        ]),
        None => {
            let mut hints = Vec::new();
            hints.extend(key_hint("[E] ", "Export CSV "));
            hints.extend(key_hint("[N] ", "New Patient "));
            hints.extend(key_hint("[Esc] ", "Change Target"));
            Line::from(hints)
        }
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
