//! Patient data input form, driven by the target's form layout.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use super::{key_hint, render_header};
use crate::domain::{
    Column, ControlKind, FormControl, FormLayout, Pipeline, RawInput, RawValue, Target,
    MISSING_SENTINEL,
};
use crate::tui::styles::MedicalTheme;

/// Typical values used by `[S]`, keyed by feature name.
const SAMPLE_MEASURES: &[(&str, &str)] = &[
    ("AGE", "32"),
    ("AGE AT LN", "29"),
    ("DURATION OF SLE", "4.5"),
    ("EGFR", "72.40"),
    ("BASELINE EGFR", "68.10"),
    ("UPCR", "1.85"),
    ("BASELINE UPCR", "3.20"),
    ("SERUM CREATININE", "102"),
    ("SERUM ALBUMIN", "28"),
    ("HAEMOGLOBIN", "10.4"),
    ("C3", "0.62"),
    ("C4", "0.09"),
    ("ANTI-DSDNA", "240"),
    ("ACTIVITY INDEX", "8"),
    ("CHRONICITY INDEX", "2"),
    ("GLOBAL SCLEROSIS", "12.5"),
    ("CRESCENT", "10"),
];

/// Entry state of one control.
#[derive(Debug, Clone)]
pub struct FormField {
    pub control: FormControl,
    /// Typed text for numeric entries
    pub entry: String,
    /// Selected option index for choice controls
    pub choice: usize,
}

impl FormField {
    fn new(control: FormControl) -> Self {
        Self {
            control,
            entry: String::new(),
            choice: 0,
        }
    }

    /// Code currently selected, `None` for numeric entries.
    #[must_use]
    pub fn selected_code(&self) -> Option<i64> {
        match &self.control.kind {
            ControlKind::Choice { options } => options.get(self.choice).map(|o| o.code),
            ControlKind::NumericEntry { .. } => None,
        }
    }

    /// Text shown in the control.
    #[must_use]
    pub fn display_value(&self) -> String {
        match (&self.control.kind, self.selected_code()) {
            (ControlKind::Choice { .. }, Some(code)) => self.control.display_code(code),
            (ControlKind::NumericEntry { decimals, .. }, _) if self.entry.is_empty() => {
                format!("{:.*}", *decimals, 0.0)
            }
            _ => self.entry.clone(),
        }
    }
}

/// Patient form state
pub struct PatientFormState {
    pub pipeline: Pipeline,
    pub target: Target,
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl PatientFormState {
    #[must_use]
    pub fn new(pipeline: Pipeline, target: Target, layout: &FormLayout) -> Self {
        Self {
            pipeline,
            target,
            fields: layout.controls.iter().cloned().map(FormField::new).collect(),
            selected_field: 0,
            error_message: None,
        }
    }

    /// Whether a field is switched off because its missingness flag is set.
    #[must_use]
    pub fn is_disabled(&self, index: usize) -> bool {
        let Some(flag) = self.fields.get(index).and_then(|f| f.control.gate) else {
            return false;
        };
        self.fields
            .iter()
            .find(|f| f.control.feature == flag)
            .and_then(FormField::selected_code)
            .is_some_and(|code| code == MISSING_SENTINEL)
    }

    fn step(&mut self, forward: bool) {
        let len = self.fields.len();
        if len == 0 {
            return;
        }
        for _ in 0..len {
            self.selected_field = if forward {
                (self.selected_field + 1) % len
            } else {
                (self.selected_field + len - 1) % len
            };
            if !self.is_disabled(self.selected_field) {
                break;
            }
        }
    }

    /// Move to the next enabled field
    pub fn next_field(&mut self) {
        self.step(true);
    }

    /// Move to the previous enabled field
    pub fn prev_field(&mut self) {
        self.step(false);
    }

    /// Cycle the options of the current choice control
    pub fn cycle_choice(&mut self, forward: bool) {
        let Some(field) = self.fields.get_mut(self.selected_field) else {
            return;
        };
        if let ControlKind::Choice { options } = &field.control.kind {
            let len = options.len().max(1);
            field.choice = if forward {
                (field.choice + 1) % len
            } else {
                (field.choice + len - 1) % len
            };
            self.error_message = None;
        }
    }

    /// Add a character to the current numeric entry
    pub fn input_char(&mut self, c: char) {
        if self.is_disabled(self.selected_field) {
            return;
        }
        let Some(field) = self.fields.get_mut(self.selected_field) else {
            return;
        };
        if matches!(field.control.kind, ControlKind::NumericEntry { .. })
            && (c.is_ascii_digit() || c == '.' || (c == '-' && field.entry.is_empty()))
        {
            field.entry.push(c);
            self.error_message = None;
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        if let Some(field) = self.fields.get_mut(self.selected_field) {
            field.entry.pop();
        }
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        if let Some(field) = self.fields.get_mut(self.selected_field) {
            field.entry.zeroize();
            field.choice = 0;
        }
    }

    /// Wipe all typed buffers and reset selections.
    pub fn clear_sensitive(&mut self) {
        for field in &mut self.fields {
            field.entry.zeroize();
            field.choice = 0;
        }
        self.error_message = None;
        self.selected_field = 0;
    }

    /// Collect the raw form values.
    ///
    /// Empty numeric entries count as `0.0`. Disabled controls are not collected.
    ///
    /// # Errors
    /// Returns a message naming the first entry that is not a number.
    pub fn to_raw_input(&self) -> Result<RawInput, String> {
        let mut raw = RawInput::with_capacity(self.fields.len());

        for (index, field) in self.fields.iter().enumerate() {
            if self.is_disabled(index) {
                continue;
            }
            let value = match field.selected_code() {
                Some(code) => RawValue::Choice(code),
                None if field.entry.is_empty() => RawValue::Number(0.0),
                None => {
                    let number: f64 = field
                        .entry
                        .parse()
                        .map_err(|_| format!("{}: Invalid number", field.control.feature))?;
                    RawValue::Number(number)
                }
            };
            raw.insert(field.control.feature.clone(), value);
        }

        Ok(raw)
    }

    /// Load sample data for a typical nephritis patient
    pub fn load_sample_data(&mut self) {
        for field in &mut self.fields {
            match field.control.kind {
                ControlKind::NumericEntry { .. } => {
                    let sample = SAMPLE_MEASURES
                        .iter()
                        .find(|(name, _)| *name == field.control.feature)
                        .map_or("1.00", |(_, value)| *value);
                    field.entry.zeroize();
                    field.entry.push_str(sample);
                }
                ControlKind::Choice { .. } => field.choice = 0,
            }
        }
        self.error_message = None;
    }
}

/// Render the patient data input form
pub fn render_patient_form(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_header(
        f,
        chunks[0],
        "Patient Data Entry",
        &format!("{} │ Predict {}", state.pipeline, state.target),
    );
    render_form_fields(f, chunks[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    for (side, rect) in [(Column::Left, columns[0]), (Column::Right, columns[1])] {
        let indices: Vec<usize> = state
            .fields
            .iter()
            .enumerate()
            .filter(|(_, field)| field.control.column == side)
            .map(|(i, _)| i)
            .collect();
        render_field_column(f, rect, state, &indices);
    }
}

fn render_field_column(f: &mut Frame, area: Rect, state: &PatientFormState, indices: &[usize]) {
    let field_height: u16 = 3;
    let visible = usize::from((area.height / field_height).max(1));

    // Keep the selected field in view when the column overflows.
    let position = indices
        .iter()
        .position(|&i| i == state.selected_field)
        .unwrap_or(0);
    let first = position.saturating_sub(visible.saturating_sub(1));
    let shown = &indices[first.min(indices.len())..];
    let shown = &shown[..shown.len().min(visible)];

    let constraints: Vec<Constraint> = shown
        .iter()
        .map(|_| Constraint::Length(field_height))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (slot, &index) in shown.iter().enumerate() {
        let field = &state.fields[index];
        let is_selected = index == state.selected_field;
        let disabled = state.is_disabled(index);

        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else if disabled {
            (MedicalTheme::border(), MedicalTheme::disabled())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.control.feature), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let mut spans = vec![Span::raw(" ")];
        if disabled {
            spans.push(Span::styled("missing (default applied)", MedicalTheme::disabled()));
        } else {
            match &field.control.kind {
                ControlKind::Choice { .. } => {
                    spans.push(Span::styled("◂ ", MedicalTheme::text_muted()));
                    spans.push(Span::styled(field.display_value(), MedicalTheme::text()));
                    spans.push(Span::styled(" ▸", MedicalTheme::text_muted()));
                }
                ControlKind::NumericEntry { .. } => {
                    let style = if field.entry.is_empty() {
                        MedicalTheme::text_muted()
                    } else {
                        MedicalTheme::text()
                    };
                    spans.push(Span::styled(field.display_value(), style));
                    if is_selected {
                        spans.push(Span::styled("▌", MedicalTheme::cursor()));
                    }
                }
            }
        }

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[slot]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ])
    } else {
        let mut hints = Vec::new();
        hints.extend(key_hint("[↑↓] ", "Navigate "));
        hints.extend(key_hint("[←→] ", "Option "));
        hints.extend(key_hint("[Enter] ", "Predict "));
        hints.extend(key_hint("[S] ", "Sample Data "));
        hints.extend(key_hint("[Esc] ", "Back"));
        Line::from(hints)
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
