//! Declarative form controls derived from a feature schema.

use serde::Serialize;

use super::schema::{ChoiceOption, FeatureKind, TargetSchema};

/// Display column of a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Column {
    Left,
    Right,
}

impl Column {
    /// Even declared index goes left, odd goes right.
    #[must_use]
    pub fn for_index(index: usize) -> Self {
        if index % 2 == 0 {
            Self::Left
        } else {
            Self::Right
        }
    }
}

/// Kind of input control.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ControlKind {
    /// Free numeric entry
    NumericEntry { step: f64, decimals: usize },
    /// Single choice from enumerated codes
    Choice { options: &'static [ChoiceOption] },
}

/// One input control, in declared order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormControl {
    pub feature: String,
    pub kind: ControlKind,
    pub column: Column,
    pub order_index: usize,
    /// Missingness flag that disables this control while set
    pub gate: Option<&'static str>,
}

impl FormControl {
    /// Display text for an underlying code.
    ///
    /// Falls back to the code itself for unlabelled or unknown codes.
    #[must_use]
    pub fn display_code(&self, code: i64) -> String {
        match &self.kind {
            ControlKind::Choice { options } => options
                .iter()
                .find(|o| o.code == code)
                .map_or_else(|| code.to_string(), ChoiceOption::display),
            ControlKind::NumericEntry { .. } => code.to_string(),
        }
    }
}

/// The full form for one schema.
#[derive(Debug, Clone, Serialize)]
pub struct FormLayout {
    pub controls: Vec<FormControl>,
}

impl FormLayout {
    pub fn column(&self, column: Column) -> impl Iterator<Item = &FormControl> {
        self.controls.iter().filter(move |c| c.column == column)
    }

    #[must_use]
    pub fn get(&self, feature: &str) -> Option<&FormControl> {
        self.controls.iter().find(|c| c.feature == feature)
    }
}

/// Build one control per declared feature.
#[must_use]
pub fn render_form(schema: &TargetSchema) -> FormLayout {
    let tables = schema.pipeline.tables();

    let controls = schema
        .features
        .iter()
        .map(|feature| {
            let kind = match feature.kind.options() {
                Some(options) => ControlKind::Choice { options },
                None => ControlKind::NumericEntry {
                    step: 0.01,
                    decimals: 2,
                },
            };
            let gate = match feature.kind {
                FeatureKind::Numeric => tables.rule_for_dependent(&feature.name).map(|r| r.flag),
                _ => None,
            };

            FormControl {
                feature: feature.name.clone(),
                kind,
                column: Column::for_index(feature.order_index),
                order_index: feature.order_index,
                gate,
            }
        })
        .collect();

    FormLayout { controls }
}
