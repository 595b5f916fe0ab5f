//! Render tree for the customization window.
//!
//! `render` is a pure mapping from prompts to controls; the modal session
//! mutates the controls in place as the operator answers, and `answer`
//! reads them back for pricing.

use serde::Serialize;

use crate::pricing::Answer;
use crate::wire::{Prompt, PromptKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormView {
    pub title: String,
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView {
    pub name: String,
    pub required: bool,
    pub delta: i64,
    pub control: Control,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceBox {
    pub value: String,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Control {
    Boolean { checked: bool },
    Single { choices: Vec<String>, selected: Option<usize> },
    Multi { choices: Vec<ChoiceBox> },
}

pub fn render(title: &str, prompts: &[Prompt]) -> FormView {
    FormView {
        title: title.to_string(),
        fields: prompts.iter().map(field).collect(),
    }
}

fn field(p: &Prompt) -> FieldView {
    let control = match p.kind() {
        // Pre-checked when required. Kept as the historical default; required
        // does not stop the operator from unchecking it.
        PromptKind::Boolean => Control::Boolean { checked: p.required },
        // No blank entry is injected: the first choice is the default.
        PromptKind::Single => Control::Single {
            choices: p.choices.clone(),
            selected: if p.choices.is_empty() { None } else { Some(0) },
        },
        PromptKind::Multi => Control::Multi {
            choices: p
                .choices
                .iter()
                .map(|c| ChoiceBox { value: c.clone(), checked: false })
                .collect(),
        },
    };
    FieldView { name: p.name.clone(), required: p.required, delta: p.delta, control }
}

impl Control {
    pub fn answer(&self) -> Answer {
        match self {
            Control::Boolean { checked } => Answer::Toggle(*checked),
            Control::Single { choices, selected } => {
                Answer::Pick(selected.and_then(|i| choices.get(i)).cloned())
            }
            Control::Multi { choices } => Answer::Picks(
                choices.iter().filter(|c| c.checked).map(|c| c.value.clone()).collect(),
            ),
        }
    }

    /// False when a required answer is still missing. Booleans never block.
    pub fn satisfies(&self, required: bool) -> bool {
        if !required {
            return true;
        }
        match self.answer() {
            Answer::Toggle(_) => true,
            Answer::Pick(v) => v.is_some(),
            Answer::Picks(v) => !v.is_empty(),
        }
    }
}
