use crate::wire::{ChosenOption, Prompt};

/// What the operator answered for one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Toggle(bool),
    Pick(Option<String>),
    /// Selected choices, in choice order.
    Picks(Vec<String>),
}

/// Price adjustment for one answered prompt.
///
/// - boolean: `delta` when on, else 0
/// - single: `delta` once when something is picked
/// - multi: `delta` per selected choice
pub fn option_delta(prompt: &Prompt, answer: &Answer) -> i64 {
    match answer {
        Answer::Toggle(on) => if *on { prompt.delta } else { 0 },
        Answer::Pick(Some(_)) => prompt.delta,
        Answer::Pick(None) => 0,
        Answer::Picks(picks) => prompt.delta.saturating_mul(picks.len() as i64),
    }
}

pub fn chosen_option(prompt: &Prompt, answer: &Answer) -> ChosenOption {
    let value = match answer {
        Answer::Toggle(true) => "sì".to_string(),
        Answer::Toggle(false) => "no".to_string(),
        Answer::Pick(v) => v.clone().unwrap_or_default(),
        Answer::Picks(picks) => picks.join("; "),
    };
    ChosenOption { name: prompt.name.clone(), value, delta: option_delta(prompt, answer) }
}

/// Base price plus every option delta.
pub fn unit_price(base_cents: i64, options: &[ChosenOption]) -> i64 {
    options.iter().fold(base_cents, |acc, o| acc.saturating_add(o.delta))
}
