use async_trait::async_trait;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

use crate::cart::Cart;
use crate::catalog::{DynSource, PromptSource};
use crate::modal::{ModalSession, Surface};
use crate::view::{Control, FieldView, FormView};
use crate::wire::{Product, Prompt};

/// Drives customization windows from stdin on a blocking thread.
pub struct TerminalSurface;

impl Surface for TerminalSurface {
    fn show(&self, session: ModalSession) {
        tokio::task::spawn_blocking(move || drive(session));
    }
}

fn drive(mut session: ModalSession) {
    while session.is_open() {
        show_form(session.view());
        if let Some(notice) = session.notice() {
            println!("{}", notice.red().bold());
        }
        let Some(input) = read_line("field number to edit, [c]onfirm, [x] cancel") else {
            session.cancel();
            break;
        };
        apply_command(&mut session, &input);
    }
}

fn apply_command(session: &mut ModalSession, input: &str) {
    match input {
        "c" | "confirm" => {
            // A rejected confirm keeps the window open; the notice is shown next round.
            if let Err(e) = session.confirm() {
                tracing::debug!(error = %e, "confirm rejected");
            }
        }
        "x" | "cancel" => session.cancel(),
        other => match other.parse::<usize>() {
            Ok(n) if n >= 1 => edit_field(session, n - 1),
            _ => println!("{}", "unknown command".yellow()),
        },
    }
}

fn edit_field(session: &mut ModalSession, idx: usize) {
    let Some(field) = session.view().fields.get(idx).cloned() else {
        println!("{}", format!("no field {}", idx + 1).yellow());
        return;
    };
    let res = match &field.control {
        Control::Boolean { checked } => session.set_checked(idx, !checked),
        Control::Single { choices, .. } => {
            print_choices(choices.iter().map(|c| (c.as_str(), false)));
            match read_line("choice number").and_then(|s| s.parse::<usize>().ok()) {
                Some(n) if n >= 1 => session.select(idx, n - 1),
                _ => Ok(()),
            }
        }
        Control::Multi { choices } => {
            print_choices(choices.iter().map(|c| (c.value.as_str(), c.checked)));
            let Some(line) = read_line("choice numbers (space separated, empty clears)") else {
                return;
            };
            let picked: Vec<usize> = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter_map(|s| s.parse::<usize>().ok())
                .collect();
            (0..choices.len())
                .map(|i| session.set_choice(idx, i, picked.contains(&(i + 1))))
                .collect::<Result<(), _>>()
        }
    };
    if let Err(e) = res {
        println!("{}", e.to_string().yellow());
    }
}

pub fn show_form(form: &FormView) {
    println!("\n{}", format!("━━ {} ━━", form.title).bold());
    for (i, f) in form.fields.iter().enumerate() {
        println!("{}. {}", i + 1, render_field(f));
    }
    println!("{}", "[c] Conferma   [x] Annulla".dimmed());
}

fn render_field(f: &FieldView) -> String {
    let label = if f.required { format!("{} *", f.name).bold().to_string() } else { f.name.bold().to_string() };
    let price = if f.delta != 0 { format!(" ({})", fmt_delta(f.delta)).dimmed().to_string() } else { String::new() };
    let value = match &f.control {
        Control::Boolean { checked } => if *checked { "[x]".green().to_string() } else { "[ ]".to_string() },
        Control::Single { choices, selected } => match selected.and_then(|i| choices.get(i)) {
            Some(c) => c.cyan().to_string(),
            None => "(none)".dimmed().to_string(),
        },
        Control::Multi { choices } => choices
            .iter()
            .map(|c| if c.checked { format!("[x] {}", c.value).green().to_string() } else { format!("[ ] {}", c.value) })
            .collect::<Vec<_>>()
            .join("  "),
    };
    format!("{label}{price}: {value}")
}

fn print_choices<'a>(choices: impl Iterator<Item = (&'a str, bool)>) {
    for (i, (c, on)) in choices.enumerate() {
        let mark = if on { "*" } else { " " };
        println!("   {mark}{}) {}", i + 1, c);
    }
}

pub fn fmt_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    format!("{sign}€{}.{:02}", (cents / 100).abs(), (cents % 100).abs())
}

fn fmt_delta(cents: i64) -> String {
    if cents >= 0 { format!("+{}", fmt_cents(cents)) } else { fmt_cents(cents) }
}

/// Reads one trimmed line; `None` on EOF or a read error.
pub fn read_line(prompt: &str) -> Option<String> {
    print!("{}: ", prompt);
    let _ = io::stdout().flush();
    let mut s = String::new();
    match io::stdin().read_line(&mut s) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(s.trim().to_lowercase()),
    }
}

pub fn confirm(prompt: &str) -> bool {
    matches!(read_line(&format!("{} [y/N]", prompt)).as_deref(), Some("y" | "yes" | "s" | "si" | "sì"))
}

pub fn show_products(products: &[Product]) {
    println!("\n=== PRODUCTS ===");
    for p in products {
        println!("{:>4}  {:<30} {}", p.id.to_string().bold(), p.name, fmt_cents(p.price_cents));
    }
    println!();
}

pub fn print_cart_dashboard(cart: &Cart) {
    println!(
        "\n{}",
        "┏━━━━━━━━━━━━━━━━━━━━━━━━━ Cart ━━━━━━━━━━━━━━━━━━━━━━━━━┓".bold()
    );
    println!(
        "  {}: {}   {}: {}   {}: {}",
        "Lines".cyan().bold(), cart.lines.len(),
        "Items".yellow().bold(), cart.item_count(),
        "Total".green().bold(), fmt_cents(cart.total_cents())
    );
    println!("{}", "┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛".bold());

    for (i, l) in cart.lines.iter().enumerate() {
        println!("[{}] {} x{}  {}", i + 1, l.name.bold(), l.qty, fmt_cents(l.unit_price_cents));
        for o in &l.options {
            let delta = if o.delta != 0 { format!("  {}", fmt_delta(o.delta)) } else { String::new() };
            println!("      {}: {}{}", o.name, o.value, delta.dimmed());
        }
    }
}

/// Shows a spinner while the wrapped source loads prompts.
pub struct SpinnerSource {
    inner: DynSource,
}

impl SpinnerSource {
    pub fn new(inner: DynSource) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl PromptSource for SpinnerSource {
    async fn fetch_prompts(&self, product_id: i64) -> Vec<Prompt> {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("loading options for product {product_id}"));
        pb.enable_steady_tick(Duration::from_millis(80));
        let prompts = self.inner.fetch_prompts(product_id).await;
        pb.finish_and_clear();
        prompts
    }
}
