use anyhow::{anyhow, Context};
use clap::Parser;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

use pos_customizer::catalog::{make_source, DynSource, PromptSource};
use pos_customizer::cli::Args;
use pos_customizer::config::Config;
use pos_customizer::page::{product_card, Click, Page, Selector};
use pos_customizer::ux::{self, SpinnerSource, TerminalSurface};
use pos_customizer::wire::Product;
use pos_customizer::{log, wire_customization_hook, ClickOutcome, HookConfig, ModalController};

fn load_products(path: &str) -> anyhow::Result<Vec<Product>> {
    let text = fs_err::read_to_string(path)?;
    serde_json::from_str(&text).with_context(|| format!("invalid products file {path}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    log::init(args.debug);

    let cfg = Config::load(&args)?;
    let products = match &cfg.products_file {
        Some(path) => load_products(path)?,
        None => return Err(anyhow!("no products to sell; pass --products <file.json>")),
    };

    let mut page = Page::new().with_order_form().with_hidden_field(&cfg.cart_field_id);
    for p in &products {
        page = page.with_qty_input(&format!("{}{}", cfg.qty_prefix, p.id));
    }
    let page = page.shared();

    let session_log = cfg
        .save_session
        .then(|| Arc::new(Mutex::new(log::SessionLog::new(Path::new(&cfg.root)))));
    if let Some(sl) = &session_log {
        if args.debug {
            println!("debug: session artifacts directory: {}", sl.lock().dir().display());
        }
    }

    let mut source: DynSource = Box::new(SpinnerSource::new(make_source(&cfg)?));
    if let Some(sl) = &session_log {
        source = Box::new(log::RecordingSource::new(source, sl.clone()));
    }
    let source: Arc<dyn PromptSource + Send + Sync> = Arc::from(source);
    let modal = ModalController::new(page.clone(), Arc::new(TerminalSurface));
    let hook = wire_customization_hook(page.clone(), modal, source, HookConfig::default(), &cfg)?
        .ok_or_else(|| anyhow!("page already wired"))?;

    let grid = Selector::parse(&cfg.grid_selector)?.to_element();
    let button = Selector::parse(&cfg.plus_btn_selector)?.to_element();

    loop {
        ux::show_products(&products);
        let Some(input) = ux::read_line("product id to add, [q] to finish") else { break };
        if input == "q" || input.is_empty() {
            break;
        }
        let Some(product) = input.parse::<i64>().ok().and_then(|id| products.iter().find(|p| p.id == id)) else {
            println!("no product {input}");
            continue;
        };

        let mut click = Click::new(vec![button.clone(), product_card(product), grid.clone()]);
        match hook.handle_click(&mut click).await {
            ClickOutcome::Added(line) => {
                if let Some(sl) = &session_log {
                    let saved = sl.lock().save_line(&line)?;
                    if args.debug {
                        log::print_saved_path("line", &saved);
                    }
                }
                ux::print_cart_dashboard(&page.lock().cart);
            }
            ClickOutcome::Cancelled => println!("Customization cancelled."),
            ClickOutcome::Busy | ClickOutcome::Ignored => {}
        }
    }

    let cart = page.lock().cart.clone();
    if cart.lines.is_empty() {
        println!("Cart is empty.");
        return Ok(());
    }
    ux::print_cart_dashboard(&cart);
    if !ux::confirm("Submit this order?") {
        println!("Order discarded.");
        return Ok(());
    }

    let payload = page.lock().hidden.get(&cfg.cart_field_id).cloned().unwrap_or_default();
    println!("{}", payload);
    if let Some(sl) = &session_log {
        let saved = sl.lock().save_order(&cart)?;
        if args.debug {
            log::print_saved_path("order", &saved);
        }
    }
    Ok(())
}
