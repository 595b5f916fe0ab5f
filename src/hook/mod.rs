//! Add-to-cart orchestration: a click on a product's add button becomes a
//! priced `CartLine`, asking for customizations first when the product has
//! any.

use std::sync::Arc;

use crate::cart::{CartSink, PageCartSink};
use crate::catalog::PromptSource;
use crate::config::Config;
use crate::errors::PosError;
use crate::modal::ModalController;
use crate::page::{Click, Element, Selector, SharedPage};
use crate::pricing::unit_price;
use crate::prompt::parse_cents;
use crate::wire::{CartLine, Prompt};

const FALLBACK_NAME: &str = "Prodotto";

#[derive(Default)]
pub struct HookConfig {
    pub grid_selector: Option<String>,
    pub plus_btn_selector: Option<String>,
    /// Replaces the default page cart behavior.
    pub add_line: Option<Arc<dyn CartSink>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Not an add button inside the product grid.
    Ignored,
    /// A customization window is already open.
    Busy,
    Cancelled,
    Added(CartLine),
}

/// Product data read from a card's `data-*` attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardInfo {
    pub product_id: i64,
    pub name: String,
    pub base_price_cents: i64,
}

pub struct CustomizationHook {
    grid: Selector,
    button: Selector,
    title: Selector,
    sink: Arc<dyn CartSink>,
    page: SharedPage,
    modal: ModalController,
    source: Arc<dyn PromptSource>,
    cart_field_id: String,
}

/// Attach the add-to-cart handler to `page`. Returns `None` when the page is
/// already wired, so calling this twice never double-handles clicks.
pub fn wire_customization_hook(
    page: SharedPage,
    modal: ModalController,
    source: Arc<dyn PromptSource>,
    hook_cfg: HookConfig,
    cfg: &Config,
) -> Result<Option<CustomizationHook>, PosError> {
    let grid = Selector::parse(hook_cfg.grid_selector.as_deref().unwrap_or(&cfg.grid_selector))?;
    let button = Selector::parse(hook_cfg.plus_btn_selector.as_deref().unwrap_or(&cfg.plus_btn_selector))?;

    if !page.lock().mark_hook_wired() {
        tracing::debug!("customization hook already wired");
        return Ok(None);
    }

    let sink = hook_cfg.add_line.unwrap_or_else(|| {
        Arc::new(PageCartSink::new(page.clone(), &cfg.qty_prefix, &cfg.cart_field_id))
    });

    Ok(Some(CustomizationHook {
        grid,
        button,
        title: Selector::Class("title".into()),
        sink,
        page,
        modal,
        source,
        cart_field_id: cfg.cart_field_id.clone(),
    }))
}

impl CustomizationHook {
    pub async fn handle_click(&self, click: &mut Click) -> ClickOutcome {
        let card = match self.locate_card(click) {
            Some(card) => card,
            None => return ClickOutcome::Ignored,
        };
        click.stop_propagation();

        if self.modal.is_open() {
            tracing::debug!(product_id = card.product_id, "click ignored while a customization window is open");
            return ClickOutcome::Busy;
        }

        let prompts = self.source.fetch_prompts(card.product_id).await;
        self.add_with_prompts(card, prompts).await
    }

    async fn add_with_prompts(&self, card: CardInfo, prompts: Vec<Prompt>) -> ClickOutcome {
        let options = if prompts.is_empty() {
            Vec::new()
        } else {
            match self.modal.open(&card.name, prompts).await {
                Some(options) => options,
                None => {
                    tracing::info!(product_id = card.product_id, "customization cancelled");
                    return ClickOutcome::Cancelled;
                }
            }
        };

        let line = CartLine {
            product_id: card.product_id,
            name: card.name,
            qty: 1,
            unit_price_cents: unit_price(card.base_price_cents, &options),
            options,
        };
        tracing::info!(
            product_id = line.product_id,
            unit_price_cents = line.unit_price_cents,
            options = line.options.len(),
            "line added"
        );
        self.sink.add_line(line.clone());
        self.page.lock().sync_cart_field(&self.cart_field_id);
        ClickOutcome::Added(line)
    }

    /// The card whose add button was clicked: the nearest button on the
    /// path, a card with `data-id` above it, and the grid above that.
    fn locate_card(&self, click: &Click) -> Option<CardInfo> {
        let button_at = click.path.iter().position(|el| self.button.matches(el))?;
        let above = &click.path[button_at..];
        let grid_at = above.iter().position(|el| self.grid.matches(el))?;
        let card = above[..grid_at].iter().find(|el| el.data("id").is_some())?;
        self.card_info(card)
    }

    pub fn card_info(&self, card: &Element) -> Option<CardInfo> {
        let product_id = card.data("id")?.trim().parse::<i64>().ok()?;
        let name = card
            .data("name")
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .or_else(|| card.find(&self.title).map(|t| t.text.trim()).filter(|t| !t.is_empty()))
            .unwrap_or(FALLBACK_NAME)
            .to_string();
        let base_price_cents = card.data("price").map(parse_cents).unwrap_or(0);
        Some(CardInfo { product_id, name, base_price_cents })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::modal::testing::SlotSurface;
    use crate::page::Page;
    use crate::wire::ChosenOption;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Notify;

    struct Rig {
        page: SharedPage,
        surface: Arc<SlotSurface>,
        hook: CustomizationHook,
    }

    fn catalog(prompts: Vec<(i64, Value)>) -> StaticCatalog {
        let mut catalog = StaticCatalog::new();
        for (id, raw) in prompts {
            catalog.insert(id, raw.as_array().cloned().unwrap_or_default());
        }
        catalog
    }

    fn rig(prompts: Vec<(i64, Value)>, add_line: Option<Arc<dyn CartSink>>) -> Rig {
        rig_with(Arc::new(catalog(prompts)), add_line)
    }

    fn rig_with(source: Arc<dyn PromptSource>, add_line: Option<Arc<dyn CartSink>>) -> Rig {
        let page = Page::new()
            .with_order_form()
            .with_qty_input("qty_7")
            .with_hidden_field("cart_json")
            .shared();
        let surface = SlotSurface::new();
        let modal = ModalController::new(page.clone(), surface.clone());
        let hook_cfg = HookConfig { add_line, ..HookConfig::default() };
        let hook = wire_customization_hook(page.clone(), modal, source, hook_cfg, &Config::default())
            .unwrap()
            .unwrap();
        Rig { page, surface, hook }
    }

    /// Holds the fetch for one product until `gate` is notified. `entered`
    /// fires once that fetch is parked.
    struct GatedSource {
        inner: StaticCatalog,
        gated_id: i64,
        entered: Notify,
        gate: Notify,
    }

    impl GatedSource {
        fn new(inner: StaticCatalog, gated_id: i64) -> Arc<Self> {
            Arc::new(Self { inner, gated_id, entered: Notify::new(), gate: Notify::new() })
        }
    }

    #[async_trait]
    impl PromptSource for GatedSource {
        async fn fetch_prompts(&self, product_id: i64) -> Vec<Prompt> {
            if product_id == self.gated_id {
                self.entered.notify_one();
                self.gate.notified().await;
            }
            self.inner.fetch_prompts(product_id).await
        }
    }

    fn card(id: &str, name: Option<&str>, price: &str) -> Element {
        let mut el = Element::new().with_class("card").with_data("id", id).with_data("price", price);
        if let Some(name) = name {
            el = el.with_data("name", name);
        }
        el
    }

    fn click_on(card: Element) -> Click {
        Click::new(vec![
            Element::new().with_class("icon"),
            Element::new().with_class("btn-plus"),
            card,
            Element::new().with_id("products-grid"),
            Element::new().with_id("body"),
        ])
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<CartLine>>);

    impl CartSink for Recorder {
        fn add_line(&self, line: CartLine) {
            self.0.lock().push(line);
        }
    }

    #[tokio::test]
    async fn product_without_prompts_is_added_directly() {
        let r = rig(vec![], None);
        let mut click = click_on(card("7", Some("Acqua"), "150"));

        let outcome = r.hook.handle_click(&mut click).await;
        let expected = CartLine { product_id: 7, name: "Acqua".into(), qty: 1, unit_price_cents: 150, options: vec![] };
        assert_eq!(outcome, ClickOutcome::Added(expected.clone()));
        assert!(click.propagation_stopped());
        assert_eq!(r.surface.shown(), 0);

        let page = r.page.lock();
        assert_eq!(page.inputs["qty_7"], 1);
        assert_eq!(page.cart.lines, vec![expected.clone()]);
        let field: Vec<CartLine> = serde_json::from_str(&page.hidden["cart_json"]).unwrap();
        assert_eq!(field, vec![expected]);
    }

    #[tokio::test]
    async fn checked_boolean_adds_its_delta() {
        let r = rig(vec![(7, json!([{"name": "Extra cheese", "kind": "boolean", "required": false, "delta": 150}]))], None);
        let mut click = click_on(card("7", Some("Pizza"), "800"));

        let drive = async {
            let mut s = r.surface.next().await;
            assert_eq!(s.view().title, "Pizza");
            s.set_checked(0, true).unwrap();
            s.confirm().unwrap();
        };
        let (outcome, ()) = tokio::join!(r.hook.handle_click(&mut click), drive);

        let line = match outcome {
            ClickOutcome::Added(line) => line,
            other => panic!("expected a line, got {other:?}"),
        };
        assert_eq!(line.unit_price_cents, 950);
        assert_eq!(line.options, vec![ChosenOption { name: "Extra cheese".into(), value: "sì".into(), delta: 150 }]);
        assert_eq!(r.page.lock().cart.total_cents(), 950);
    }

    #[tokio::test]
    async fn required_single_defaults_to_first_choice() {
        let r = rig(
            vec![(7, json!([{"name": "Size", "kind": "single", "required": true, "choices": ["S", "M", "L"], "delta": 50}]))],
            None,
        );
        let mut click = click_on(card("7", Some("Cola"), "300"));

        let drive = async {
            r.surface.next().await.confirm().unwrap();
        };
        let (outcome, ()) = tokio::join!(r.hook.handle_click(&mut click), drive);

        let line = match outcome {
            ClickOutcome::Added(line) => line,
            other => panic!("expected a line, got {other:?}"),
        };
        assert_eq!(line.options, vec![ChosenOption { name: "Size".into(), value: "S".into(), delta: 50 }]);
        assert_eq!(line.unit_price_cents, 350);
    }

    #[tokio::test]
    async fn cancelling_leaves_the_cart_untouched() {
        for dismiss in [false, true] {
            let r = rig(vec![(7, json!([{"name": "Extra", "kind": "boolean", "delta": 100}]))], None);
            let mut click = click_on(card("7", Some("Pizza"), "800"));
            let drive = async {
                let mut s = r.surface.next().await;
                s.set_checked(0, true).unwrap();
                if dismiss { s.dismiss() } else { s.cancel() }
            };
            let (outcome, ()) = tokio::join!(r.hook.handle_click(&mut click), drive);

            assert_eq!(outcome, ClickOutcome::Cancelled);
            let page = r.page.lock();
            assert!(page.cart.lines.is_empty());
            assert_eq!(page.inputs["qty_7"], 0);
            assert_eq!(page.hidden["cart_json"], "");
            assert!(!page.is_locked());
        }
    }

    #[tokio::test]
    async fn clicks_outside_an_add_button_are_ignored() {
        let r = rig(vec![], None);

        let mut not_button = Click::new(vec![card("7", None, "100"), Element::new().with_id("products-grid")]);
        assert_eq!(r.hook.handle_click(&mut not_button).await, ClickOutcome::Ignored);
        assert!(!not_button.propagation_stopped());

        let mut outside_grid = Click::new(vec![Element::new().with_class("btn-plus"), card("7", None, "100")]);
        assert_eq!(r.hook.handle_click(&mut outside_grid).await, ClickOutcome::Ignored);

        let mut no_card = Click::new(vec![Element::new().with_class("btn-plus"), Element::new().with_id("products-grid")]);
        assert_eq!(r.hook.handle_click(&mut no_card).await, ClickOutcome::Ignored);
        assert!(r.page.lock().cart.lines.is_empty());
    }

    #[tokio::test]
    async fn clicks_while_a_window_is_open_are_busy() {
        let r = rig(vec![(7, json!([{"name": "Extra", "kind": "boolean", "delta": 100}]))], None);
        let mut first = click_on(card("7", Some("Pizza"), "800"));
        let mut second = click_on(card("8", Some("Acqua"), "100"));

        let drive = async {
            let mut s = r.surface.next().await;
            let outcome = r.hook.handle_click(&mut second).await;
            assert_eq!(outcome, ClickOutcome::Busy);
            assert!(second.propagation_stopped());
            s.confirm().unwrap();
        };
        let (outcome, ()) = tokio::join!(r.hook.handle_click(&mut first), drive);

        assert!(matches!(outcome, ClickOutcome::Added(ref l) if l.unit_price_cents == 800));
        assert_eq!(r.surface.shown(), 1);
        assert_eq!(r.page.lock().cart.lines.len(), 1);
    }

    #[tokio::test]
    async fn plain_product_is_added_when_a_window_opens_during_its_fetch() {
        let source = GatedSource::new(catalog(vec![(7, json!([{"name": "Extra", "kind": "boolean", "delta": 100}]))]), 8);
        let r = rig_with(source.clone(), None);
        let mut water = click_on(card("8", Some("Acqua"), "150"));
        let mut pizza = click_on(card("7", Some("Pizza"), "800"));
        let water_done = AtomicBool::new(false);

        let first = async {
            let outcome = r.hook.handle_click(&mut water).await;
            water_done.store(true, Ordering::SeqCst);
            outcome
        };
        let second = async {
            source.entered.notified().await;
            r.hook.handle_click(&mut pizza).await
        };
        let drive = async {
            let mut s = r.surface.next().await;
            source.gate.notify_one();
            while !water_done.load(Ordering::SeqCst) {
                tokio::task::yield_now().await;
            }
            assert!(s.is_open());
            assert_eq!(r.page.lock().cart.lines.len(), 1);
            s.set_checked(0, true).unwrap();
            s.confirm().unwrap();
        };
        let (first, second, ()) = tokio::join!(first, second, drive);

        let water_line = CartLine { product_id: 8, name: "Acqua".into(), qty: 1, unit_price_cents: 150, options: vec![] };
        assert_eq!(first, ClickOutcome::Added(water_line));
        assert!(matches!(second, ClickOutcome::Added(ref l) if l.unit_price_cents == 900));
        assert_eq!(r.surface.shown(), 1);

        let page = r.page.lock();
        let ids: Vec<i64> = page.cart.lines.iter().map(|l| l.product_id).collect();
        assert_eq!(ids, vec![8, 7]);
        assert_eq!(page.inputs["qty_7"], 1);
        let field: Vec<CartLine> = serde_json::from_str(&page.hidden["cart_json"]).unwrap();
        assert_eq!(field.len(), 2);
        assert!(!page.is_locked());
    }

    #[tokio::test]
    async fn prompted_product_is_cancelled_when_another_window_won_the_race() {
        let extra = json!([{"name": "Extra", "kind": "boolean", "delta": 100}]);
        let source = GatedSource::new(catalog(vec![(7, extra.clone()), (9, extra)]), 9);
        let r = rig_with(source.clone(), None);
        let mut dessert = click_on(card("9", Some("Tiramisù"), "500"));
        let mut pizza = click_on(card("7", Some("Pizza"), "800"));
        let dessert_done = AtomicBool::new(false);

        let first = async {
            let outcome = r.hook.handle_click(&mut dessert).await;
            dessert_done.store(true, Ordering::SeqCst);
            outcome
        };
        let second = async {
            source.entered.notified().await;
            r.hook.handle_click(&mut pizza).await
        };
        let drive = async {
            let mut s = r.surface.next().await;
            source.gate.notify_one();
            while !dessert_done.load(Ordering::SeqCst) {
                tokio::task::yield_now().await;
            }
            // The losing click neither opened a window nor touched the cart,
            // and the winner's window still holds the page.
            assert!(s.is_open());
            assert_eq!(r.surface.shown(), 1);
            assert!(r.page.lock().cart.lines.is_empty());
            assert!(r.page.lock().is_locked());
            s.confirm().unwrap();
        };
        let (first, second, ()) = tokio::join!(first, second, drive);

        assert_eq!(first, ClickOutcome::Cancelled);
        assert!(dessert.propagation_stopped());
        assert!(matches!(second, ClickOutcome::Added(ref l) if l.product_id == 7 && l.unit_price_cents == 800));

        let page = r.page.lock();
        assert_eq!(page.cart.lines.len(), 1);
        assert_eq!(page.cart.lines[0].product_id, 7);
        assert!(!page.is_locked());
    }

    #[tokio::test]
    async fn custom_sink_receives_the_line() {
        let recorder = Arc::new(Recorder::default());
        let r = rig(vec![], Some(recorder.clone()));
        let mut click = click_on(card("7", Some("Acqua"), "150"));

        assert!(matches!(r.hook.handle_click(&mut click).await, ClickOutcome::Added(_)));
        assert_eq!(recorder.0.lock().len(), 1);
        // The page cart is not the custom sink's; the quantity input stays put.
        assert_eq!(r.page.lock().inputs["qty_7"], 0);
        assert_eq!(r.page.lock().hidden["cart_json"], "[]");
    }

    #[test]
    fn card_fields_fall_back_gracefully() {
        let r = rig(vec![], None);
        let titled = card("4", None, "12,50").with_child(Element::new().with_class("title").with_text(" Panino "));
        assert_eq!(
            r.hook.card_info(&titled),
            Some(CardInfo { product_id: 4, name: "Panino".into(), base_price_cents: 12 })
        );

        let bare = Element::new().with_data("id", "5").with_data("price", "abc");
        assert_eq!(
            r.hook.card_info(&bare),
            Some(CardInfo { product_id: 5, name: FALLBACK_NAME.into(), base_price_cents: 0 })
        );

        assert_eq!(r.hook.card_info(&Element::new().with_data("id", "x")), None);
    }

    #[test]
    fn wiring_twice_is_refused() {
        let page = Page::new().shared();
        let modal = ModalController::new(page.clone(), SlotSurface::new());
        let source: Arc<dyn PromptSource> = Arc::new(StaticCatalog::new());
        let cfg = Config::default();

        let first = wire_customization_hook(page.clone(), modal.clone(), source.clone(), HookConfig::default(), &cfg);
        let second = wire_customization_hook(page, modal, source, HookConfig::default(), &cfg);
        assert!(matches!(first, Ok(Some(_))));
        assert!(matches!(second, Ok(None)));
    }

    #[test]
    fn bad_selectors_fail_before_wiring() {
        let page = Page::new().shared();
        let modal = ModalController::new(page.clone(), SlotSurface::new());
        let hook_cfg = HookConfig { grid_selector: Some("grid".into()), ..HookConfig::default() };
        let res = wire_customization_hook(page.clone(), modal, Arc::new(StaticCatalog::new()), hook_cfg, &Config::default());
        assert!(matches!(res, Err(PosError::Config(_))));
        // The page can still be wired with a valid config.
        let modal = ModalController::new(page.clone(), SlotSurface::new());
        let again = wire_customization_hook(page, modal, Arc::new(StaticCatalog::new()), HookConfig::default(), &Config::default());
        assert!(matches!(again, Ok(Some(_))));
    }
}
