//! The slice of the order page this crate reads and writes: product cards,
//! click paths, quantity inputs, hidden fields and the interaction lock.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cart::Cart;
use crate::errors::PosError;
use crate::wire::Product;

pub type SharedPage = Arc<Mutex<Page>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub data: BTreeMap<String, String>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn with_data(mut self, key: &str, value: &str) -> Self {
        self.data.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn data(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// First descendant (depth-first, document order) matching `sel`.
    pub fn find(&self, sel: &Selector) -> Option<&Element> {
        for child in &self.children {
            if sel.matches(child) {
                return Some(child);
            }
            if let Some(found) = child.find(sel) {
                return Some(found);
            }
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Id(String),
    Class(String),
}

impl Selector {
    /// Accepts `#id` or `.class`.
    pub fn parse(s: &str) -> Result<Self, PosError> {
        let s = s.trim();
        match (s.get(..1), s.get(1..)) {
            (Some("#"), Some(rest)) if !rest.is_empty() => Ok(Selector::Id(rest.to_string())),
            (Some("."), Some(rest)) if !rest.is_empty() => Ok(Selector::Class(rest.to_string())),
            _ => Err(PosError::Config(format!("unsupported selector {s:?}"))),
        }
    }

    /// A bare element this selector matches.
    pub fn to_element(&self) -> Element {
        match self {
            Selector::Id(id) => Element::new().with_id(id),
            Selector::Class(class) => Element::new().with_class(class),
        }
    }

    pub fn matches(&self, el: &Element) -> bool {
        match self {
            Selector::Id(id) => el.id.as_deref() == Some(id.as_str()),
            Selector::Class(class) => el.classes.iter().any(|c| c == class),
        }
    }
}

/// Card markup for one product: `data-id`, `data-name`, `data-price` and a
/// `.title` child.
pub fn product_card(p: &Product) -> Element {
    Element::new()
        .with_class("card")
        .with_data("id", &p.id.to_string())
        .with_data("name", &p.name)
        .with_data("price", &p.price_cents.to_string())
        .with_child(Element::new().with_class("title").with_text(&p.name))
}

/// A click as seen by a delegated handler: `path[0]` is the target, followed
/// by its ancestors up to the root.
#[derive(Debug, Clone)]
pub struct Click {
    pub path: Vec<Element>,
    propagation_stopped: bool,
}

impl Click {
    pub fn new(path: Vec<Element>) -> Self {
        Self { path, propagation_stopped: false }
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderForm {
    pub pointer_events: bool,
}

#[derive(Debug, Default)]
pub struct Page {
    /// Quantity inputs keyed by input name.
    pub inputs: BTreeMap<String, i64>,
    /// Hidden fields keyed by id.
    pub hidden: BTreeMap<String, String>,
    pub order_form: Option<OrderForm>,
    pub cart: Cart,
    root_scroll_locked: bool,
    body_scroll_locked: bool,
    locked: bool,
    hook_wired: bool,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedPage {
        Arc::new(Mutex::new(self))
    }

    pub fn with_order_form(mut self) -> Self {
        self.order_form = Some(OrderForm { pointer_events: true });
        self
    }

    pub fn with_qty_input(mut self, name: &str) -> Self {
        self.inputs.insert(name.to_string(), 0);
        self
    }

    pub fn with_hidden_field(mut self, id: &str) -> Self {
        self.hidden.insert(id.to_string(), String::new());
        self
    }

    /// Suspend the order form and page scrolling. Idempotent.
    pub fn lock_interaction(&mut self) {
        if self.locked {
            return;
        }
        self.locked = true;
        self.root_scroll_locked = true;
        self.body_scroll_locked = true;
        if let Some(form) = self.order_form.as_mut() {
            form.pointer_events = false;
        }
    }

    /// Undo `lock_interaction`. Idempotent.
    pub fn release_interaction(&mut self) {
        if !self.locked {
            return;
        }
        self.locked = false;
        self.root_scroll_locked = false;
        self.body_scroll_locked = false;
        if let Some(form) = self.order_form.as_mut() {
            form.pointer_events = true;
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn scroll_locked(&self) -> bool {
        self.root_scroll_locked && self.body_scroll_locked
    }

    /// Returns false if the page was already wired.
    pub(crate) fn mark_hook_wired(&mut self) -> bool {
        !std::mem::replace(&mut self.hook_wired, true)
    }

    /// Write the serialized cart into hidden field `field_id`, if present.
    pub fn sync_cart_field(&mut self, field_id: &str) {
        if !self.hidden.contains_key(field_id) {
            return;
        }
        match self.cart.to_json() {
            Ok(json) => {
                self.hidden.insert(field_id.to_string(), json);
            }
            Err(e) => tracing::warn!(error = %e, "cart serialization failed"),
        }
    }
}
