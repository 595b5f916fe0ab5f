use crate::page::SharedPage;
use crate::wire::CartLine;

/// Receives each finished line. Implementations own the line from here on.
pub trait CartSink: Send + Sync {
    fn add_line(&self, line: CartLine);
}

/// The page's in-memory cart. Lines are appended, never merged: adding the
/// same product twice yields two lines.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn push(&mut self, line: CartLine) {
        self.lines.push(line);
    }

    pub fn total_cents(&self) -> i64 {
        self.lines
            .iter()
            .map(|l| l.unit_price_cents.saturating_mul(i64::from(l.qty)))
            .fold(0i64, i64::saturating_add)
    }

    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.qty).sum()
    }

    /// Payload for the hidden `cart_json` field.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.lines)
    }
}

/// Default sink: bumps the product's quantity input, records the line in the
/// page cart and refreshes the hidden cart field.
pub struct PageCartSink {
    page: SharedPage,
    qty_prefix: String,
    cart_field_id: String,
}

impl PageCartSink {
    pub fn new(page: SharedPage, qty_prefix: &str, cart_field_id: &str) -> Self {
        Self {
            page,
            qty_prefix: qty_prefix.to_string(),
            cart_field_id: cart_field_id.to_string(),
        }
    }
}

impl CartSink for PageCartSink {
    fn add_line(&self, line: CartLine) {
        let mut page = self.page.lock();
        let input = format!("{}{}", self.qty_prefix, line.product_id);
        if let Some(qty) = page.inputs.get_mut(&input) {
            *qty += i64::from(line.qty);
        }
        page.cart.push(line);
        page.sync_cart_field(&self.cart_field_id);
    }
}
