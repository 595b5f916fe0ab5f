use serde::{Deserialize, Serialize};

/// ========================================
/// Customization data model
/// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Boolean,
    Single,
    Multi,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub name: String,
    /// Lower-cased kind as received. Anything other than `boolean` or `multi`
    /// behaves as `single`.
    pub kind: String,
    pub required: bool,
    /// Price adjustment in cents, flat per prompt.
    pub delta: i64,
    pub choices: Vec<String>,
}

impl Prompt {
    pub fn kind(&self) -> PromptKind {
        match self.kind.as_str() {
            "boolean" => PromptKind::Boolean,
            "multi" => PromptKind::Multi,
            _ => PromptKind::Single,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChosenOption {
    pub name: String,
    pub value: String,
    pub delta: i64,
}

/// One priced line handed to the cart. Field names match the `cart_json`
/// payload accepted by the checkout endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    pub name: String,
    pub qty: u32,
    pub unit_price_cents: i64,
    #[serde(default)]
    pub options: Vec<ChosenOption>,
}

/// A sellable product as listed on the order page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub price_cents: i64,
}
