use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use crate::config::Config;
use crate::prompt::normalize_all;
use crate::wire::Prompt;

pub mod http;

pub use http::HttpCatalog;

/// Where a product's prompts come from.
///
/// Implementations never fail: an empty list means "add without asking",
/// whether the product has no prompts or the lookup went wrong.
#[async_trait]
pub trait PromptSource: Send + Sync {
    async fn fetch_prompts(&self, product_id: i64) -> Vec<Prompt>;
}

pub type DynSource = Box<dyn PromptSource + Send + Sync>;

pub fn make_source(cfg: &Config) -> Result<DynSource> {
    match &cfg.prompts_file {
        Some(path) => Ok(Box::new(StaticCatalog::from_file(Path::new(path))?)),
        None => Ok(Box::new(HttpCatalog::new(&cfg.base_url, cfg.timeout_secs)?)),
    }
}

/// Raw prompt records held in memory, keyed by product id.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    raw: HashMap<i64, Vec<Value>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, product_id: i64, raw: Vec<Value>) {
        self.raw.insert(product_id, raw);
    }

    /// Reads a JSON object mapping product ids to raw prompt arrays,
    /// e.g. `{"12": [{"name": "Size", "choices_csv": "S;M;L"}]}`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs_err::read_to_string(path)?;
        let map: HashMap<String, Vec<Value>> = serde_json::from_str(&text)
            .with_context(|| format!("invalid prompts file {}", path.display()))?;
        let mut out = Self::new();
        for (key, raw) in map {
            let id: i64 = key
                .trim()
                .parse()
                .with_context(|| format!("prompts file key {key:?} is not a product id"))?;
            out.insert(id, raw);
        }
        Ok(out)
    }
}

#[async_trait]
impl PromptSource for StaticCatalog {
    async fn fetch_prompts(&self, product_id: i64) -> Vec<Prompt> {
        self.raw.get(&product_id).map(|raw| normalize_all(raw)).unwrap_or_default()
    }
}
