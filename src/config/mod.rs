use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli::Args;
use crate::errors::PosError;
use crate::page::Selector;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub root: String,
    /// Server exposing `/api/products/{id}/prompts`.
    pub base_url: String,
    pub timeout_secs: u64,
    pub grid_selector: String,
    pub plus_btn_selector: String,
    /// Quantity inputs are named `{qty_prefix}{product_id}`.
    pub qty_prefix: String,
    pub cart_field_id: String,
    /// Offline prompt catalog; when set the server is not contacted.
    pub prompts_file: Option<String>,
    pub products_file: Option<String>,
    pub save_session: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: ".".into(),
            base_url: "http://localhost:8000".into(),
            timeout_secs: 10,
            grid_selector: "#products-grid".into(),
            plus_btn_selector: ".btn-plus".into(),
            qty_prefix: "qty_".into(),
            cart_field_id: "cart_json".into(),
            prompts_file: None,
            products_file: None,
            save_session: false,
        }
    }
}

impl Config {
    /// Defaults, then the TOML file if given, then command-line overrides.
    pub fn load(args: &Args) -> Result<Self> {
        let mut cfg = match &args.config {
            Some(path) => Self::from_file(Path::new(path))?,
            None => Self::default(),
        };
        cfg.apply_args(args);
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs_err::read_to_string(path)?;
        toml::from_str(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    fn apply_args(&mut self, args: &Args) {
        if let Some(v) = &args.root { self.root = v.clone(); }
        if let Some(v) = &args.base_url { self.base_url = v.clone(); }
        if let Some(v) = args.timeout_secs { self.timeout_secs = v; }
        if let Some(v) = &args.products { self.products_file = Some(v.clone()); }
        if let Some(v) = &args.prompts_file { self.prompts_file = Some(v.clone()); }
        if args.save_session { self.save_session = true; }
    }

    pub fn validate(&self) -> Result<(), PosError> {
        Selector::parse(&self.grid_selector)?;
        Selector::parse(&self.plus_btn_selector)?;
        if self.cart_field_id.trim().is_empty() {
            return Err(PosError::Config("cart_field_id must not be empty".into()));
        }
        Ok(())
    }
}
