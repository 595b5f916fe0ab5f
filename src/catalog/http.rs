use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::PromptSource;
use crate::prompt::normalize_all;
use crate::wire::Prompt;

/// Reads prompts from `GET {base}/api/products/{id}/prompts`.
pub struct HttpCatalog {
    base_url: String,
    client: Client,
}

impl HttpCatalog {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, product_id: i64) -> String {
        format!("{}/api/products/{}/prompts", self.base_url, product_id)
    }

    async fn try_fetch(&self, product_id: i64) -> Result<Vec<Value>> {
        let resp = self
            .client
            .get(self.url(product_id))
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("prompt endpoint returned {}", status));
        }

        let text = resp.text().await?;
        match serde_json::from_str::<Value>(&text)? {
            Value::Array(items) => Ok(items),
            other => Err(anyhow!("expected a JSON array, got {}", kind_of(&other))),
        }
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl PromptSource for HttpCatalog {
    async fn fetch_prompts(&self, product_id: i64) -> Vec<Prompt> {
        match self.try_fetch(product_id).await {
            Ok(raw) => {
                let prompts = normalize_all(&raw);
                tracing::debug!(product_id, count = prompts.len(), "prompts loaded");
                prompts
            }
            Err(e) => {
                tracing::warn!(product_id, error = %e, "prompt fetch failed; continuing without prompts");
                Vec::new()
            }
        }
    }
}
