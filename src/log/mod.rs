use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs_err as fs;
use parking_lot::Mutex;
use serde_json::{json, to_string_pretty};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::cart::Cart;
use crate::catalog::{DynSource, PromptSource};
use crate::wire::{CartLine, Prompt};

fn default_filter(debug: bool) -> &'static str {
    if debug { "pos_customizer=debug,info" } else { "info" }
}

/// Log to stderr; `RUST_LOG` wins over the default level.
pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn tx_dir(root: &Path, tx: Uuid) -> PathBuf {
    root.join(".pos").join("tx").join(tx.to_string())
}

/// Per-run artifact directory: one file per fetch and per added line, plus the order.
pub struct SessionLog {
    tx: Uuid,
    dir: PathBuf,
    started_at: DateTime<Utc>,
    seq: usize,
}

impl SessionLog {
    pub fn new(root: &Path) -> Self {
        let tx = Uuid::new_v4();
        Self { tx, dir: tx_dir(root, tx), started_at: Utc::now(), seq: 0 }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_prompts(&mut self, product_id: i64, prompts: &[Prompt]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        self.seq += 1;
        let p = self.dir.join(format!("{:03}.prompts.json", self.seq));
        let doc = json!({ "tx": self.tx, "saved_at": Utc::now(), "product_id": product_id, "prompts": prompts });
        fs::write(&p, to_string_pretty(&doc)?)?;
        Ok(p)
    }

    pub fn save_line(&mut self, line: &CartLine) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        self.seq += 1;
        let p = self.dir.join(format!("{:03}.line.json", self.seq));
        let doc = json!({ "tx": self.tx, "saved_at": Utc::now(), "line": line });
        fs::write(&p, to_string_pretty(&doc)?)?;
        Ok(p)
    }

    pub fn save_order(&self, cart: &Cart) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let p = self.dir.join("order.json");
        let doc = json!({
            "tx": self.tx,
            "started_at": self.started_at,
            "submitted_at": Utc::now(),
            "total_cents": cart.total_cents(),
            "lines": cart.lines,
        });
        fs::write(&p, to_string_pretty(&doc)?)?;
        Ok(p)
    }
}

pub type SharedLog = Arc<Mutex<SessionLog>>;

/// Saves every prompt list the wrapped source returns. A failed write is
/// logged and never hides the prompts from the caller.
pub struct RecordingSource {
    inner: DynSource,
    log: SharedLog,
}

impl RecordingSource {
    pub fn new(inner: DynSource, log: SharedLog) -> Self {
        Self { inner, log }
    }
}

#[async_trait]
impl PromptSource for RecordingSource {
    async fn fetch_prompts(&self, product_id: i64) -> Vec<Prompt> {
        let prompts = self.inner.fetch_prompts(product_id).await;
        match self.log.lock().save_prompts(product_id, &prompts) {
            Ok(path) => tracing::debug!(product_id, path = %path.display(), "prompts saved"),
            Err(e) => tracing::warn!(product_id, error = %e, "could not save prompts"),
        }
        prompts
    }
}

pub fn print_saved_path(stage: &str, path: &Path) {
    eprintln!("debug[{stage}]: saved at: {}", path.display());
}
