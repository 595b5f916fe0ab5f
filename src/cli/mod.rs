use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "pos_customizer", version, about = "Point-of-sale cart with per-product customization prompts")]
pub struct Args {
    /// TOML config file; flags below override its values.
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long)]
    pub root: Option<String>,

    /// Server exposing /api/products/{id}/prompts
    #[arg(long)]
    pub base_url: Option<String>,

    /// JSON array of {"id", "name", "price_cents"}
    #[arg(long)]
    pub products: Option<String>,

    /// JSON object of product id -> prompt array, used instead of the server
    #[arg(long)]
    pub prompts_file: Option<String>,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Save fetched prompts and resulting lines under <root>/.pos/tx/<uuid>/
    #[arg(long, default_value_t = false)]
    pub save_session: bool,

    #[arg(long, default_value_t = false)]
    pub debug: bool,
}
