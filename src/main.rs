mod config;
mod errors;
mod logging;
mod mcp;
mod security;
mod server;
mod tools;
mod upstream;


use crate::config::Config;
use crate::security::{AllowedDirs, PathValidator};
use crate::upstream::OpenAiClient;
use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path = PathBuf::from("steward.toml");
    let mut explicit = false;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                if i >= args.len() { eprintln!("--config requires a path"); std::process::exit(2); }
                config_path = PathBuf::from(&args[i]);
                explicit = true;
            }
            _ => {}
        }
        i += 1;
    }

    let cfg = Config::load_or_default(&config_path, explicit).context("loading config")?;
    cfg.validate().context("validating config")?;
    let api_key = cfg.api_key()?;

    let allowed = AllowedDirs::from_config(&cfg.files).context("resolving allowed_dirs")?;
    let validator = Arc::new(PathValidator::new(allowed, cfg.files.containment));
    let registry = mcp::registry::ToolRegistry::new(validator.clone());
    let model = OpenAiClient::new(cfg.model.clone(), api_key).context("building upstream client")?;

    info!(
        allowed_dirs = ?validator.allowed(),
        containment = ?cfg.files.containment,
        model = %cfg.model.model,
        tools = ?registry.list_names(),
        "steward ready"
    );

    server::serve(server::AppState {
        cfg: Arc::new(cfg),
        registry: Arc::new(registry),
        model: Arc::new(model),
    })
    .await
}
