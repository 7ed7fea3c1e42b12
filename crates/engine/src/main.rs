//! Sheetforge - Main entry point.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sheetforge_engine::cli::{execute, parse_args};
use sheetforge_engine::infrastructure::config::{AppConfig, DEFAULT_LOG_FILTER};
use sheetforge_engine::App;

fn main() -> anyhow::Result<()> {
    // Load environment from repo root so `cargo run` works from any member.
    load_dotenv_from_repo_root();

    // Logs go to stderr; stdout carries the JSON result.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let command = parse_args(std::env::args().skip(1))?;
    let config = AppConfig::from_env().context("loading configuration")?;
    tracing::info!(
        rules_path = ?config.rules_path,
        srd = config.include_srd,
        sheet_cache = config.sheet_cache,
        sheet_cache_capacity = config.sheet_cache_capacity,
        "Starting sheetforge"
    );

    let app = App::new(config).context("loading rule tables")?;
    let output = execute(&app, command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
