//! Database Restore Tool
//!
//! Restores platform databases from a backup archive.

// dbrestoretool/src/main.rs
use anyhow::{Context, Result};
use dbrestoretool::api::AuthContext;
use dbrestoretool::config::AppConfig;
use dbrestoretool::restore;
use std::env;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Main entry point for the restore tool
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    init_logging();

    match run_app().await {
        Ok(_) => {
            info!("✅ Restore completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Ignore a second initialisation; the first subscriber stays in place.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn run_app() -> Result<()> {
    let config_path = AppConfig::default_path();
    let mut app_config = AppConfig::load_from_json(&config_path).with_context(|| {
        format!("Failed to load application configuration from {}", config_path.display())
    })?;

    // Databases named on the command line replace the configured list.
    let args: Vec<String> = env::args().skip(1).collect();
    if !args.is_empty() {
        app_config.databases = args;
    }

    let context = env::var("PLATFORM_AUTH_TOKEN")
        .ok()
        .filter(|token| !token.is_empty())
        .map(AuthContext::new);

    info!(
        "🔄 Restoring {} from {}",
        app_config.databases.join(", "),
        app_config.archive_path.display()
    );
    restore::run_restore_flow(&app_config, context.as_ref())
        .await
        .context("Restore process failed")?;
    Ok(())
}
