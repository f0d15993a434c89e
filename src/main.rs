// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 Singulabs bot contributors

use clap::Parser;
use singulabs_bot::app::config::{GlobalSettings, load_proxies};
use singulabs_bot::app::logging::setup_logging;
use singulabs_bot::domain::error::AppError;
use singulabs_bot::services::fleet::Fleet;
use singulabs_bot::services::identity::load_identities;

#[derive(Parser, Debug)]
#[command(author, version, about = "singulabs points farming fleet")]
struct Cli {
    /// Path to config file (default: config.{toml,yaml,...})
    #[arg(long)]
    config: Option<String>,

    /// Private key file, one key per line (overrides config)
    #[arg(long)]
    keys: Option<String>,

    /// Proxy list file (overrides config)
    #[arg(long)]
    proxies: Option<String>,

    /// Emit JSON log lines instead of the compact console format
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let mut settings = GlobalSettings::load_with_path(cli.config.as_deref())?;
    if let Some(keys) = cli.keys {
        settings.keys_path = keys;
    }
    if let Some(proxies) = cli.proxies {
        settings.proxies_path = proxies;
    }

    setup_logging(if settings.debug { "debug" } else { "info" }, cli.json_logs);

    tracing::info!(
        base_url = %settings.base_url,
        web_domain = %settings.web_domain,
        chain_id = settings.chain_id,
        halt_fleet_on_fault = settings.halt_fleet_on_fault,
        "Starting singulabs-bot"
    );

    // Missing or empty key file is the one fatal startup condition.
    let identities = load_identities(&settings.keys_path)?;
    let proxies = load_proxies(&settings.proxies_path);

    Fleet::new(settings, identities, proxies).run().await
}
