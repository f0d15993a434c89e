// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 Singulabs bot contributors

use crate::domain::constants;
use crate::domain::error::AppError;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default = "default_debug")]
    pub debug: bool,

    // Remote service
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_web_domain")]
    pub web_domain: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    // Input files
    #[serde(default = "default_keys_path")]
    pub keys_path: String,
    #[serde(default = "default_proxies_path")]
    pub proxies_path: String,
    /// Directory where transient payload files are staged between uploads.
    #[serde(default = "default_work_dir")]
    pub work_dir: String,

    // Cycle shape
    #[serde(default = "default_originals_per_cycle")]
    pub originals_per_cycle: usize,
    /// Download payloads from this URL instead of generating placeholders.
    pub image_source_url: Option<String>,

    // Failure handling
    #[serde(default = "default_max_upload_retries")]
    pub max_upload_retries: usize,
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    #[serde(default = "default_inter_cycle_delay_secs")]
    pub inter_cycle_delay_secs: u64,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// Supervision policy: stop the whole fleet when one wallet task faults,
    /// or log the fault and keep the remaining wallets running.
    #[serde(default = "default_true")]
    pub halt_fleet_on_fault: bool,
}

fn default_debug() -> bool {
    false
}
fn default_base_url() -> String {
    constants::API_BASE_URL.to_string()
}
fn default_web_domain() -> String {
    constants::WEB_DOMAIN.to_string()
}
fn default_chain_id() -> u64 {
    constants::CHAIN_ID
}
fn default_keys_path() -> String {
    "pk.txt".to_string()
}
fn default_proxies_path() -> String {
    "proxy.txt".to_string()
}
fn default_work_dir() -> String {
    "data/images".to_string()
}
fn default_originals_per_cycle() -> usize {
    constants::ORIGINALS_PER_CYCLE
}
fn default_max_upload_retries() -> usize {
    constants::MAX_UPLOAD_RETRIES
}
fn default_max_consecutive_failures() -> u32 {
    constants::MAX_CONSECUTIVE_FAILURES
}
fn default_inter_cycle_delay_secs() -> u64 {
    constants::INTER_CYCLE_DELAY_SECS
}
fn default_cooldown_secs() -> u64 {
    constants::COOLDOWN_SECS
}
fn default_true() -> bool {
    true
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            debug: default_debug(),
            base_url: default_base_url(),
            web_domain: default_web_domain(),
            chain_id: default_chain_id(),
            keys_path: default_keys_path(),
            proxies_path: default_proxies_path(),
            work_dir: default_work_dir(),
            originals_per_cycle: default_originals_per_cycle(),
            image_source_url: None,
            max_upload_retries: default_max_upload_retries(),
            max_consecutive_failures: default_max_consecutive_failures(),
            inter_cycle_delay_secs: default_inter_cycle_delay_secs(),
            cooldown_secs: default_cooldown_secs(),
            halt_fleet_on_fault: default_true(),
        }
    }
}

impl GlobalSettings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(selected) = path {
            builder = builder.add_source(File::from(Path::new(selected)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Deterministic precedence: CLI (in main) > env/.env > config file.
        builder = builder.add_source(Environment::default());

        let settings: GlobalSettings = builder.build()?.try_deserialize()?;

        if settings.originals_per_cycle == 0 {
            return Err(AppError::Config(
                "originals_per_cycle must be at least 1".to_string(),
            ));
        }
        if settings.max_consecutive_failures == 0 {
            return Err(AppError::Config(
                "max_consecutive_failures must be at least 1".to_string(),
            ));
        }

        Ok(settings)
    }

    pub fn load() -> Result<Self, AppError> {
        Self::load_with_path(None)
    }
}

/// Read a newline-delimited list, skipping blank lines and `#` comments.
pub fn read_line_list(path: &str) -> Result<Vec<String>, AppError> {
    let body =
        fs::read_to_string(path).map_err(|e| AppError::Config(format!("cannot read {path}: {e}")))?;
    Ok(body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect())
}

/// The proxy list is optional: a missing file means direct connections.
pub fn load_proxies(path: &str) -> Vec<String> {
    if !Path::new(path).exists() {
        tracing::info!(target: "config", path, "No proxy file found, running in direct mode");
        return Vec::new();
    }
    match read_line_list(path) {
        Ok(proxies) => {
            tracing::info!(target: "config", count = proxies.len(), "Loaded proxies");
            proxies
        }
        Err(e) => {
            tracing::warn!(target: "config", error = %e, "Failed to read proxy file, running in direct mode");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn line_list_skips_comments_and_blanks() {
        let mut tmp = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(tmp, "# header comment").unwrap();
        writeln!(tmp, "first").unwrap();
        writeln!(tmp).unwrap();
        writeln!(tmp, "  second  ").unwrap();
        writeln!(tmp, "#third").unwrap();

        let lines = read_line_list(tmp.path().to_str().expect("utf8 path")).expect("read list");
        assert_eq!(lines, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn missing_proxy_file_means_direct_mode() {
        let proxies = load_proxies("definitely-not-a-real-proxy-file.txt");
        assert!(proxies.is_empty());
    }

    #[test]
    fn defaults_mirror_domain_constants() {
        let settings = GlobalSettings::default();
        assert_eq!(settings.base_url, constants::API_BASE_URL);
        assert_eq!(settings.chain_id, constants::CHAIN_ID);
        assert_eq!(settings.originals_per_cycle, constants::ORIGINALS_PER_CYCLE);
        assert_eq!(settings.cooldown_secs, constants::COOLDOWN_SECS);
        assert!(settings.halt_fleet_on_fault);
    }
}
