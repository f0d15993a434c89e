// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 Singulabs bot contributors

use crate::app::config::GlobalSettings;
use crate::domain::error::AppError;
use crate::infrastructure::network::api::HttpPointsApi;
use crate::infrastructure::network::transport::build_client;
use crate::services::controller::{LoopController, LoopSettings};
use crate::services::cycle::CycleExecutor;
use crate::services::identity::Identity;
use futures::future::{join_all, try_join_all};
use std::sync::Arc;

/// Static proxy sharding: wallet `i` always gets `proxies[i mod len]`.
pub fn assigned_proxy(proxies: &[String], index: usize) -> Option<&str> {
    if proxies.is_empty() {
        None
    } else {
        Some(proxies[index % proxies.len()].as_str())
    }
}

/// Builds one loop controller per identity and runs them concurrently. Tasks
/// share nothing mutable; the proxy list is read-only and sharded by index.
pub struct Fleet {
    settings: GlobalSettings,
    identities: Vec<Identity>,
    proxies: Vec<String>,
}

impl Fleet {
    pub fn new(settings: GlobalSettings, identities: Vec<Identity>, proxies: Vec<String>) -> Self {
        Self {
            settings,
            identities,
            proxies,
        }
    }

    pub async fn run(self) -> Result<(), AppError> {
        std::fs::create_dir_all(&self.settings.work_dir).map_err(|e| {
            AppError::Io(format!(
                "cannot create work dir {}: {e}",
                self.settings.work_dir
            ))
        })?;

        let loop_settings = LoopSettings::from_global(&self.settings);
        let mut tasks = Vec::with_capacity(self.identities.len());

        for identity in self.identities {
            let proxy = assigned_proxy(&self.proxies, identity.index());
            tracing::info!(
                target: "fleet",
                wallet = identity.label(),
                address = %identity.address(),
                proxy = proxy.unwrap_or("direct"),
                "Starting wallet loop"
            );

            let client = build_client(proxy)?;
            let api = Arc::new(HttpPointsApi::new(
                client,
                &self.settings.base_url,
                &self.settings.web_domain,
            ));
            let executor = CycleExecutor::new(Arc::clone(&api), identity.index(), &self.settings);
            let controller = LoopController::new(identity, api, executor, loop_settings.clone());
            tasks.push(tokio::spawn(controller.run()));
        }

        if self.settings.halt_fleet_on_fault {
            // One faulted wallet stops the fleet with a fatal exit.
            let results = try_join_all(tasks)
                .await
                .map_err(|e| AppError::Task(format!("wallet task join failed: {e}")))?;
            for res in results {
                res?;
            }
        } else {
            // Isolate faults: log them and let the other wallets keep going.
            for res in join_all(tasks).await {
                match res {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::error!(target: "fleet", error = %e, "Wallet loop ended with error")
                    }
                    Err(e) => {
                        tracing::error!(target: "fleet", error = %e, "Wallet task panicked")
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_sharding_is_stable_modulo_pool_size() {
        let proxies = vec![
            "http://a:8080".to_string(),
            "http://b:8080".to_string(),
            "http://c:8080".to_string(),
        ];
        assert_eq!(assigned_proxy(&proxies, 0), Some("http://a:8080"));
        assert_eq!(assigned_proxy(&proxies, 1), Some("http://b:8080"));
        assert_eq!(assigned_proxy(&proxies, 2), Some("http://c:8080"));
        assert_eq!(assigned_proxy(&proxies, 3), Some("http://a:8080"));
        assert_eq!(assigned_proxy(&proxies, 7), Some("http://b:8080"));
        // Deterministic: same index, same proxy, every time.
        assert_eq!(assigned_proxy(&proxies, 7), assigned_proxy(&proxies, 7));
    }

    #[test]
    fn empty_pool_means_direct_connections() {
        assert_eq!(assigned_proxy(&[], 0), None);
        assert_eq!(assigned_proxy(&[], 5), None);
    }
}
