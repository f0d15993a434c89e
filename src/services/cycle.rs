// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 Singulabs bot contributors

use crate::app::config::GlobalSettings;
use crate::common::retry::retry_transient;
use crate::domain::constants;
use crate::domain::error::AppError;
use crate::infrastructure::network::api::PointsApi;
use crate::services::auth::Session;
use chrono::Utc;
use rand::Rng;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Outcome of one work unit, consumed immediately for logging and backoff
/// decisions.
#[derive(Debug, Clone)]
pub struct CycleResult {
    pub points_before: u64,
    pub points_after: u64,
    pub uploaded: usize,
}

impl CycleResult {
    pub fn earned(&self) -> i64 {
        self.points_after as i64 - self.points_before as i64
    }
}

enum PayloadKind {
    Original,
    Compare,
}

/// Performs one unit of work for a single wallet: clean up prior artifacts,
/// upload originals, submit one comparison, and report the points delta.
pub struct CycleExecutor<A: PointsApi> {
    api: Arc<A>,
    wallet_index: usize,
    work_dir: PathBuf,
    originals_per_cycle: usize,
    image_source_url: Option<String>,
    max_upload_retries: usize,
}

impl<A: PointsApi> CycleExecutor<A> {
    pub fn new(api: Arc<A>, wallet_index: usize, settings: &GlobalSettings) -> Self {
        Self {
            api,
            wallet_index,
            work_dir: PathBuf::from(&settings.work_dir),
            originals_per_cycle: settings.originals_per_cycle,
            image_source_url: settings.image_source_url.clone(),
            max_upload_retries: settings.max_upload_retries,
        }
    }

    /// Run one full cycle. Partial progress (some uploads done before a
    /// failure) is not rolled back.
    pub async fn run_cycle(&self, session: &Session) -> Result<CycleResult, AppError> {
        let token = session.token.as_str();

        let points_before = self.api.points(token).await?;
        tracing::info!(
            target: "cycle",
            wallet = self.wallet_index + 1,
            points = points_before,
            "Current points"
        );

        self.delete_server_images(token).await;
        self.cleanup_local_files();
        self.pause(2_000, 1_000).await;

        let mut uploaded = 0;
        for seq in 0..self.originals_per_cycle {
            let (filename, payload) = self.produce_payload(PayloadKind::Original, seq).await?;
            self.submit_with_retry(token, &filename, payload, true)
                .await?;
            uploaded += 1;
            tracing::info!(
                target: "cycle",
                wallet = self.wallet_index + 1,
                seq = seq + 1,
                total = self.originals_per_cycle,
                "Upload successful"
            );
            self.pause(1_000, 2_000).await;
        }

        let (filename, payload) = self.produce_payload(PayloadKind::Compare, 0).await?;
        self.submit_with_retry(token, &filename, payload, false)
            .await?;
        tracing::info!(target: "cycle", wallet = self.wallet_index + 1, "Compare successful");
        self.pause(1_000, 1_000).await;

        let points_after = self.api.points(token).await?;
        self.cleanup_local_files();

        Ok(CycleResult {
            points_before,
            points_after,
            uploaded,
        })
    }

    /// Best-effort deletion of this wallet's previously uploaded server-side
    /// images. Failures are logged and never fail the cycle.
    async fn delete_server_images(&self, token: &str) {
        let images = match self.api.list_images(token).await {
            Ok(images) => images,
            Err(e) => {
                tracing::warn!(
                    target: "cycle",
                    wallet = self.wallet_index + 1,
                    error = %e,
                    "Failed to list server images"
                );
                return;
            }
        };
        if images.is_empty() {
            return;
        }
        tracing::info!(
            target: "cycle",
            wallet = self.wallet_index + 1,
            count = images.len(),
            "Deleting previous server images"
        );
        for path in images {
            let image_id = path.rsplit('/').next().unwrap_or(path.as_str()).to_string();
            match self.api.delete_image(token, &image_id).await {
                Ok(()) => {
                    tracing::debug!(
                        target: "cycle",
                        wallet = self.wallet_index + 1,
                        image_id = %image_id,
                        "Deleted server image"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        target: "cycle",
                        wallet = self.wallet_index + 1,
                        image_id = %image_id,
                        error = %e,
                        "Failed to delete server image"
                    );
                }
            }
            sleep(Duration::from_millis(constants::SERVER_DELETE_PAUSE_MS)).await;
        }
    }

    /// Best-effort removal of this wallet's stale payload files from a prior
    /// cycle. Files are namespaced by wallet index, so siblings are untouched.
    fn cleanup_local_files(&self) {
        let prefixes = [
            format!("original_{}_", self.wallet_index),
            format!("compare_{}_", self.wallet_index),
        ];
        let entries = match fs::read_dir(&self.work_dir) {
            Ok(entries) => entries,
            Err(_) => return,
        };
        let mut deleted = 0usize;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.ends_with(".jpg")
                && prefixes.iter().any(|prefix| name.starts_with(prefix))
                && fs::remove_file(entry.path()).is_ok()
            {
                deleted += 1;
            }
        }
        if deleted > 0 {
            tracing::debug!(
                target: "cycle",
                wallet = self.wallet_index + 1,
                deleted,
                "Removed stale local payloads"
            );
        }
    }

    /// Produce one payload: downloaded from the configured image source when
    /// set, otherwise a placeholder buffer with randomized dimensions. A
    /// transient copy is staged on disk under the per-wallet naming scheme
    /// and removed again at cycle boundaries.
    async fn produce_payload(
        &self,
        kind: PayloadKind,
        seq: usize,
    ) -> Result<(String, Vec<u8>), AppError> {
        let timestamp = Utc::now().timestamp_millis();
        let filename = match kind {
            PayloadKind::Original => {
                format!("original_{}_{}_{}.jpg", self.wallet_index, timestamp, seq)
            }
            PayloadKind::Compare => format!("compare_{}_{}.jpg", self.wallet_index, timestamp),
        };

        let payload = match &self.image_source_url {
            Some(url) => self.api.fetch_external_image(url).await?,
            None => synthetic_payload(),
        };

        if let Err(e) = fs::write(self.work_dir.join(&filename), &payload) {
            tracing::warn!(
                target: "cycle",
                wallet = self.wallet_index + 1,
                filename = %filename,
                error = %e,
                "Failed to stage payload locally"
            );
        }

        Ok((filename, payload))
    }

    async fn submit_with_retry(
        &self,
        token: &str,
        filename: &str,
        payload: Vec<u8>,
        is_original: bool,
    ) -> Result<(), AppError> {
        let api = Arc::clone(&self.api);
        let token = token.to_string();
        let filename = filename.to_string();
        retry_transient(
            move |_| {
                let api = Arc::clone(&api);
                let token = token.clone();
                let filename = filename.clone();
                let payload = payload.clone();
                async move {
                    if is_original {
                        api.upload(&token, &filename, payload).await
                    } else {
                        api.compare(&token, &filename, payload).await
                    }
                }
            },
            self.max_upload_retries,
        )
        .await
    }

    async fn pause(&self, base_ms: u64, jitter_ms: u64) {
        let jitter = rand::thread_rng().gen_range(0..jitter_ms.max(1));
        sleep(Duration::from_millis(base_ms + jitter)).await;
    }
}

/// Placeholder image bytes sized like a small photo (600-800 x 400-600).
fn synthetic_payload() -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let width = rng.gen_range(600..800usize);
    let height = rng.gen_range(400..600usize);
    vec![0u8; width * height]
}
