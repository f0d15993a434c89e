// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 Singulabs bot contributors

use crate::app::config::GlobalSettings;
use crate::domain::constants;
use crate::domain::error::AppError;
use crate::infrastructure::network::api::PointsApi;
use crate::services::auth::{Session, authenticate};
use crate::services::cycle::CycleExecutor;
use crate::services::identity::Identity;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Where the controller resumes after the current transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    NeedsAuth,
    Authenticated,
    CoolingDown,
}

/// Failure-handling knobs, split from GlobalSettings so the state machine can
/// be exercised directly in tests.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub web_domain: String,
    pub chain_id: u64,
    pub inter_cycle_delay: Duration,
    pub cooldown: Duration,
    pub max_consecutive_failures: u32,
}

impl LoopSettings {
    pub fn from_global(settings: &GlobalSettings) -> Self {
        Self {
            web_domain: settings.web_domain.clone(),
            chain_id: settings.chain_id,
            inter_cycle_delay: Duration::from_secs(settings.inter_cycle_delay_secs),
            cooldown: Duration::from_secs(settings.cooldown_secs),
            max_consecutive_failures: settings.max_consecutive_failures,
        }
    }
}

/// Backoff before retrying after the n-th consecutive cycle-level failure:
/// `min(base * 2^(n-1), cap)`.
pub fn cycle_backoff(consecutive_failures: u32) -> Duration {
    let exp = consecutive_failures.saturating_sub(1).min(6);
    let secs = constants::CYCLE_BACKOFF_BASE_SECS << exp;
    Duration::from_secs(secs.min(constants::CYCLE_BACKOFF_CAP_SECS))
}

/// Drives auth and work cycles for one wallet forever. Holds nothing beyond
/// the optional session and the failure streak; never runs two cycles
/// concurrently for the same identity.
pub struct LoopController<A: PointsApi> {
    identity: Identity,
    api: Arc<A>,
    executor: CycleExecutor<A>,
    settings: LoopSettings,
    session: Option<Session>,
    consecutive_failures: u32,
}

impl<A: PointsApi> LoopController<A> {
    pub fn new(
        identity: Identity,
        api: Arc<A>,
        executor: CycleExecutor<A>,
        settings: LoopSettings,
    ) -> Self {
        Self {
            identity,
            api,
            executor,
            settings,
            session: None,
            consecutive_failures: 0,
        }
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Run indefinitely. There is no terminal state; the loop ends only with
    /// the process.
    pub async fn run(mut self) -> Result<(), AppError> {
        let mut phase = LoopPhase::NeedsAuth;
        loop {
            phase = self.step(phase).await;
        }
    }

    /// Perform exactly one state transition, including the wait it mandates.
    pub async fn step(&mut self, phase: LoopPhase) -> LoopPhase {
        match phase {
            LoopPhase::NeedsAuth => match self.try_authenticate().await {
                Ok(()) => LoopPhase::Authenticated,
                Err(e) => self.register_failure(LoopPhase::NeedsAuth, &e).await,
            },
            LoopPhase::Authenticated => match self.run_one_cycle().await {
                Ok(()) => {
                    self.consecutive_failures = 0;
                    tracing::info!(
                        target: "loop",
                        wallet = self.identity.label(),
                        delay_secs = self.settings.inter_cycle_delay.as_secs(),
                        "Cycle complete, waiting before next cycle"
                    );
                    sleep(self.settings.inter_cycle_delay).await;
                    LoopPhase::Authenticated
                }
                Err(e) => self.register_failure(LoopPhase::Authenticated, &e).await,
            },
            LoopPhase::CoolingDown => {
                tracing::warn!(
                    target: "loop",
                    wallet = self.identity.label(),
                    cooldown_secs = self.settings.cooldown.as_secs(),
                    "Extended cooldown before re-login"
                );
                sleep(self.settings.cooldown).await;
                LoopPhase::NeedsAuth
            }
        }
    }

    async fn try_authenticate(&mut self) -> Result<(), AppError> {
        let session = authenticate(
            &self.identity,
            self.api.as_ref(),
            &self.settings.web_domain,
            self.settings.chain_id,
        )
        .await?;
        self.session = Some(session);
        Ok(())
    }

    async fn run_one_cycle(&mut self) -> Result<(), AppError> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| AppError::Auth("no active session".to_string()))?;
        tracing::info!(
            target: "loop",
            wallet = self.identity.label(),
            address = %self.identity.address(),
            "=== Starting new cycle ==="
        );
        let result = self.executor.run_cycle(session).await?;
        tracing::info!(
            target: "loop",
            wallet = self.identity.label(),
            points = result.points_after,
            earned = result.earned(),
            uploaded = result.uploaded,
            "Cycle finished"
        );
        Ok(())
    }

    /// Shared failure path for both phases: bump the streak, then either
    /// escalate to the extended cooldown or apply the ordinary backoff and
    /// retry the phase that failed.
    async fn register_failure(&mut self, failed_phase: LoopPhase, err: &AppError) -> LoopPhase {
        self.consecutive_failures += 1;

        // A 401 invalidates the token whatever the streak looks like.
        if matches!(err, AppError::AuthExpired) {
            tracing::warn!(
                target: "loop",
                wallet = self.identity.label(),
                "Auth token expired, will re-login"
            );
            self.session = None;
        }

        if self.consecutive_failures >= self.settings.max_consecutive_failures {
            tracing::error!(
                target: "loop",
                wallet = self.identity.label(),
                failures = self.consecutive_failures,
                error = %err,
                "Too many consecutive errors, forcing re-login and extended cooldown"
            );
            self.session = None;
            self.consecutive_failures = 0;
            return LoopPhase::CoolingDown;
        }

        let backoff = cycle_backoff(self.consecutive_failures);
        tracing::warn!(
            target: "loop",
            wallet = self.identity.label(),
            failures = self.consecutive_failures,
            error = %err,
            backoff_secs = backoff.as_secs(),
            "Cycle failed, backing off"
        );
        sleep(backoff).await;

        if self.session.is_none() {
            LoopPhase::NeedsAuth
        } else {
            failed_phase
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(cycle_backoff(1), Duration::from_secs(60));
        assert_eq!(cycle_backoff(2), Duration::from_secs(120));
        assert_eq!(cycle_backoff(3), Duration::from_secs(240));
        assert_eq!(cycle_backoff(4), Duration::from_secs(300));
        assert_eq!(cycle_backoff(10), Duration::from_secs(300));
    }
}
