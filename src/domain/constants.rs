// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 Singulabs bot contributors

// =============================================================================
// REMOTE SERVICE
// =============================================================================

pub const API_BASE_URL: &str = "https://tools-api.singulabs.xyz";
pub const WEB_DOMAIN: &str = "tools.singulabs.xyz";

/// Story Odyssey testnet, the chain the service's sign-in flow expects.
pub const CHAIN_ID: u64 = 1516;
pub const SIGNIN_VERSION: &str = "1";

/// User-agent matching the service's own web front end.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36";

// =============================================================================
// SUB-CALL RETRY POLICY
// =============================================================================

pub const MAX_UPLOAD_RETRIES: usize = 5;
pub const RATE_LIMIT_BASE_DELAY_MS: u64 = 2_000;
pub const SERVER_ERROR_BASE_DELAY_MS: u64 = 5_000;
pub const RETRY_JITTER_MS: u64 = 2_000;

// =============================================================================
// LOOP CONTROLLER
// =============================================================================

pub const CYCLE_BACKOFF_BASE_SECS: u64 = 60;
pub const CYCLE_BACKOFF_CAP_SECS: u64 = 300;
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;
pub const COOLDOWN_SECS: u64 = 300;
pub const INTER_CYCLE_DELAY_SECS: u64 = 60;

// =============================================================================
// CYCLE SHAPE
// =============================================================================

pub const ORIGINALS_PER_CYCLE: usize = 4;
pub const SERVER_DELETE_PAUSE_MS: u64 = 500;
