// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 Singulabs bot contributors

use crate::domain::constants;
use crate::domain::error::AppError;
use crate::infrastructure::network::api::PointsApi;
use crate::services::identity::Identity;
use chrono::{DateTime, SecondsFormat, Utc};

/// Bearer token for one wallet. Cleared on 401 or extended cooldown, never
/// shared across identities.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
}

/// The deterministic sign-in-with-Ethereum challenge, byte for byte what the
/// service's web front end produces.
pub fn signin_message(
    web_domain: &str,
    address: &str,
    chain_id: u64,
    nonce: &str,
    issued_at: DateTime<Utc>,
) -> String {
    format!(
        "{web_domain} wants you to sign in with your Ethereum account:\n\
         {address}\n\
         \n\
         Sign in with Ethereum to the app.\n\
         \n\
         URI: https://{web_domain}\n\
         Version: {version}\n\
         Chain ID: {chain_id}\n\
         Nonce: {nonce}\n\
         Issued At: {issued}",
        version = constants::SIGNIN_VERSION,
        issued = issued_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    )
}

/// Nonce -> signed challenge -> bearer token. Returns a fresh Session for the
/// caller to store; mutates nothing.
pub async fn authenticate<A: PointsApi>(
    identity: &Identity,
    api: &A,
    web_domain: &str,
    chain_id: u64,
) -> Result<Session, AppError> {
    tracing::info!(target: "auth", wallet = identity.label(), "Starting login");

    let nonce = api.nonce().await?;
    let message = signin_message(
        web_domain,
        &identity.address().to_string(),
        chain_id,
        &nonce,
        Utc::now(),
    );
    let signature = identity.sign_message(&message)?;
    let token = api.verify(&message, &signature).await?;

    tracing::info!(target: "auth", wallet = identity.label(), "Login successful");
    Ok(Session { token })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn challenge_matches_front_end_format() {
        let issued = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let message = signin_message(
            "tools.singulabs.xyz",
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf",
            1516,
            "abc123",
            issued,
        );

        let mut lines = message.lines();
        assert_eq!(
            lines.next(),
            Some("tools.singulabs.xyz wants you to sign in with your Ethereum account:")
        );
        assert_eq!(
            lines.next(),
            Some("0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf")
        );
        assert!(message.contains("URI: https://tools.singulabs.xyz"));
        assert!(message.contains("Version: 1"));
        assert!(message.contains("Chain ID: 1516"));
        assert!(message.contains("Nonce: abc123"));
        assert!(message.contains("Issued At: 2026-03-14T09:26:53.000Z"));
    }
}
