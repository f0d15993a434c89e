// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 Singulabs bot contributors

use crate::app::config::read_line_list;
use crate::domain::error::AppError;
use alloy::primitives::Address;
use alloy::signers::SignerSync;
use alloy::signers::local::PrivateKeySigner;
use std::str::FromStr;

/// One wallet: a fleet index plus its signing key. Immutable after
/// construction and owned exclusively by its loop controller.
#[derive(Debug, Clone)]
pub struct Identity {
    index: usize,
    signer: PrivateKeySigner,
}

impl Identity {
    pub fn new(index: usize, key: &str) -> Result<Self, AppError> {
        let signer = PrivateKeySigner::from_str(key.trim()).map_err(|e| {
            AppError::Config(format!("invalid private key at position {}: {e}", index + 1))
        })?;
        Ok(Self { index, signer })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// One-based wallet number used in log lines.
    pub fn label(&self) -> usize {
        self.index + 1
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// EIP-191 personal-message signature, 0x-prefixed hex.
    pub fn sign_message(&self, message: &str) -> Result<String, AppError> {
        let sig = self
            .signer
            .sign_message_sync(message.as_bytes())
            .map_err(|e| AppError::Auth(format!("message signing failed: {e}")))?;
        Ok(format!("0x{}", hex::encode(sig.as_bytes())))
    }
}

/// Load every identity from the key file. An absent or empty file is fatal.
pub fn load_identities(path: &str) -> Result<Vec<Identity>, AppError> {
    let keys = read_line_list(path)?;
    if keys.is_empty() {
        return Err(AppError::Config(format!("no private keys found in {path}")));
    }
    let identities = keys
        .iter()
        .enumerate()
        .map(|(index, key)| Identity::new(index, key))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::info!(target: "config", count = identities.len(), "Loaded private keys");
    Ok(identities)
}
