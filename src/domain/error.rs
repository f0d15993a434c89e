// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 Singulabs bot contributors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Filesystem error: {0}")]
    Io(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Bearer token rejected (401), re-login required")]
    AuthExpired,

    #[error("Rate limited (429)")]
    RateLimited,

    #[error("Server error ({status})")]
    Server { status: u16 },

    #[error("{endpoint} rejected the request ({status})")]
    Client { endpoint: String, status: u16 },

    #[error("Task failure: {0}")]
    Task(String),

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    /// Map a non-success HTTP status onto the error taxonomy.
    pub fn from_status(endpoint: &str, status: u16) -> Self {
        match status {
            401 => AppError::AuthExpired,
            429 => AppError::RateLimited,
            500..=599 => AppError::Server { status },
            _ => AppError::Client {
                endpoint: endpoint.to_string(),
                status,
            },
        }
    }

    /// Transient errors are retried at the sub-call level; everything else
    /// surfaces to the loop controller.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::RateLimited | AppError::Server { .. })
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Connection(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_matches_taxonomy() {
        assert!(matches!(
            AppError::from_status("/api/points", 401),
            AppError::AuthExpired
        ));
        assert!(matches!(
            AppError::from_status("/api/upload", 429),
            AppError::RateLimited
        ));
        assert!(matches!(
            AppError::from_status("/api/upload", 503),
            AppError::Server { status: 503 }
        ));
        assert!(matches!(
            AppError::from_status("/api/upload", 400),
            AppError::Client { status: 400, .. }
        ));
    }

    #[test]
    fn only_rate_limits_and_server_errors_are_transient() {
        assert!(AppError::RateLimited.is_transient());
        assert!(AppError::Server { status: 500 }.is_transient());
        assert!(!AppError::AuthExpired.is_transient());
        assert!(
            !AppError::Client {
                endpoint: "/api/upload".into(),
                status: 400
            }
            .is_transient()
        );
        assert!(!AppError::Auth("no token".into()).is_transient());
    }
}
