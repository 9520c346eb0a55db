//! Async HTTP access to the hosting service that license metadata is read from.
//!
//! [`RepositoryClient`] is the seam the license provider talks to; [`github`]
//! holds the `reqwest` implementation. Failures are reported as [`ApiError`]
//! and classified as transient or not by the caller's retry loop.

pub mod github;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Transport(String),
    #[error("server error (HTTP {0})")]
    Server(u16),
    #[error("API rate limit reached")]
    RateLimited { reset: Option<DateTime<Utc>> },
    #[error("request rejected (HTTP {0})")]
    Client(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    /// Timeouts, connection failures, and 5xx responses are worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Transport(_) | Self::Server(_))
    }
}

/// The subset of `GET /repos/{owner}/{repo}` this tool reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepositoryMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub license: Option<RepositoryLicense>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepositoryLicense {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub spdx_id: Option<String>,
}

impl RepositoryMetadata {
    /// The license key, falling back to the SPDX id when no key is given.
    pub fn license_key(&self) -> Option<&str> {
        let license = self.license.as_ref()?;
        [license.key.as_deref(), license.spdx_id.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|k| !k.is_empty())
    }
}

#[async_trait]
pub trait RepositoryClient: Send + Sync {
    async fn get_repository(&self, owner: &str, repo: &str)
        -> Result<RepositoryMetadata, ApiError>;
}
