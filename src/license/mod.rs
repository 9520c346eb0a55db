//! License resolution for individual imports.
//!
//! - [`spdx`]: the immutable [`LicenseTable`] of known license keys.
//! - [`github`]: [`GitHubProvider`](github::GitHubProvider), which reads the
//!   license key GitHub reports for a repository, with retries and rate-limit
//!   handling.
//!
//! [`Resolver`] fans a lookup out to the first provider that supports the
//! import and never fails: every problem degrades to the `na` sentinel.

pub mod github;
pub mod spdx;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::models::License;
use crate::registry::ApiError;
pub use spdx::LicenseTable;

#[derive(Debug, Error)]
pub enum LicenseError {
    #[error("cannot determine owner/repository from `{0}`")]
    UnparsableRepository(String),
    #[error("API rate limit exceeded for {owner}/{repo}{}", reset_suffix(.reset))]
    RateLimitExceeded {
        owner: String,
        repo: String,
        reset: Option<DateTime<Utc>>,
    },
    #[error("no license found for {owner}/{repo}")]
    NoLicenseFound { owner: String, repo: String },
    #[error("lookup of {owner}/{repo} failed: {source}")]
    Api {
        owner: String,
        repo: String,
        #[source]
        source: ApiError,
    },
    #[error("lookup of {owner}/{repo} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        owner: String,
        repo: String,
        attempts: u32,
        #[source]
        source: ApiError,
    },
    #[error("license lookup cancelled")]
    Cancelled,
}

fn reset_suffix(reset: &Option<DateTime<Utc>>) -> String {
    reset
        .map(|r| format!(" (resets at {})", r.format("%Y-%m-%d %H:%M:%S UTC")))
        .unwrap_or_default()
}

/// A source of license keys for imports.
#[async_trait]
pub trait LicenseProvider: Send + Sync {
    /// Whether this provider knows how to look `import_path` up.
    fn supports(&self, import_path: &str) -> bool;

    /// Return the license key (e.g. `mit`) for one import.
    async fn get_license(
        &self,
        cancel: &CancellationToken,
        import_path: &str,
        version: &str,
        branch: &str,
        url: &str,
    ) -> Result<String, LicenseError>;

    fn name(&self) -> &'static str;
}

/// Maps imports to [`License`]s through an ordered list of providers.
pub struct Resolver {
    providers: Vec<Box<dyn LicenseProvider>>,
    licenses: LicenseTable,
}

impl Resolver {
    pub fn new(providers: Vec<Box<dyn LicenseProvider>>, licenses: LicenseTable) -> Self {
        Self {
            providers,
            licenses,
        }
    }

    /// Resolve the license of one import.
    ///
    /// Only the first provider that supports `name` is asked. Cancellation,
    /// provider errors, and keys missing from the table all yield the
    /// unknown sentinel.
    pub async fn get_with_context(
        &self,
        cancel: &CancellationToken,
        name: &str,
        version: &str,
        branch: &str,
        url: &str,
    ) -> License {
        if cancel.is_cancelled() {
            return self.licenses.unknown();
        }

        let Some(provider) = self.providers.iter().find(|p| p.supports(name)) else {
            tracing::debug!("no license provider for {}", name);
            return self.licenses.unknown();
        };

        match provider.get_license(cancel, name, version, branch, url).await {
            Ok(key) => match self.licenses.get(&key) {
                Some(license) => license.clone(),
                None => {
                    tracing::warn!("{}: unrecognised license key `{}` from {}", name, key, provider.name());
                    self.licenses.unknown()
                }
            },
            Err(LicenseError::Cancelled) => self.licenses.unknown(),
            Err(e) => {
                tracing::warn!("{}: {}", name, e);
                self.licenses.unknown()
            }
        }
    }
}
