use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::{LicenseError, LicenseProvider};
use crate::config::GitHubConfig;
use crate::registry::{ApiError, RepositoryClient};

const HOST: &str = "github.com";

/// Bounds for the request/retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub request_timeout: Duration,
    /// Upper bound on the total time spent waiting for rate limits to reset.
    pub max_rate_limit_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            request_timeout: Duration::from_secs(10),
            max_rate_limit_wait: Duration::from_secs(10 * 60),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &GitHubConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            request_timeout: config.request_timeout(),
            ..Self::default()
        }
    }

    /// `min(base_delay * 2^attempt, max_delay)`
    pub fn backoff(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

/// Reads the license key GitHub reports for `github.com/<owner>/<repo>` imports.
pub struct GitHubProvider {
    client: Box<dyn RepositoryClient>,
    policy: RetryPolicy,
}

impl GitHubProvider {
    pub fn new(client: Box<dyn RepositoryClient>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    async fn fetch_license_key(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
    ) -> Result<String, LicenseError> {
        let mut attempt: u32 = 0;
        let mut rate_limit_sleeps: u32 = 0;
        let mut rate_limit_waited = Duration::ZERO;

        loop {
            if cancel.is_cancelled() {
                return Err(LicenseError::Cancelled);
            }

            let outcome = tokio::time::timeout(
                self.policy.request_timeout,
                self.client.get_repository(owner, repo),
            )
            .await
            .unwrap_or(Err(ApiError::Timeout));

            let err = match outcome {
                Ok(meta) => {
                    tracing::debug!(
                        "{}/{} resolved as {}",
                        owner,
                        repo,
                        meta.full_name.as_deref().unwrap_or("<unnamed>")
                    );
                    return meta.license_key().map(str::to_string).ok_or_else(|| {
                        LicenseError::NoLicenseFound {
                            owner: owner.to_string(),
                            repo: repo.to_string(),
                        }
                    })
                }
                Err(e) => e,
            };

            match err {
                ApiError::RateLimited { reset } => {
                    // a reset that already passed means retry now
                    let wait = reset.map(|r| (r - Utc::now()).to_std().unwrap_or(Duration::ZERO));
                    let budget = self.policy.max_rate_limit_wait.saturating_sub(rate_limit_waited);
                    match wait {
                        Some(wait) if rate_limit_sleeps <= self.policy.max_retries && wait <= budget => {
                            tracing::info!(
                                "rate limited on {}/{}, waiting {}s for reset",
                                owner,
                                repo,
                                wait.as_secs()
                            );
                            sleep_unless_cancelled(cancel, wait).await?;
                            rate_limit_sleeps += 1;
                            rate_limit_waited += wait;
                        }
                        _ => {
                            return Err(LicenseError::RateLimitExceeded {
                                owner: owner.to_string(),
                                repo: repo.to_string(),
                                reset,
                            })
                        }
                    }
                }
                e if e.is_transient() => {
                    if attempt >= self.policy.max_retries {
                        return Err(LicenseError::RetriesExhausted {
                            owner: owner.to_string(),
                            repo: repo.to_string(),
                            attempts: attempt + 1,
                            source: e,
                        });
                    }
                    let delay = self.policy.backoff(attempt);
                    tracing::warn!(
                        "{}/{}: {} (attempt {}/{}), retrying in {}ms",
                        owner,
                        repo,
                        e,
                        attempt + 1,
                        self.policy.max_retries + 1,
                        delay.as_millis()
                    );
                    sleep_unless_cancelled(cancel, delay).await?;
                    attempt += 1;
                }
                e => {
                    return Err(LicenseError::Api {
                        owner: owner.to_string(),
                        repo: repo.to_string(),
                        source: e,
                    })
                }
            }
        }
    }
}

#[async_trait]
impl LicenseProvider for GitHubProvider {
    fn supports(&self, import_path: &str) -> bool {
        import_path
            .strip_prefix(HOST)
            .is_some_and(|rest| rest.starts_with('/'))
    }

    async fn get_license(
        &self,
        cancel: &CancellationToken,
        import_path: &str,
        _version: &str,
        _branch: &str,
        _url: &str,
    ) -> Result<String, LicenseError> {
        let (owner, repo) = parse_repo_owner(import_path)?;
        self.fetch_license_key(cancel, owner, repo).await
    }

    fn name(&self) -> &'static str {
        "GitHub"
    }
}

/// Split `github.com/<owner>/<repo>[/subpackage...]` into owner and repo.
pub fn parse_repo_owner(import_path: &str) -> Result<(&str, &str), LicenseError> {
    let unparsable = || LicenseError::UnparsableRepository(import_path.to_string());

    let mut parts = import_path.split('/');
    if parts.next() != Some(HOST) {
        return Err(unparsable());
    }
    match (parts.next(), parts.next()) {
        (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => Ok((owner, repo)),
        _ => Err(unparsable()),
    }
}

async fn sleep_unless_cancelled(
    cancel: &CancellationToken,
    duration: Duration,
) -> Result<(), LicenseError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(LicenseError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}
