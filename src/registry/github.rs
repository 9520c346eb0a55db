use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::{HeaderMap, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};

use super::{ApiError, RepositoryClient, RepositoryMetadata};

const AGENT: &str = concat!("lic/", env!("CARGO_PKG_VERSION"), " (license compliance tool)");

/// `reqwest`-backed client for the GitHub REST API.
pub struct GitHubClient {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(client: Client, api_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }
}

#[async_trait]
impl RepositoryClient for GitHubClient {
    async fn get_repository(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<RepositoryMetadata, ApiError> {
        let url = format!("{}/repos/{}/{}", self.api_url, owner, repo);
        tracing::debug!("GET {}", url);

        let mut request = self
            .client
            .get(&url)
            .header(USER_AGENT, AGENT)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if let Some(err) = rate_limit_error(status, response.headers(), Utc::now()) {
            return Err(err);
        }
        if status.is_server_error() {
            return Err(ApiError::Server(status.as_u16()));
        }
        if !status.is_success() {
            return Err(ApiError::Client(status.as_u16()));
        }

        response
            .json::<RepositoryMetadata>()
            .await
            .map_err(|e| ApiError::Malformed(e.to_string()))
    }
}

fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Transport(e.to_string())
    }
}

/// Detect a rate-limit response and work out when the limit resets.
///
/// 429 is always a rate limit. 403 is one only when the primary quota is
/// spent (`x-ratelimit-remaining: 0`) or a `retry-after` is given.
fn rate_limit_error(status: StatusCode, headers: &HeaderMap, now: DateTime<Utc>) -> Option<ApiError> {
    let remaining = header_u64(headers, "x-ratelimit-remaining");
    let retry_after = header_u64(headers, "retry-after");

    let limited = status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && (remaining == Some(0) || retry_after.is_some()));
    if !limited {
        return None;
    }

    let reset = match retry_after {
        Some(secs) => i64::try_from(secs)
            .ok()
            .and_then(chrono::TimeDelta::try_seconds)
            .map(|d| now + d),
        None => header_u64(headers, "x-ratelimit-reset")
            .and_then(|epoch| i64::try_from(epoch).ok())
            .and_then(|epoch| Utc.timestamp_opt(epoch, 0).single()),
    };
    Some(ApiError::RateLimited { reset })
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}
