//! Thin wrapper over the GitHub REST API.
//!
//! Only responsible for HTTP communication — no filtering or mapping here.
//! Rate limiting is surfaced as `Error::RateLimited` rather than swallowed,
//! so the caller (the stage worker) owns the revert-and-wait policy.

use chrono::{DateTime, Utc};
use harvestline_core::error::{Error, Result};
use serde::Deserialize;

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "harvestline-ingest";

pub struct GithubClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchPage {
    pub total_count: i64,
    #[serde(rename = "items")]
    pub repos: Vec<SearchRepoItem>,
}

/// A single item from `GET /search/repositories`, field names matching the
/// GitHub API response verbatim so `#[serde(rename)]` stays unnecessary.
#[derive(Debug, Deserialize)]
pub struct SearchRepoItem {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub owner: RepoOwner,
    pub html_url: String,
    pub description: Option<String>,
    pub topics: Vec<String>,
    pub language: Option<String>,
    pub stargazers_count: i64,
    pub forks_count: i64,
    pub size: i64,
    pub fork: bool,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub pushed_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RepoOwner {
    pub login: String,
}

impl GithubClient {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::new_with_base_url(token, API_BASE)
    }

    /// Same as [`Self::new`] but against an arbitrary base URL, so tests can
    /// point the client at a local mock server instead of api.github.com.
    pub fn new_with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::http(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            token: token.into(),
            base_url: base_url.into(),
        })
    }

    /// Calls the search API once, sorted by stars descending.
    pub async fn search_repositories(&self, query: &str, page: u32) -> Result<SearchPage> {
        let base_url = &self.base_url;
        let response = self
            .http
            .get(format!("{base_url}/search/repositories"))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .query(&[
                ("q", query),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", "50"),
                ("page", &page.to_string()),
            ])
            .send()
            .await
            .map_err(Error::from)?;

        self.check_rate_limit(response.status(), response.headers())?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::http(format!(
                "search request failed ({status}): {body}"
            )));
        }

        response
            .json::<SearchPage>()
            .await
            .map_err(|e| Error::http(format!("failed to decode search response: {e}")))
    }

    /// Fetches a repository's README as raw text, `None` if it has none.
    pub async fn get_readme(&self, full_name: &str) -> Result<Option<String>> {
        let base_url = &self.base_url;
        let response = self
            .http
            .get(format!("{base_url}/repos/{full_name}/readme"))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github.raw+json")
            .send()
            .await
            .map_err(Error::from)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        self.check_rate_limit(response.status(), response.headers())?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::http(format!(
                "readme request for {full_name} failed ({status}): {body}"
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::http(format!("failed to read readme body: {e}")))?;

        Ok(Some(text))
    }

    /// Translates a 403/429 with an exhausted rate limit into
    /// `Error::RateLimited`, reading `x-ratelimit-reset` the same way the
    /// original reads `error.headers["x-ratelimit-reset"]`.
    fn check_rate_limit(&self, status: reqwest::StatusCode, headers: &reqwest::header::HeaderMap) -> Result<()> {
        let is_rate_limit_status =
            status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::TOO_MANY_REQUESTS;

        if !is_rate_limit_status {
            return Ok(());
        }

        let remaining: Option<u32> = headers
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        if remaining != Some(0) {
            // A 403 that isn't actually a rate limit (e.g. blocked token)
            // is left for the generic status check to turn into Error::Http.
            return Ok(());
        }

        let reset_at: i64 = headers
            .get("x-ratelimit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        Err(Error::RateLimited { reset_at })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};

    fn client() -> GithubClient {
        GithubClient::new("test-token").expect("client should build")
    }

    fn headers(remaining: Option<&str>, reset: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(remaining) = remaining {
            headers.insert("x-ratelimit-remaining", HeaderValue::from_str(remaining).unwrap());
        }
        if let Some(reset) = reset {
            headers.insert("x-ratelimit-reset", HeaderValue::from_str(reset).unwrap());
        }
        headers
    }

    #[test]
    fn non_rate_limit_status_is_ignored() {
        let client = client();
        let result = client.check_rate_limit(reqwest::StatusCode::OK, &headers(Some("0"), Some("100")));
        assert!(result.is_ok());
    }

    #[test]
    fn forbidden_with_exhausted_remaining_is_rate_limited() {
        let client = client();
        let result = client.check_rate_limit(
            reqwest::StatusCode::FORBIDDEN,
            &headers(Some("0"), Some("1700000000")),
        );
        match result {
            Err(Error::RateLimited { reset_at }) => assert_eq!(reset_at, 1_700_000_000),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn too_many_requests_with_exhausted_remaining_is_rate_limited() {
        let client = client();
        let result = client.check_rate_limit(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            &headers(Some("0"), Some("42")),
        );
        assert!(matches!(result, Err(Error::RateLimited { reset_at: 42 })));
    }

    #[test]
    fn forbidden_with_remaining_quota_is_not_rate_limited() {
        // A blocked token or abuse-detection 403 still has quota left; that's
        // left for the generic status check to surface, not rate-limit retry.
        let client = client();
        let result = client.check_rate_limit(reqwest::StatusCode::FORBIDDEN, &headers(Some("10"), None));
        assert!(result.is_ok());
    }

    #[test]
    fn forbidden_with_missing_remaining_header_is_not_rate_limited() {
        let client = client();
        let result = client.check_rate_limit(reqwest::StatusCode::FORBIDDEN, &headers(None, None));
        assert!(result.is_ok());
    }

    #[test]
    fn missing_reset_header_defaults_to_zero() {
        let client = client();
        let result = client.check_rate_limit(reqwest::StatusCode::FORBIDDEN, &headers(Some("0"), None));
        assert!(matches!(result, Err(Error::RateLimited { reset_at: 0 })));
    }
}
