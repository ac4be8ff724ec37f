//! HTTP session client for the hsmoa schedule API.

use std::time::Duration;

use url::Url;

use crate::{types::Envelope, user_agent::get_user_agent, Error};

/// Production site origin.
pub const DEFAULT_BASE_URL: &str = "https://hsmoa.com";

/// HTTP client for the hsmoa schedule API.
///
/// Holds one `reqwest::Client` with a cookie store, so cookies set while
/// visiting the landing page ride along on the API call. Requests carry
/// browser-like headers and a single user agent for the whole session.
pub struct Client {
    /// Site origin. Defaults to `https://hsmoa.com`.
    base_url: String,
    user_agent: String,
    http: reqwest::Client,
}

impl Client {
    /// Creates a new client pointing at the production site.
    pub fn new() -> Result<Self, Error> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom origin. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        Self::with_user_agent(base_url, get_user_agent())
    }

    /// Creates a new client with an explicit user agent.
    pub fn with_user_agent(base_url: &str, user_agent: &str) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Visits the landing page so session cookies land in the cookie store.
    pub async fn bootstrap(&self) -> Result<(), Error> {
        let resp = self
            .http
            .get(format!("{}/", self.base_url))
            .header("accept", "text/html,application/xhtml+xml")
            .header("accept-language", "ko-KR,ko;q=0.9")
            .header("upgrade-insecure-requests", "1")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Failed to load landing page: {}", e);
                Error::RequestFailed
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: String::new(),
            });
        }
        Ok(())
    }

    /// Fetches the encrypted envelope from `url`.
    pub async fn get_envelope(&self, url: &Url) -> Result<Envelope, Error> {
        let resp = self
            .http
            .get(url.clone())
            .header("accept", "application/json, text/plain, */*")
            .header("accept-language", "ko-KR,ko;q=0.9")
            .header("referer", format!("{}/", self.base_url))
            .header("sec-fetch-dest", "empty")
            .header("sec-fetch-mode", "cors")
            .header("sec-fetch-site", "same-origin")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to get resource: {}", e);
                Error::RequestFailed
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        Envelope::from_json(&body).map_err(|e| {
            tracing::error!("Unusable envelope: {} | body: {}", e, truncate_body(&body));
            e
        })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        None => body.to_string(),
        Some((idx, _)) => format!("{}...[truncated]", &body[..idx]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_bodies() {
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "편".repeat(300);
        let out = truncate_body(&body);
        assert!(out.ends_with("...[truncated]"));
        assert_eq!(out.chars().filter(|c| *c == '편').count(), 200);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = Client::with_base_url("http://localhost:1234/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:1234");
    }
}
