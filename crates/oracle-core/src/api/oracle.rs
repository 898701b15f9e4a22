use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::Client;
use anyhow::{Result, anyhow};

use super::{AskPayload, AskTransport, HttpReply};
use crate::csrf::{self, CSRF_COOKIE};
use crate::error::TransportError;

const CSRF_HEADER: &str = "X-CSRFToken";
const FORCE_FALLBACK_HEADER: &str = "X-Force-Fallback";

/// Client for the Otaku Oracle backend
#[derive(Clone)]
pub struct OracleClient {
    client: Client,
    base_url: String,
    csrf_token: Option<String>,
}

impl OracleClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            csrf_token: None,
        }
    }

    /// Swap in a preconfigured HTTP client (timeouts, proxies)
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_csrf_token(mut self, token: Option<String>) -> Self {
        self.csrf_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    fn ask_url(&self) -> String {
        format!("{}/api/ask/", self.base_url)
    }

    /// Load the landing page and pick the CSRF token out of its cookies
    pub async fn fetch_csrf_token(&self) -> Result<String> {
        let url = format!("{}/", self.base_url);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("Failed to load {}: {}", url, response.status()));
        }

        let cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok());

        csrf::token_from_set_cookie(cookies, CSRF_COOKIE)
            .ok_or_else(|| anyhow!("Backend did not set a {} cookie", CSRF_COOKIE))
    }

    /// Fetch a token when none is configured yet
    pub async fn ensure_csrf_token(&mut self) -> Result<()> {
        if self.csrf_token.is_none() {
            let token = self.fetch_csrf_token().await?;
            tracing::debug!("obtained csrf token from {}", self.base_url);
            self.csrf_token = Some(token);
        }
        Ok(())
    }
}

#[async_trait]
impl AskTransport for OracleClient {
    async fn post_ask(&self, payload: &AskPayload) -> Result<HttpReply, TransportError> {
        let mut request = self
            .client
            .post(self.ask_url())
            .header(CONTENT_TYPE, "application/json")
            .json(payload);

        if let Some(token) = &self.csrf_token {
            request = request
                .header(CSRF_HEADER, token)
                .header(COOKIE, format!("{}={}", CSRF_COOKIE, token));
        }

        if payload.forces_fallback() {
            request = request.header(FORCE_FALLBACK_HEADER, "1");
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = OracleClient::new("http://localhost:8000/");
        assert_eq!(client.ask_url(), "http://localhost:8000/api/ask/");
    }

    #[test]
    fn test_empty_token_ignored() {
        let client = OracleClient::new("http://localhost:8000").with_csrf_token(Some(String::new()));
        assert!(client.csrf_token().is_none());
    }
}
