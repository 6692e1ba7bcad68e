use serde::Deserialize;

use crate::config::AuthConfig;
use crate::error::Error;

/// Token response from the provider's token endpoint.
///
/// `access_token` is optional here so that a 2xx answer without one is reported as
/// [`Error::TokenExchangeFailed`] rather than a decoding error.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Performs the authorization-code-for-token exchange.
#[derive(Debug, Clone, Default)]
pub struct TokenClient {
    http: reqwest::Client,
}

impl TokenClient {
    /// Client with a default `reqwest::Client`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Exchange an authorization code for tokens using PKCE.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TokenExchangeFailed`] on transport failure or timeout, a non-2xx
    /// status, an undecodable body, or a body without `access_token`.
    pub async fn exchange_code(
        &self,
        config: &AuthConfig,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, Error> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", config.client_id.as_str()),
            ("code", code),
            ("code_verifier", code_verifier),
            ("redirect_uri", config.redirect_uri.as_str()),
        ];

        let response = self
            .http
            .post(config.token_endpoint())
            .timeout(config.exchange_timeout)
            .form(&params)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let token = response.json::<TokenResponse>().await?;
        match token.access_token.as_deref() {
            Some(t) if !t.is_empty() => Ok(token),
            _ => Err(Error::exchange("no access_token")),
        }
    }

    /// Checks HTTP response status; returns the response on success or an error with details.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(Error::TokenExchangeFailed {
            status: Some(status),
            detail: body,
        })
    }
}
