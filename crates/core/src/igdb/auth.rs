use std::fmt;

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::error::IgdbError;

/// Default Twitch OAuth endpoint that issues IGDB tokens.
pub const DEFAULT_AUTH_URL: &str = "https://id.twitch.tv/oauth2/token";

/// Twitch developer application credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub(crate) fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    token_type: String,
}

/// Bearer token from one client-credentials exchange.
///
/// Tokens are never refreshed; once [`AccessToken::is_expired`] reports true
/// the caller builds a new client from a fresh token.
#[derive(Clone)]
pub struct AccessToken {
    value: String,
    expires_in: u64,
    token_type: String,
    obtained_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_in: u64, token_type: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_in,
            token_type: token_type.into(),
            obtained_at: Utc::now(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Lifetime in seconds as reported by the auth server.
    pub fn expires_in(&self) -> u64 {
        self.expires_in
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn obtained_at(&self) -> DateTime<Utc> {
        self.obtained_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        let seconds = self.expires_in.min(u64::from(u32::MAX)) as i64;
        self.obtained_at + Duration::seconds(seconds)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// Exchanges client credentials for an [`AccessToken`]. Holds no token state.
pub struct TokenProvider {
    client: Client,
    auth_url: String,
    credentials: Credentials,
}

impl TokenProvider {
    pub fn new(client: Client, auth_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            client,
            auth_url: auth_url.into(),
            credentials,
        }
    }

    /// Perform one client-credentials exchange.
    /// POST {auth_url}?client_id=&client_secret=&grant_type=client_credentials
    pub async fn fetch_token(&self) -> super::Result<AccessToken> {
        debug!(url = %self.auth_url, "Requesting IGDB access token");

        let params = [
            ("client_id", self.credentials.client_id()),
            ("client_secret", self.credentials.client_secret()),
            ("grant_type", "client_credentials"),
        ];

        let response = self
            .client
            .post(&self.auth_url)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IgdbError::Auth(format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or_default()
            )));
        }

        let body = response.text().await?;
        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| IgdbError::Auth(format!("malformed token response: {}", e)))?;

        if token.access_token.is_empty() {
            return Err(IgdbError::Auth("token response carried an empty access_token".into()));
        }

        info!(
            token_type = %token.token_type,
            expires_in = token.expires_in,
            "Obtained IGDB access token"
        );

        Ok(AccessToken::new(
            token.access_token,
            token.expires_in,
            token.token_type,
        ))
    }
}
