use std::sync::Arc;

use reqwest::{
    header::{ACCEPT, AUTHORIZATION},
    Client, Url,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::{auth::AccessToken, error::IgdbError, query::QueryDescription};

/// Default IGDB API host.
pub const DEFAULT_BASE_URL: &str = "https://api.igdb.com";

/// Endpoint holding game records.
pub const GAMES_ENDPOINT: &str = "games";

/// A record exactly as returned upstream; its shape depends on the requested fields.
pub type RawRecord = serde_json::Map<String, Value>;

/// IGDB v4 client bound to one access token for its whole lifetime.
#[derive(Clone)]
pub struct IgdbClient {
    client: Client,
    base_url: Url,
    client_id: Arc<str>,
    token: AccessToken,
}

impl IgdbClient {
    pub fn new(
        client: Client,
        base_url: &str,
        client_id: impl Into<String>,
        token: AccessToken,
    ) -> super::Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| IgdbError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(IgdbError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "URL cannot carry a path".to_string(),
            });
        }

        Ok(Self {
            client,
            base_url: parsed,
            client_id: Arc::from(client_id.into()),
            token,
        })
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    /// `{base_url}/v4/{endpoint}` with the endpoint percent-encoded as one path segment.
    pub(crate) fn endpoint_url(&self, endpoint: &str) -> super::Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| IgdbError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .push("v4")
            .push(endpoint);
        Ok(url)
    }

    /// Run a query against `endpoint` and decode the JSON array into `T`.
    /// POST /v4/{endpoint}
    pub async fn query<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &QueryDescription,
    ) -> super::Result<Vec<T>> {
        let url = self.endpoint_url(endpoint)?;
        let body = query.build();
        debug!(endpoint, query = %body, "Sending IGDB query");

        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .header("Client-ID", self.client_id.as_ref())
            .header(AUTHORIZATION, format!("Bearer {}", self.token.value()))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint, status = status.as_u16(), "IGDB query failed");
            return Err(IgdbError::Upstream {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice::<Vec<T>>(&bytes).map_err(|e| {
            IgdbError::Decode(format!(
                "{} response is not the expected JSON array: {}",
                endpoint, e
            ))
        })
    }

    /// Like [`IgdbClient::query`] but leaves every record untyped.
    pub async fn query_raw(
        &self,
        endpoint: &str,
        query: &QueryDescription,
    ) -> super::Result<Vec<RawRecord>> {
        self.query::<RawRecord>(endpoint, query).await
    }

    /// POST /v4/games
    pub async fn games(&self, query: &QueryDescription) -> super::Result<Vec<RawRecord>> {
        self.query_raw(GAMES_ENDPOINT, query).await
    }

    /// Fetch a single record by id. An empty result is `Ok(None)`, never an error.
    pub async fn get_by_id(
        &self,
        endpoint: &str,
        id: u64,
        fields: &[&str],
    ) -> super::Result<Option<RawRecord>> {
        let query = QueryDescription::new()
            .fields(fields.iter().copied())
            .filter(format!("id = {}", id))
            .limit(1);

        let mut records = self.query_raw(endpoint, &query).await?;
        if records.is_empty() {
            debug!(endpoint, id, "IGDB record not found");
            return Ok(None);
        }
        Ok(Some(records.swap_remove(0)))
    }

    pub async fn get_game_by_id(
        &self,
        id: u64,
        fields: &[&str],
    ) -> super::Result<Option<RawRecord>> {
        self.get_by_id(GAMES_ENDPOINT, id, fields).await
    }
}
