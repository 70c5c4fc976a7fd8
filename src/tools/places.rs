use std::env;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const API_BASE: &str = "https://google.serper.dev";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, thiserror::Error)]
pub enum PlacesError {
    #[error("SERPER_API_KEY not set. Get one at https://serper.dev")]
    ApiKeyNotSet,

    #[error("places API rate limit exceeded")]
    RateLimited,

    #[error("places API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("malformed places response: missing 'places' field")]
    MissingPlaces,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct PlacesRequest<'a> {
    q: &'a str,
    location: &'a str,
}

/// One place record as returned by the search API. No normalization is applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub title: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub phone_number: Option<String>,
    pub rating: Option<f64>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    places: Option<Vec<Place>>,
}

#[derive(Clone)]
pub struct PlacesClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl PlacesClient {
    pub fn from_env(http: Client) -> Result<Self, PlacesError> {
        let api_key = env::var("SERPER_API_KEY").map_err(|_| PlacesError::ApiKeyNotSet)?;
        if api_key.trim().is_empty() {
            return Err(PlacesError::ApiKeyNotSet);
        }
        Ok(Self {
            http,
            api_key: api_key.trim().to_string(),
            base_url: API_BASE.to_string(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: "test-key".to_string(),
            base_url: base_url.to_string(),
        }
    }

    /// Single-page place search. No pagination, no retry; failures propagate.
    pub async fn search(&self, query: &str, location: &str) -> Result<Vec<Place>, PlacesError> {
        let url = format!("{}/places", self.base_url);
        let request = PlacesRequest {
            q: query,
            location,
        };

        let response = self
            .http
            .post(&url)
            .header("X-API-KEY", &self.api_key)
            .header("User-Agent", crate::USER_AGENT)
            .json(&request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("places API rate limited");
            return Err(PlacesError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet = if text.len() > 200 { &text[..200] } else { &text };
            warn!(status = %status, "places API error");
            return Err(PlacesError::Api {
                code: status.as_u16(),
                message: format!("HTTP {status}: {snippet}"),
            });
        }

        let body: PlacesResponse = response.json().await?;
        let places = body.places.ok_or(PlacesError::MissingPlaces)?;

        debug!(query = %query, location = %location, results = places.len(), "places search complete");
        Ok(places)
    }
}
