use std::env;
use std::time::Duration;

use reqwest::Client;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const API_BASE: &str = "https://api.firecrawl.dev";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("FIRECRAWL_API_KEY not set. Get one at https://firecrawl.dev")]
    ApiKeyNotSet,

    #[error("invalid URL: must be HTTP(S)")]
    InvalidScheme,

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("extraction API rate limit exceeded")]
    RateLimited,

    #[error("extraction service error: {0}")]
    Service(String),

    #[error("extraction API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("malformed extraction payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Contact fields scraped from a lead's website. All fields are plain strings;
/// the enricher's instructions ask for the literal "not found" when a field
/// cannot be determined, so nothing is enforced here.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LeadRecord {
    /// Legal or trading name of the company
    pub company_name: String,
    /// Primary contact email address
    pub email_address: String,
    /// Street address of the business
    pub address: String,
    /// Contact phone number
    pub phone: String,
    /// Name of the CEO or owner
    pub ceo: String,
    /// The company's stated mission or tagline
    pub company_mission: String,
}

#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: Vec<&'static str>,
    extract: ExtractSpec,
}

#[derive(Debug, Serialize)]
struct ExtractSpec {
    schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    success: Option<bool>,
    data: Option<ScrapeData>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    extract: Option<serde_json::Value>,
}

#[derive(Clone)]
pub struct ExtractClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl ExtractClient {
    pub fn from_env(http: Client) -> Result<Self, ExtractError> {
        let api_key = env::var("FIRECRAWL_API_KEY").map_err(|_| ExtractError::ApiKeyNotSet)?;
        if api_key.trim().is_empty() {
            return Err(ExtractError::ApiKeyNotSet);
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

    /// Scrape one lead website into a `LeadRecord`. No retry on transient
    /// failure; the service's error payload surfaces as `ExtractError::Service`.
    pub async fn extract(&self, url: &str) -> Result<LeadRecord, ExtractError> {
        validate_url(url)?;

        let endpoint = format!("{}/v1/scrape", self.base_url);
        let request = ScrapeRequest {
            url,
            formats: vec!["extract"],
            extract: ExtractSpec {
                schema: schemars::schema_for!(LeadRecord).to_value(),
            },
        };

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .header("User-Agent", crate::USER_AGENT)
            .json(&request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("extraction API rate limited");
            return Err(ExtractError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Ok(body) = serde_json::from_str::<ScrapeResponse>(&text)
                && let Some(message) = body.error
            {
                warn!(status = %status, error = %message, "extraction service error");
                return Err(ExtractError::Service(message));
            }
            let snippet = if text.len() > 200 { &text[..200] } else { &text };
            warn!(status = %status, "extraction API error");
            return Err(ExtractError::Api {
                code: status.as_u16(),
                message: format!("HTTP {status}: {snippet}"),
            });
        }

        let body: ScrapeResponse = response.json().await?;

        if body.success == Some(false) {
            let message = body
                .error
                .unwrap_or_else(|| "scrape reported failure without detail".to_string());
            warn!(url = %url, error = %message, "extraction service error in 200 response");
            return Err(ExtractError::Service(message));
        }

        let extract = body
            .data
            .and_then(|data| data.extract)
            .ok_or_else(|| ExtractError::Service("response contained no extract data".into()))?;

        let record: LeadRecord = serde_json::from_value(extract)?;

        debug!(url = %url, company = %record.company_name, "lead extraction complete");
        Ok(record)
    }
}

fn validate_url(raw: &str) -> Result<(), ExtractError> {
    let parsed = url::Url::parse(raw)?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ExtractError::InvalidScheme),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_url_accepts_http_and_https() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("http://example.com/about").is_ok());
    }

    #[test]
    fn validate_url_rejects_other_schemes() {
        assert!(matches!(
            validate_url("ftp://example.com"),
            Err(ExtractError::InvalidScheme)
        ));
        assert!(matches!(
            validate_url("javascript:alert(1)"),
            Err(ExtractError::InvalidScheme)
        ));
    }

    #[test]
    fn validate_url_rejects_garbage() {
        assert!(matches!(
            validate_url("not a url"),
            Err(ExtractError::InvalidUrl(_))
        ));
    }

    #[test]
    fn lead_schema_lists_contact_fields() {
        let schema = schemars::schema_for!(LeadRecord).to_value();
        let properties = schema["properties"].as_object().unwrap();
        for field in [
            "company_name",
            "email_address",
            "address",
            "phone",
            "ceo",
            "company_mission",
        ] {
            assert!(properties.contains_key(field), "missing field: {field}");
        }
    }
}

#[cfg(test)]
mod http_tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn lead_body() -> serde_json::Value {
        serde_json::json!({
            "success": true,
            "data": {
                "extract": {
                    "company_name": "Acme Corp",
                    "email_address": "info@acme.example",
                    "address": "1 Main St, Springfield",
                    "phone": "+1 555 0100",
                    "ceo": "Jordan Acme",
                    "company_mission": "Everything for coyotes"
                }
            }
        })
    }

    #[tokio::test]
    async fn extract_success_returns_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/scrape"))
            .respond_with(ResponseTemplate::new(200).set_body_json(lead_body()))
            .mount(&server)
            .await;

        let client = ExtractClient::with_base_url(Client::new(), &server.uri());
        let record = client.extract("https://acme.example").await.unwrap();

        assert_eq!(record.company_name, "Acme Corp");
        assert_eq!(record.email_address, "info@acme.example");
        assert_eq!(record.ceo, "Jordan Acme");
    }

    #[tokio::test]
    async fn extract_service_failure_surfaces_error_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/scrape"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "error": "This website is not supported"
            })))
            .mount(&server)
            .await;

        let client = ExtractClient::with_base_url(Client::new(), &server.uri());
        match client.extract("https://blocked.example").await {
            Err(ExtractError::Service(message)) => {
                assert!(message.contains("not supported"), "got: {message}");
            }
            other => panic!("expected Service error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn extract_402_with_error_body_is_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/scrape"))
            .respond_with(ResponseTemplate::new(402).set_body_json(serde_json::json!({
                "success": false,
                "error": "Payment required"
            })))
            .mount(&server)
            .await;

        let client = ExtractClient::with_base_url(Client::new(), &server.uri());
        let result = client.extract("https://acme.example").await;
        assert!(matches!(result, Err(ExtractError::Service(_))));
    }

    #[tokio::test]
    async fn extract_missing_data_is_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/scrape"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})),
            )
            .mount(&server)
            .await;

        let client = ExtractClient::with_base_url(Client::new(), &server.uri());
        let result = client.extract("https://acme.example").await;
        assert!(matches!(result, Err(ExtractError::Service(_))));
    }

    #[tokio::test]
    async fn extract_rejects_bad_scheme_without_network() {
        // No server: the URL check fails before any request is sent.
        let client = ExtractClient::with_base_url(Client::new(), "http://localhost:0");
        let result = client.extract("file:///etc/passwd").await;
        assert!(matches!(result, Err(ExtractError::InvalidScheme)));
    }
}
