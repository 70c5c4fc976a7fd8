//! Tool layer: the two external capabilities the agents may request, plus the
//! name-keyed dispatch that executes a requested call.

pub mod extract;
pub mod places;

pub use extract::{ExtractClient, ExtractError, LeadRecord};
pub use places::{Place, PlacesClient, PlacesError};

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

use crate::llm::{ToolCall, ToolDef};

pub const SEARCH_PLACES: &str = "search_places";
pub const EXTRACT_LEAD: &str = "extract_lead";

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {source}")]
    InvalidArgs {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Places(#[from] PlacesError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("failed to encode tool result: {0}")]
    Encode(serde_json::Error),
}

#[derive(Deserialize, JsonSchema)]
pub struct SearchPlacesArgs {
    /// Search query for the lead niche, e.g. "metal fabrication companies"
    pub query: String,
    /// Location of the query, e.g. "Atlanta, United States", or only the country if no city is known
    pub location: String,
}

#[derive(Deserialize, JsonSchema)]
pub struct ExtractLeadArgs {
    /// Website URL to extract lead data from (must be HTTP or HTTPS)
    pub url: String,
}

/// The pipeline's tool surface: concrete API clients behind a name-keyed
/// dispatcher. Clients are injected at construction so the orchestration can
/// run against test servers.
#[derive(Clone)]
pub struct ToolSet {
    places: PlacesClient,
    extract: ExtractClient,
}

impl ToolSet {
    pub fn new(places: PlacesClient, extract: ExtractClient) -> Self {
        Self { places, extract }
    }

    /// Tool definitions offered to the finder's reasoning step.
    pub fn finder_tools() -> Vec<ToolDef> {
        vec![ToolDef::function(
            SEARCH_PLACES,
            "Find business leads from Google Places. Use the query parameter to search for the niche, and the location parameter for the specific location.",
            schemars::schema_for!(SearchPlacesArgs).to_value(),
        )]
    }

    /// Tool definitions offered to the enricher's reasoning step.
    pub fn enricher_tools() -> Vec<ToolDef> {
        vec![ToolDef::function(
            EXTRACT_LEAD,
            "Extract lead contact information (company name, email, phone, CEO, mission) from a given website URL.",
            schemars::schema_for!(ExtractLeadArgs).to_value(),
        )]
    }

    /// Execute one requested tool call and return its JSON-encoded result.
    /// Unknown names and malformed argument payloads fail with typed errors;
    /// underlying API failures propagate unmodified.
    pub async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        match call.function.name.as_str() {
            SEARCH_PLACES => {
                let args: SearchPlacesArgs = parse_args(SEARCH_PLACES, &call.function.arguments)?;
                info!(query = %args.query, location = %args.location, "tool:search_places");
                let places = self.places.search(&args.query, &args.location).await?;
                serde_json::to_string(&places).map_err(ToolError::Encode)
            }
            EXTRACT_LEAD => {
                let args: ExtractLeadArgs = parse_args(EXTRACT_LEAD, &call.function.arguments)?;
                info!(url = %args.url, "tool:extract_lead");
                let record = self.extract.extract(&args.url).await?;
                serde_json::to_string(&record).map_err(ToolError::Encode)
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

fn parse_args<'a, T: Deserialize<'a>>(
    tool: &'static str,
    arguments: &'a str,
) -> Result<T, ToolError> {
    serde_json::from_str(arguments).map_err(|source| ToolError::InvalidArgs { tool, source })
}
