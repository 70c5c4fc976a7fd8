mod llm;
mod pipeline;
mod tools;

pub const USER_AGENT: &str = concat!("prospector/", env!("CARGO_PKG_VERSION"));

use std::time::Duration;

use clap::Parser;
use reqwest::Client;
use tracing::info;

use llm::ChatClient;
use tools::{ExtractClient, PlacesClient, ToolSet};

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Global HTTP client timeout covering DNS + connect + response body.
const HTTP_TIMEOUT: Duration = Duration::from_secs(90);

/// Find business leads via places search and enrich them from their websites.
///
/// Configuration via environment variables:
/// - `OPENAI_API_KEY` (+ optional `OPENAI_MODEL`, `OPENAI_BASE_URL`): reasoning steps
/// - `SERPER_API_KEY`: places search
/// - `FIRECRAWL_API_KEY`: website extraction
#[derive(Parser)]
#[command(name = "prospector", version)]
struct Cli {
    /// Niche or business type to prospect for, e.g. "metal fabrication companies"
    query: String,

    /// Location to search, e.g. "Atlanta, United States", or only a country
    #[arg(short, long)]
    location: String,

    /// Override the chat model
    #[arg(long)]
    model: Option<String>,

    /// Abort the run after this many reasoning/tool steps
    #[arg(long, default_value_t = pipeline::DEFAULT_MAX_STEPS)]
    max_steps: u32,

    /// Finder reasoning steps before the router forces the pipeline onward
    #[arg(long, default_value_t = pipeline::DEFAULT_FINDER_ITERATIONS)]
    finder_iterations: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("prospector=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let http = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(HTTP_TIMEOUT)
        .build()?;

    let mut chat = ChatClient::from_env(http.clone())?;
    if let Some(model) = cli.model {
        chat.set_model(model);
    }
    let tools = ToolSet::new(
        PlacesClient::from_env(http.clone())?,
        ExtractClient::from_env(http)?,
    );

    info!(query = %cli.query, location = %cli.location, "starting lead pipeline");

    let limits = pipeline::Limits {
        max_steps: cli.max_steps,
        finder_iterations: cli.finder_iterations,
    };
    let report = pipeline::run(&chat, &tools, &cli.query, &cli.location, limits).await?;

    info!(
        steps = report.steps,
        tool_calls = report.tool_calls,
        "pipeline complete"
    );
    println!("{}", report.summary);
    Ok(())
}
