use tracing::{debug, info};

use crate::llm::{ChatMessage, CompletionClient, LlmError, Role, ToolDef};
use crate::tools::{ToolError, ToolSet};

use super::router::{Decision, RouterError, route};
use super::state::{Conversation, Stage};

/// Global ceiling over reasoning and tool steps; reaching it aborts the run.
pub const DEFAULT_MAX_STEPS: u32 = 24;
/// Finder reasoning steps before the router forces the pipeline onward.
pub const DEFAULT_FINDER_ITERATIONS: u32 = 6;

const FINDER_INSTRUCTIONS: &str = "You are a professional lead finder. Your job is to find business leads through Google Places, accessible via the search_places tool. Return only the list of found lead URLs, along with their addresses. When the list is complete, prefix your answer with FINAL ANSWER.";

const ENRICHER_INSTRUCTIONS: &str = "You are a professional lead enricher. Your job is to gather as much relevant lead information from a given website as possible. You will receive a list of URLs from leads and their addresses. Use the extract_lead tool to gather additional lead data from the provided URLs. Report every lead with its company name, email address, phone, CEO, and company mission. If a field cannot be determined, use the literal string \"not found\". When every lead is enriched, prefix your answer with FINAL ANSWER.";

#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_steps: u32,
    pub finder_iterations: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            finder_iterations: DEFAULT_FINDER_ITERATIONS,
        }
    }
}

#[derive(Debug)]
pub struct RunReport {
    /// The enricher's final text.
    pub summary: String,
    pub steps: u32,
    pub tool_calls: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{0}")]
    Llm(#[from] LlmError),

    #[error("{0}")]
    Tool(#[from] ToolError),

    #[error("{0}")]
    Router(#[from] RouterError),

    #[error("run aborted: step ceiling of {0} reached")]
    StepLimit(u32),
}

/// Drive the two-stage pipeline to completion: the finder searches for leads,
/// the enricher scrapes each one. One reasoning or tool step runs at a time;
/// the conversation only ever grows.
pub async fn run(
    llm: &impl CompletionClient,
    tools: &ToolSet,
    query: &str,
    location: &str,
    limits: Limits,
) -> Result<RunReport, PipelineError> {
    let mut conversation = Conversation::new();
    conversation.push(ChatMessage::user(format!(
        "Find business leads for \"{query}\" in {location}, then enrich every lead with contact details."
    )));

    let mut stage = Stage::Finder;
    let mut steps = 0u32;
    let mut tool_calls = 0u32;

    loop {
        take_step(&mut steps, limits.max_steps)?;
        let reply = reasoning_step(llm, stage, &conversation).await?;
        conversation.record_reasoning(stage, reply);

        let cap = match stage {
            Stage::Finder => Some(limits.finder_iterations),
            Stage::Enricher => None,
        };
        match route(&conversation, cap)? {
            Decision::CallTool => {
                take_step(&mut steps, limits.max_steps)?;
                tool_calls += execute_tools(tools, &mut conversation).await?;
                // Control goes back to whichever stage requested the tools.
                stage = conversation.sender();
            }
            Decision::Continue | Decision::Finish => match stage {
                Stage::Finder => {
                    debug!(steps, "finder done, advancing to enricher");
                    stage = Stage::Enricher;
                }
                Stage::Enricher => break,
            },
        }
    }

    let summary = final_summary(&conversation);
    info!(steps, tool_calls, "pipeline finished");
    Ok(RunReport {
        summary,
        steps,
        tool_calls,
    })
}

fn take_step(steps: &mut u32, max_steps: u32) -> Result<(), PipelineError> {
    *steps += 1;
    if *steps > max_steps {
        return Err(PipelineError::StepLimit(max_steps));
    }
    Ok(())
}

async fn reasoning_step(
    llm: &impl CompletionClient,
    stage: Stage,
    conversation: &Conversation,
) -> Result<ChatMessage, LlmError> {
    let mut messages = Vec::with_capacity(conversation.messages().len() + 1);
    messages.push(ChatMessage::system(instructions(stage)));
    messages.extend_from_slice(conversation.messages());

    debug!(stage = %stage, messages = messages.len(), "reasoning step");
    llm.complete(&messages, &stage_tools(stage)).await
}

/// Execute every tool call in the most recent reasoning result, appending one
/// tool message per call so each request is consumed exactly once.
async fn execute_tools(
    tools: &ToolSet,
    conversation: &mut Conversation,
) -> Result<u32, ToolError> {
    let calls = conversation
        .last()
        .map(|message| message.tool_calls.clone())
        .unwrap_or_default();

    info!(stage = %conversation.sender(), calls = calls.len(), "executing tool calls");

    let mut executed = 0;
    for call in &calls {
        let output = tools.execute(call).await?;
        conversation.push(ChatMessage::tool(call.id.clone(), output));
        executed += 1;
    }
    Ok(executed)
}

fn instructions(stage: Stage) -> &'static str {
    match stage {
        Stage::Finder => FINDER_INSTRUCTIONS,
        Stage::Enricher => ENRICHER_INSTRUCTIONS,
    }
}

fn stage_tools(stage: Stage) -> Vec<ToolDef> {
    match stage {
        Stage::Finder => ToolSet::finder_tools(),
        Stage::Enricher => ToolSet::enricher_tools(),
    }
}

fn final_summary(conversation: &Conversation) -> String {
    conversation
        .messages()
        .iter()
        .rev()
        .find_map(|message| {
            (message.role == Role::Assistant)
                .then(|| message.content.clone())
                .flatten()
        })
        .unwrap_or_else(|| "(no answer produced)".to_string())
}
