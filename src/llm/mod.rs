//! Chat-completions client for the reasoning steps (OpenAI-compatible wire format).

pub mod client;
pub mod types;

pub use client::{ChatClient, CompletionClient, LlmError};
pub use types::{ChatMessage, Role, ToolCall, ToolDef};
