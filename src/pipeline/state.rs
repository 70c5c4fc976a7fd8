use std::fmt;

use crate::llm::ChatMessage;

/// The two agent stages. A closed enum rather than a string tag, so a
/// misrouted sender is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Finder,
    Enricher,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Finder => "lead_finder",
            Stage::Enricher => "lead_enricher",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conversation state owned by the orchestrator.
///
/// Invariants: the message sequence only grows; `sender` names the stage that
/// last ran a reasoning step, so tool results can be routed back to it;
/// `iterations` counts finder reasoning steps for the router's cap.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    sender: Stage,
    iterations: u32,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            sender: Stage::Finder,
            iterations: 0,
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Append a reasoning result and tag its stage as the sender.
    pub fn record_reasoning(&mut self, stage: Stage, message: ChatMessage) {
        self.sender = stage;
        if stage == Stage::Finder {
            self.iterations += 1;
        }
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn sender(&self) -> Stage {
        self.sender
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
