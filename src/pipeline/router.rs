use super::state::Conversation;

/// Literal end-marker an agent puts in its text when it considers its job done.
pub const FINAL_ANSWER_MARKER: &str = "FINAL ANSWER";

/// Transition selected after a reasoning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The last reasoning result requested at least one tool call.
    CallTool,
    /// Hand the conversation to the next stage (or terminate, from the last).
    Continue,
    /// The agent emitted the end marker.
    Finish,
}

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("no messages found in conversation state")]
    EmptyConversation,
}

/// Route based on the most recent message. With an `iteration_cap`, a
/// conversation that has reached the cap routes to `Continue` regardless of
/// tool-call presence (loop-termination guard, not a business rule).
pub fn route(
    conversation: &Conversation,
    iteration_cap: Option<u32>,
) -> Result<Decision, RouterError> {
    let last = conversation.last().ok_or(RouterError::EmptyConversation)?;

    if let Some(cap) = iteration_cap
        && conversation.iterations() >= cap
    {
        return Ok(Decision::Continue);
    }

    if !last.tool_calls.is_empty() {
        return Ok(Decision::CallTool);
    }

    if last
        .content
        .as_deref()
        .is_some_and(|text| text.contains(FINAL_ANSWER_MARKER))
    {
        return Ok(Decision::Finish);
    }

    Ok(Decision::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::{FunctionCall, ToolCall};
    use crate::llm::{ChatMessage, Role};
    use crate::pipeline::state::Stage;

    fn assistant(text: &str) -> ChatMessage {
        ChatMessage {
            role: Role::Assistant,
            content: Some(text.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    fn assistant_with_tool_call(name: &str) -> ChatMessage {
        ChatMessage {
            role: Role::Assistant,
            content: None,
            tool_calls: vec![ToolCall {
                id: "call_1".into(),
                kind: "function".into(),
                function: FunctionCall {
                    name: name.into(),
                    arguments: "{\"query\":\"factories\",\"location\":\"Czechia\"}".into(),
                },
            }],
            tool_call_id: None,
        }
    }

    fn conversation_ending_with(stage: Stage, message: ChatMessage) -> Conversation {
        let mut conversation = Conversation::new();
        conversation.push(ChatMessage::user("find leads"));
        conversation.record_reasoning(stage, message);
        conversation
    }

    #[test]
    fn tool_call_request_routes_to_executor() {
        let conversation =
            conversation_ending_with(Stage::Finder, assistant_with_tool_call("search_places"));
        assert_eq!(route(&conversation, None).unwrap(), Decision::CallTool);
    }

    #[test]
    fn plain_text_routes_to_continue() {
        let conversation = conversation_ending_with(Stage::Finder, assistant("still thinking"));
        assert_eq!(route(&conversation, None).unwrap(), Decision::Continue);
    }

    #[test]
    fn end_marker_routes_to_finish() {
        let conversation = conversation_ending_with(
            Stage::Enricher,
            assistant("FINAL ANSWER: 3 leads enriched"),
        );
        assert_eq!(route(&conversation, None).unwrap(), Decision::Finish);
    }

    #[test]
    fn empty_conversation_fails_immediately() {
        let conversation = Conversation::new();
        assert!(matches!(
            route(&conversation, None),
            Err(RouterError::EmptyConversation)
        ));
    }

    #[test]
    fn cap_reached_forces_continue_despite_tool_call() {
        let mut conversation = Conversation::new();
        conversation.push(ChatMessage::user("find leads"));
        conversation.record_reasoning(Stage::Finder, assistant_with_tool_call("search_places"));
        conversation.record_reasoning(Stage::Finder, assistant_with_tool_call("search_places"));

        assert_eq!(route(&conversation, Some(2)).unwrap(), Decision::Continue);
    }

    #[test]
    fn cap_reached_forces_continue_despite_end_marker() {
        let mut conversation = Conversation::new();
        conversation.push(ChatMessage::user("find leads"));
        conversation.record_reasoning(Stage::Finder, assistant("FINAL ANSWER: done"));

        assert_eq!(route(&conversation, Some(1)).unwrap(), Decision::Continue);
    }

    #[test]
    fn below_cap_routing_is_tool_driven() {
        let conversation =
            conversation_ending_with(Stage::Finder, assistant_with_tool_call("search_places"));
        assert_eq!(route(&conversation, Some(6)).unwrap(), Decision::CallTool);
    }

    #[test]
    fn marker_anywhere_in_text_finishes() {
        let conversation = conversation_ending_with(
            Stage::Enricher,
            assistant("Here is everything.\n\nFINAL ANSWER\n- lead one"),
        );
        assert_eq!(route(&conversation, None).unwrap(), Decision::Finish);
    }
}
