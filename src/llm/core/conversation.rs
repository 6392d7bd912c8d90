//! Append-only conversation owned by one orchestration run

use thiserror::Error;

use super::types::{Message, MessageRole, ToolInvocationRequest, ToolInvocationResult};

/// Violations of the request/result pairing rules
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    /// The turn meant to carry tool requests has none
    #[error("assistant turn carries no tool requests")]
    NoToolRequests,

    /// Result ids do not match the request ids one-to-one and in order
    #[error("tool results {results:?} do not answer tool requests {requests:?}")]
    Mismatch {
        requests: Vec<String>,
        results: Vec<String>,
    },

    /// Tool requests must come from the assistant
    #[error("tool requests must be carried by an assistant turn")]
    WrongRole,
}

/// Ordered message sequence that only grows
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(initial: Vec<Message>) -> Self {
        Self { messages: initial }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append one message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Append an assistant tool-request turn and the user turn answering it
    ///
    /// Both messages are appended or neither is. The results must answer every
    /// request exactly once, in the order the requests were issued.
    pub fn append_tool_round(
        &mut self,
        assistant: Message,
        results: Vec<ToolInvocationResult>,
    ) -> Result<(), ConversationError> {
        if assistant.role != MessageRole::Assistant {
            return Err(ConversationError::WrongRole);
        }

        let requests: Vec<String> = assistant
            .tool_requests()
            .into_iter()
            .map(|request| request.id.clone())
            .collect();
        if requests.is_empty() {
            return Err(ConversationError::NoToolRequests);
        }

        let result_ids: Vec<String> = results.iter().map(|r| r.request_id.clone()).collect();
        if result_ids != requests {
            return Err(ConversationError::Mismatch {
                requests,
                results: result_ids,
            });
        }

        self.messages.push(assistant);
        self.messages.push(Message::tool_results(results));
        Ok(())
    }

    /// Tool requests that the turn right after their assistant turn does not
    /// answer
    ///
    /// Vendors only accept results in the message that directly follows the
    /// requests, so an answer further down the history does not count.
    pub fn pending_requests(&self) -> Vec<&ToolInvocationRequest> {
        self.messages
            .iter()
            .enumerate()
            .filter(|(_, message)| message.role == MessageRole::Assistant)
            .flat_map(|(position, message)| {
                let answered: Vec<&str> = self
                    .messages
                    .get(position + 1)
                    .map(|next| next.tool_results_in())
                    .unwrap_or_default()
                    .into_iter()
                    .map(|result| result.request_id.as_str())
                    .collect();

                message
                    .tool_requests()
                    .into_iter()
                    .filter(move |request| !answered.contains(&request.id.as_str()))
            })
            .collect()
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}
