use crate::llm::core::{conversation::ConversationError, error::LlmError};

/// Failures that end an orchestration run
///
/// Tool failures are not here: they go back to the model as error results.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// The vendor could not be reached, refused the request, or sent a reply
    /// that could not be decoded
    #[error("Vendor request failed: {0}")]
    Transport(#[from] LlmError),

    /// The model kept requesting tools after the last allowed request
    #[error("Tool loop exceeded ({max_iterations} model requests)")]
    IterationLimitExceeded { max_iterations: usize },

    /// Rejected before the first vendor request
    #[error("Invalid orchestration input: {0}")]
    InvalidInput(String),

    /// Tool results did not line up with the requests they answer
    #[error("Tool result correlation failed: {0}")]
    Correlation(#[from] ConversationError),
}

impl OrchestratorError {
    /// Whether the run hit the iteration cap
    pub fn is_iteration_limit(&self) -> bool {
        matches!(self, OrchestratorError::IterationLimitExceeded { .. })
    }
}
