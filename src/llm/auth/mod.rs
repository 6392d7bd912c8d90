//! Credentials for vendor endpoints

pub mod adc;

use async_trait::async_trait;

use crate::llm::core::error::LlmError;

pub use adc::AdcTokenSource;

/// Supplies the bearer token sent with each vendor request
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Current access token. Implementations may cache and refresh.
    async fn token(&self) -> Result<String, LlmError>;
}

/// A fixed API key
#[derive(Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticToken").field("token", &"<redacted>").finish()
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<String, LlmError> {
        if self.token.is_empty() {
            return Err(LlmError::AuthenticationError("API key is empty".to_string()));
        }
        Ok(self.token.clone())
    }
}
