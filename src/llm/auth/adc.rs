//! Application Default Credentials (ADC) token source

use async_trait::async_trait;
use gcp_auth::AuthenticationManager;

use crate::llm::core::error::LlmError;

use super::TokenSource;

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Vertex AI tokens from Application Default Credentials
///
/// Credentials are discovered from `GOOGLE_APPLICATION_CREDENTIALS`, from
/// `gcloud auth application-default login`, or from the metadata server.
/// `gcp_auth` caches tokens and refreshes them when they expire.
pub struct AdcTokenSource {
    inner: AuthenticationManager,
}

impl AdcTokenSource {
    /// Discover credentials using the standard ADC flow
    ///
    /// # Errors
    /// Returns an error if no valid credentials can be found.
    pub async fn new() -> Result<Self, LlmError> {
        let inner = AuthenticationManager::new().await.map_err(|e| {
            LlmError::AuthenticationError(format!("Failed to initialize ADC: {}", e))
        })?;

        Ok(Self { inner })
    }
}

#[async_trait]
impl TokenSource for AdcTokenSource {
    async fn token(&self) -> Result<String, LlmError> {
        let token = self
            .inner
            .get_token(&[CLOUD_PLATFORM_SCOPE])
            .await
            .map_err(|e| LlmError::AuthenticationError(format!("Failed to get token: {}", e)))?;

        Ok(token.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Only run with valid credentials
    async fn test_adc_token() {
        let source = AdcTokenSource::new()
            .await
            .expect("Failed to initialize ADC");

        let token = source.token().await.expect("Failed to retrieve access token");

        // GCP tokens are typically quite long
        assert!(token.len() > 20, "Token seems too short: {} characters", token.len());
    }
}
