//! Vendor transport seam
//!
//! Adapters produce a [`WireRequest`] and consume a [`WireResponse`]; the
//! transport moves them over the network. Nothing here retries.

use async_trait::async_trait;

use super::{error::LlmError, types::Vendor};

/// A vendor-shaped request body, ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct WireRequest {
    /// Which protocol family the body follows
    pub vendor: Vendor,
    /// Model identifier, used by transports that put it in the URL
    pub model: String,
    /// Request body in the vendor's schema
    pub body: serde_json::Value,
}

/// A vendor-shaped response body
#[derive(Debug, Clone, PartialEq)]
pub struct WireResponse {
    pub body: serde_json::Value,
}

impl WireResponse {
    pub fn new(body: serde_json::Value) -> Self {
        Self { body }
    }
}

/// Sends wire requests to a vendor
#[async_trait]
pub trait VendorTransport: Send + Sync {
    /// Send one request and wait for the complete response
    ///
    /// # Errors
    ///
    /// Network, authentication and rate-limit failures surface as [`LlmError`].
    async fn send(&self, request: WireRequest) -> Result<WireResponse, LlmError>;
}
