//! Claude protocol adapter
//!
//! Translates conversations to and from the Anthropic Messages API, as served
//! by Google Cloud Platform's Vertex AI.

pub mod client;
pub mod mapper;
pub mod types;

// Re-export commonly used types
pub use client::{ClaudeAdapter, ClaudeModel};
