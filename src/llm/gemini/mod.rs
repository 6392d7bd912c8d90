//! Gemini protocol adapter
//!
//! Translates conversations to and from Google's Gemini models via the
//! Vertex AI generateContent endpoint.

pub mod client;
pub mod mapper;
pub mod types;

// Re-export main types for convenience
pub use client::{GeminiAdapter, GeminiModel};
