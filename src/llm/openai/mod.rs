//! OpenAI protocol adapter
//!
//! Translates conversations to and from the Chat Completions API, which also
//! serves OpenAI-compatible backends.

pub mod client;
pub mod mapper;
pub mod types;

pub use client::{OpenAiAdapter, OpenAiModel};
