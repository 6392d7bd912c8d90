//! Core abstractions for the LLM layer

pub mod config;
pub mod conversation;
pub mod error;
pub mod provider;
pub mod transport;
pub mod types;
pub mod value;
