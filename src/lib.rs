//! Tool-calling conversation orchestration for LLM vendors

// LLM abstraction layer
pub mod llm;
