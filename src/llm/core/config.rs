//! Generation and orchestration parameters

use serde::{Deserialize, Serialize};

/// Parameters for controlling text generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Maximum number of tokens to generate
    pub max_tokens: u32,
    /// Randomness (0.0-1.0, higher = more random)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Top-k sampling (ignored by vendors without it)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Stop generation when these sequences are encountered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    /// System prompt/instructions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl GenerationConfig {
    /// Create a new configuration with the specified max tokens
    pub fn new(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            ..Self::default()
        }
    }

    /// Set the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the top_p value
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set the top_k value
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Set stop sequences
    pub fn with_stop_sequences(mut self, stop_sequences: Vec<String>) -> Self {
        self.stop_sequences = Some(stop_sequences);
        self
    }

    /// Set the system prompt
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: None,
            top_p: None,
            top_k: None,
            stop_sequences: None,
            system: None,
        }
    }
}

/// Bounds for one orchestration run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum number of vendor requests per run
    pub max_iterations: usize,
    /// Characters of tool output kept in each trace entry
    pub summary_chars: usize,
}

impl OrchestratorConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_summary_chars(mut self, summary_chars: usize) -> Self {
        self.summary_chars = summary_chars;
        self
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            summary_chars: 200,
        }
    }
}
