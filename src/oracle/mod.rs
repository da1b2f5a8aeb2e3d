//! Text-completion oracle
//!
//! Link classification and job extraction both reduce to "send a prompt, get
//! text back". They share this one capability and differ only in the prompt
//! template, so swapping providers means implementing a single trait.

mod openai;

pub use openai::OpenAiOracle;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by an oracle call
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("API key not found in environment variable {0}")]
    MissingApiKey(String),

    #[error("Oracle request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Oracle returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed oracle response: {0}")]
    Malformed(String),

    #[error("Oracle returned an empty response")]
    Empty,
}

impl OracleError {
    /// Returns true for failures worth retrying: transport errors, rate
    /// limiting and server errors
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// An external text-completion capability
#[async_trait]
pub trait TextCompletionOracle: Send + Sync {
    /// Completes `prompt` and returns the raw response text
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, OracleError>;
}
