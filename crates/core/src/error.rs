use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptcastError {
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("No search results found for \"{query}\"")]
    NoResultsFound { query: String },

    #[error("Search failed for \"{query}\": {reason}")]
    SearchFailed { query: String, reason: String },

    #[error("Provider {provider_name} is not configured: {env_var} is not set")]
    UnconfiguredProvider {
        provider_name: String,
        env_var: String,
    },

    #[error("{provider_name} text generation failed: {reason}")]
    UpstreamGeneration {
        provider_name: String,
        reason: String,
    },

    #[error("{provider_name} speech synthesis failed: {reason}")]
    Synthesis {
        provider_name: String,
        reason: String,
    },

    #[error("Unsupported provider output from {provider_name}: {reason}")]
    UnsupportedProvider {
        provider_name: String,
        reason: String,
    },

    #[error("Gave up deleting {path} after {attempts} attempts")]
    CleanupExhausted { path: PathBuf, attempts: u32 },

    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("WAV encoding failed: {0}")]
    WavError(#[from] hound::Error),
}

/// Coarse error category reported to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    InvalidRequest,
    NoResultsFound,
    SearchFailed,
    UnconfiguredProvider,
    UpstreamGenerationError,
    SynthesisError,
    UnsupportedProvider,
    CleanupWarning,
    InvalidTransition,
}

impl ScriptcastError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScriptcastError::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            ScriptcastError::NoResultsFound { .. } => ErrorKind::NoResultsFound,
            ScriptcastError::SearchFailed { .. } => ErrorKind::SearchFailed,
            ScriptcastError::UnconfiguredProvider { .. } => ErrorKind::UnconfiguredProvider,
            ScriptcastError::UpstreamGeneration { .. } | ScriptcastError::JsonError(_) => {
                ErrorKind::UpstreamGenerationError
            }
            ScriptcastError::Synthesis { .. }
            | ScriptcastError::IoError(_)
            | ScriptcastError::WavError(_) => ErrorKind::SynthesisError,
            ScriptcastError::UnsupportedProvider { .. } => ErrorKind::UnsupportedProvider,
            ScriptcastError::CleanupExhausted { .. } => ErrorKind::CleanupWarning,
            ScriptcastError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            // Transport errors only escape adapters that did not wrap them.
            ScriptcastError::ApiError(_) => ErrorKind::UpstreamGenerationError,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScriptcastError>;
