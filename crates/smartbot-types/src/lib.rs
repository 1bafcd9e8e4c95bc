//! Core types and structures for smartbot
//!
//! This crate provides the foundational types used across all smartbot crates:
//! the chat message shape sent to the remote model, the error taxonomy, and
//! workspace-wide constants.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Soft cap on the number of PDF files accepted per load (warn, don't reject)
pub const MAX_UPLOAD_FILES: usize = 5;

/// Maximum serialized size of the chat history before old turns are trimmed
pub const MAX_HISTORY_BYTES: usize = 400_000;

/// Default OpenAI-compatible API base URL (chat, transcription, synthesis)
pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1";

/// Default chat model
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.3-70b-versatile";

/// Default speech-recognition model
pub const DEFAULT_STT_MODEL: &str = "whisper-large-v3";

/// Default text-to-speech model and voice
pub const DEFAULT_TTS_MODEL: &str = "playai-tts";
pub const DEFAULT_TTS_VOICE: &str = "Fritz-PlayAI";

// ============================================================================
// Message Types
// ============================================================================

/// Helper function to deserialize string or null values
pub fn deserialize_string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        _ => Ok(String::new()),
    }
}

/// Message structure for the chat API
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    #[serde(deserialize_with = "deserialize_string_or_null", default)]
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

// ============================================================================
// Error Taxonomy
// ============================================================================

/// Fatal startup-time configuration problems
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0} (set it or add it to .env)")]
    MissingCredential(&'static str),

    #[error("invalid API base URL '{0}'")]
    InvalidApiUrl(String),
}

/// Document loading failures. `Malformed` is recovered at batch
/// granularity: the offending file is skipped and extraction continues.
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("not a well-formed PDF: {0}")]
    Malformed(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Remote chat model failures, recovered at turn granularity: the error is
/// shown to the user and the turn is discarded. No retry.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("chat request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("chat API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("chat stream ended without producing any content")]
    EmptyResponse,
}

/// Speech capture/recognition outcomes. The two failure kinds surface the
/// same way to the user ("no text came back") but must stay distinguishable
/// to the caller, so they are separate variants.
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("could not understand the audio")]
    Ambiguous,

    #[error("speech recognition service unavailable: {0}")]
    Unavailable(String),
}

/// Text-to-speech failures, recovered by showing the text answer without audio
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("speech synthesis request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("speech synthesis API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to write audio file: {0}")]
    Io(#[from] std::io::Error),
}
