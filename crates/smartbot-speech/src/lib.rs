//! Speech bridge for smartbot
//!
//! Two independent, stateless adapters: microphone capture + remote
//! transcription (`SpeechCapture`), and remote text-to-speech into a
//! temporary MP3 file (`SpeechSynth`). Both sit behind traits so the
//! session controller can be tested without audio devices or network.

use async_trait::async_trait;

use smartbot_types::{SpeechError, SynthesisError};

pub mod capture;
mod synthesize;
mod transcribe;

pub use synthesize::{AudioClip, SpeechSynthesizer};
pub use transcribe::MicrophoneRecognizer;

/// Capture one spoken utterance from the default input device and
/// transcribe it via the remote speech-recognition service.
#[async_trait]
pub trait SpeechCapture: Send + Sync {
    /// Blocks (on a background thread) until an utterance boundary, then
    /// transcribes. `SpeechError::Ambiguous` when nothing intelligible was
    /// said; `SpeechError::Unavailable` when the device or service failed.
    async fn capture_and_transcribe(&self) -> Result<String, SpeechError>;
}

/// Render text as spoken audio in a fixed voice.
#[async_trait]
pub trait SpeechSynth: Send + Sync {
    /// Each call produces a fresh temporary MP3; the returned guard deletes
    /// the file when dropped.
    async fn synthesize(&self, text: &str) -> Result<AudioClip, SynthesisError>;
}
