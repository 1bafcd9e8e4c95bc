//! Remote text-to-speech into an RAII-managed temporary MP3.

use std::io::Write;
use std::path::Path;

use async_trait::async_trait;
use tempfile::NamedTempFile;

use smartbot_types::SynthesisError;

use crate::SpeechSynth;

/// Guard around a synthesized MP3 clip. Dropping the clip deletes the file,
/// so artifacts never outlive the turn or session that produced them.
pub struct AudioClip {
    file: NamedTempFile,
}

impl AudioClip {
    /// Write MP3 bytes to a fresh temp file and wrap them in a guard.
    pub fn from_bytes(bytes: &[u8]) -> std::io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("smartbot-")
            .suffix(".mp3")
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Text-to-speech client for an OpenAI-compatible `/audio/speech` endpoint.
pub struct SpeechSynthesizer {
    api_key: String,
    model: String,
    voice: String,
    base_url: String,
    client: reqwest::Client,
}

impl SpeechSynthesizer {
    pub fn new(api_key: String, model: String, voice: String, base_url: String) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            api_key,
            model,
            voice,
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SpeechSynth for SpeechSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, SynthesisError> {
        let request = serde_json::json!({
            "model": self.model,
            "voice": self.voice,
            "input": text,
            "response_format": "mp3"
        });

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(AudioClip::from_bytes(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_clip_has_mp3_suffix() {
        let clip = AudioClip::from_bytes(b"fake mp3 payload").unwrap();
        assert!(clip.path().extension().and_then(|e| e.to_str()) == Some("mp3"));
        assert_eq!(std::fs::read(clip.path()).unwrap(), b"fake mp3 payload");
    }

    #[test]
    fn test_dropping_clip_deletes_the_file() {
        let clip = AudioClip::from_bytes(b"payload").unwrap();
        let path = clip.path().to_path_buf();
        assert!(path.exists());
        drop(clip);
        assert!(!path.exists());
    }
}
