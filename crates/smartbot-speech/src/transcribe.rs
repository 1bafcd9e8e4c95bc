//! Remote speech recognition over an OpenAI-compatible transcription endpoint.

use std::io::Cursor;

use async_trait::async_trait;
use hound::{SampleFormat, WavSpec, WavWriter};
use reqwest::multipart::{Form, Part};

use smartbot_types::SpeechError;

use crate::capture::{self, TARGET_SAMPLE_RATE};
use crate::SpeechCapture;

/// Captures microphone audio and transcribes it via the remote
/// speech-recognition service.
pub struct MicrophoneRecognizer {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl MicrophoneRecognizer {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            api_key,
            model,
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Send recorded samples to the transcription endpoint.
    async fn transcribe(&self, samples: Vec<f32>) -> Result<String, SpeechError> {
        let wav_data = samples_to_wav(&samples)?;

        let audio_part = Part::bytes(wav_data)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| SpeechError::Unavailable(format!("failed to build request: {}", e)))?;
        let form = Form::new()
            .part("file", audio_part)
            .text("model", self.model.clone())
            .text("response_format", "text")
            .text("temperature", "0");

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| SpeechError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Unavailable(format!(
                "transcription failed with status {}: {}",
                status, body
            )));
        }

        let transcript = response
            .text()
            .await
            .map_err(|e| SpeechError::Unavailable(e.to_string()))?
            .trim()
            .to_string();

        // The service answered but heard nothing intelligible.
        if transcript.is_empty() {
            return Err(SpeechError::Ambiguous);
        }
        Ok(transcript)
    }
}

#[async_trait]
impl SpeechCapture for MicrophoneRecognizer {
    async fn capture_and_transcribe(&self) -> Result<String, SpeechError> {
        // The cpal stream must live and die on one thread.
        let samples = tokio::task::spawn_blocking(capture::record_utterance)
            .await
            .map_err(|e| SpeechError::Unavailable(format!("capture task failed: {}", e)))??;

        if samples.is_empty() {
            return Err(SpeechError::Ambiguous);
        }
        self.transcribe(samples).await
    }
}

/// Encode f32 samples as a 16-bit mono WAV at the capture rate.
fn samples_to_wav(samples: &[f32]) -> Result<Vec<u8>, SpeechError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: TARGET_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut buffer, spec)
            .map_err(|e| SpeechError::Unavailable(format!("WAV encoding failed: {}", e)))?;
        for &sample in samples {
            let sample_i16 = (sample * 32_767.0).clamp(-32_768.0, 32_767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| SpeechError::Unavailable(format!("WAV encoding failed: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| SpeechError::Unavailable(format!("WAV encoding failed: {}", e)))?;
    }
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_to_wav_round_trips_through_hound() {
        let samples = vec![0.0_f32, 0.5, -0.5, 1.0, -1.0];
        let wav = samples_to_wav(&samples).unwrap();

        let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, TARGET_SAMPLE_RATE);
        assert_eq!(spec.bits_per_sample, 16);

        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded.len(), samples.len());
        assert_eq!(decoded[0], 0);
        assert_eq!(decoded[3], 32_767);
    }

    #[test]
    fn test_samples_to_wav_clamps_out_of_range() {
        let wav = samples_to_wav(&[2.0, -2.0]).unwrap();
        let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, vec![32_767, -32_768]);
    }
}
