use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::Value;

use smartbot_types::{ChatMessage, UpstreamError};

use crate::LlmClient;

/// Chat client for OpenAI-compatible endpoints (Groq by default).
///
/// Responses are always requested as a stream and fully materialized before
/// being returned to the caller; SSE handling stays internal.
pub struct GroqChatClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GroqChatClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        // Ensure base_url doesn't end with a slash
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            api_key,
            model,
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl LlmClient for GroqChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, UpstreamError> {
        let request = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": true
        });

        let response = self
            .client
            .post(self.chat_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let mut byte_stream = response.bytes_stream();
        let mut line_buffer = String::new();
        let mut answer = String::new();

        'stream: while let Some(chunk_result) = byte_stream.next().await {
            let chunk = chunk_result?;
            for ch in String::from_utf8_lossy(&chunk).chars() {
                if ch == '\n' {
                    let line = std::mem::take(&mut line_buffer);
                    match parse_sse_line(&line) {
                        Some(SseEvent::Delta(text)) => answer.push_str(&text),
                        Some(SseEvent::Done) => break 'stream,
                        None => {}
                    }
                } else {
                    line_buffer.push(ch);
                }
            }
        }

        // Process any remaining data in the buffer
        if let Some(SseEvent::Delta(text)) = parse_sse_line(&line_buffer) {
            answer.push_str(&text);
        }

        if answer.is_empty() {
            return Err(UpstreamError::EmptyResponse);
        }
        Ok(answer)
    }
}

/// A single parsed server-sent event from the chat stream
#[derive(Debug, PartialEq)]
pub(crate) enum SseEvent {
    Delta(String),
    Done,
}

/// Parse one SSE line; returns the text delta it carries, if any.
/// Non-data lines and malformed payloads are skipped.
pub(crate) fn parse_sse_line(line: &str) -> Option<SseEvent> {
    let data = line.strip_prefix("data: ")?;

    if data.trim() == "[DONE]" {
        return Some(SseEvent::Done);
    }

    let json: Value = serde_json::from_str(data).ok()?;
    let delta = json["choices"][0]["delta"]["content"].as_str()?;
    if delta.is_empty() {
        return None;
    }
    Some(SseEvent::Delta(delta.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sse_line_delta() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#;
        assert_eq!(
            parse_sse_line(line),
            Some(SseEvent::Delta("Hello".to_string()))
        );
    }

    #[test]
    fn test_parse_sse_line_done() {
        assert_eq!(parse_sse_line("data: [DONE]"), Some(SseEvent::Done));
    }

    #[test]
    fn test_parse_sse_line_skips_non_data_lines() {
        assert_eq!(parse_sse_line(": keep-alive"), None);
        assert_eq!(parse_sse_line(""), None);
        assert_eq!(parse_sse_line("event: ping"), None);
    }

    #[test]
    fn test_parse_sse_line_skips_malformed_payloads() {
        assert_eq!(parse_sse_line("data: {not json"), None);
        assert_eq!(parse_sse_line(r#"data: {"choices":[]}"#), None);
    }

    #[test]
    fn test_deltas_concatenate_in_order() {
        let lines = [
            r#"data: {"choices":[{"delta":{"content":"one "}}]}"#,
            r#"data: {"choices":[{"delta":{"content":"two "}}]}"#,
            r#"data: {"choices":[{"delta":{"content":"three"}}]}"#,
            "data: [DONE]",
        ];
        let mut answer = String::new();
        for line in lines {
            match parse_sse_line(line) {
                Some(SseEvent::Delta(t)) => answer.push_str(&t),
                Some(SseEvent::Done) => break,
                None => {}
            }
        }
        assert_eq!(answer, "one two three");
    }
}
