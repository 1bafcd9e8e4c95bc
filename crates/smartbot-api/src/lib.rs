//! Remote chat session for smartbot
//!
//! One `ChatSession` lives for the whole process: it owns the conversation
//! history, prepends the PDF context to each question, and hands the combined
//! payload to an `LlmClient` backend. The default backend streams from an
//! OpenAI-compatible endpoint and materializes the whole answer before
//! returning.

use async_trait::async_trait;

use smartbot_types::{ChatMessage, UpstreamError, MAX_HISTORY_BYTES};

mod groq_client;
pub use groq_client::GroqChatClient;

/// Backend seam for the remote chat model. The production implementation is
/// [`GroqChatClient`]; tests substitute mocks.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Submit the full conversation and return the assistant's reply.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, UpstreamError>;
}

/// A single ongoing dialogue with the remote model.
///
/// Every turn appends the context+question user message and the assistant
/// reply to the history, so the model keeps conversational memory across
/// turns. A failed turn leaves the history untouched.
pub struct ChatSession {
    client: Box<dyn LlmClient>,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(client: Box<dyn LlmClient>) -> Self {
        Self {
            client,
            messages: Vec::new(),
        }
    }

    /// Ask a question against the given document context.
    ///
    /// The payload is `context`, a blank line, then `question` (just the
    /// question when the context is empty). At-most-once: on upstream failure
    /// the pending user message is removed and the error is returned.
    pub async fn ask(&mut self, question: &str, context: &str) -> Result<String, UpstreamError> {
        let full_message = if context.is_empty() {
            question.to_string()
        } else {
            format!("{}\n\n{}", context, question)
        };

        self.messages.push(ChatMessage::user(full_message));
        trim_history(&mut self.messages);

        match self.client.complete(&self.messages).await {
            Ok(answer) => {
                self.messages.push(ChatMessage::assistant(answer.clone()));
                Ok(answer)
            }
            Err(e) => {
                // Discard the turn so the next request doesn't resend it.
                self.messages.pop();
                Err(e)
            }
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.messages
    }
}

/// Serialized size of the conversation as it would go over the wire
fn conversation_size(messages: &[ChatMessage]) -> usize {
    serde_json::to_string(messages).map(|s| s.len()).unwrap_or(0)
}

/// Drop oldest turns until the history fits the byte budget. The most recent
/// message (the turn about to be sent) is never dropped.
fn trim_history(messages: &mut Vec<ChatMessage>) {
    while messages.len() > 1 && conversation_size(messages) > MAX_HISTORY_BYTES {
        messages.remove(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CannedClient {
        answer: String,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl LlmClient for CannedClient {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.clone())
        }
    }

    struct FailingClient;

    #[async_trait]
    impl LlmClient for FailingClient {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, UpstreamError> {
            Err(UpstreamError::Api {
                status: 500,
                body: "boom".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_ask_prepends_context_and_records_both_sides() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut session = ChatSession::new(Box::new(CannedClient {
            answer: "42".to_string(),
            calls: calls.clone(),
        }));

        let answer = session.ask("What is mentioned?", "Alpha Beta").await.unwrap();
        assert_eq!(answer, "42");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[0].content, "Alpha Beta\n\nWhat is mentioned?");
        assert_eq!(history[1].role, "assistant");
        assert_eq!(history[1].content, "42");
    }

    #[tokio::test]
    async fn test_failed_turn_leaves_history_unchanged() {
        let mut session = ChatSession::new(Box::new(FailingClient));

        let err = session.ask("question", "context").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Api { status: 500, .. }));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_history_accumulates_across_turns() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut session = ChatSession::new(Box::new(CannedClient {
            answer: "ok".to_string(),
            calls: calls.clone(),
        }));

        session.ask("first", "ctx").await.unwrap();
        session.ask("second", "ctx").await.unwrap();
        assert_eq!(session.history().len(), 4);
    }

    #[test]
    fn test_trim_history_drops_oldest_first() {
        let big = "x".repeat(MAX_HISTORY_BYTES / 2);
        let mut messages = vec![
            ChatMessage::user(big.clone()),
            ChatMessage::assistant(big.clone()),
            ChatMessage::user(big),
            ChatMessage::user("latest"),
        ];
        trim_history(&mut messages);
        assert!(conversation_size(&messages) <= MAX_HISTORY_BYTES);
        assert_eq!(messages.last().unwrap().content, "latest");
    }

    #[test]
    fn test_trim_history_never_drops_the_pending_message() {
        let huge = "x".repeat(MAX_HISTORY_BYTES * 2);
        let mut messages = vec![ChatMessage::user(huge)];
        trim_history(&mut messages);
        assert_eq!(messages.len(), 1);
    }
}
