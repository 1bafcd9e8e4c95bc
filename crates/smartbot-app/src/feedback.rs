use anyhow::Result;
use async_trait::async_trait;

use smartbot_logging::ConversationLogger;

/// Where completed turns go. Injected into the session controller so the
/// destination (log file, database, nothing at all) can be swapped without
/// touching routing logic.
#[async_trait]
pub trait FeedbackSink: Send {
    async fn record(&mut self, question: &str, answer: &str) -> Result<()>;
}

/// Appends each turn to the session's JSONL conversation log.
pub struct JsonlFeedbackSink {
    logger: ConversationLogger,
    model: String,
}

impl JsonlFeedbackSink {
    pub fn new(logger: ConversationLogger, model: String) -> Self {
        Self { logger, model }
    }
}

#[async_trait]
impl FeedbackSink for JsonlFeedbackSink {
    async fn record(&mut self, question: &str, answer: &str) -> Result<()> {
        self.logger.log("user", question, None).await;
        self.logger.log("assistant", answer, Some(&self.model)).await;
        Ok(())
    }
}

/// Discards turns; used when logging is unavailable and in tests.
pub struct NoopFeedbackSink;

#[async_trait]
impl FeedbackSink for NoopFeedbackSink {
    async fn record(&mut self, _question: &str, _answer: &str) -> Result<()> {
        Ok(())
    }
}
