//! Conversation logging for smartbot
//!
//! One JSONL file per session under `~/.smartbot/logs`, plus small helpers
//! shared by the app crate. Logging failures never abort a session; callers
//! drop the logger and continue.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

#[derive(Serialize)]
struct LogEntry {
    timestamp: String, // ISO-8601 local time
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
}

/// Appends one JSON line per conversation event to a session-scoped file.
pub struct ConversationLogger {
    file_path: PathBuf,
    file: tokio::fs::File,
}

impl ConversationLogger {
    /// Create a new logger; the file name carries the session start time.
    pub async fn new(logs_dir: &Path) -> Result<Self> {
        fs::create_dir_all(logs_dir).await?;

        let now_local = Local::now();
        let filename = format!("smartbot-{}.jsonl", now_local.format("%Y-%m-%d-%H%M%S"));
        let file_path = logs_dir.join(filename);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .await?;
        Ok(Self { file_path, file })
    }

    /// Append a single entry. Errors are reported, not propagated; a broken
    /// log must not take the session down.
    pub async fn log(&mut self, role: &str, content: &str, model: Option<&str>) {
        let entry = LogEntry {
            timestamp: Local::now().to_rfc3339(),
            role: role.to_string(),
            content: content.to_string(),
            model: model.map(|s| s.to_string()),
        };

        let line = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("Failed to serialize log entry: {}", e);
                return;
            }
        };

        if let Err(e) = self.file.write_all(format!("{}\n", line).as_bytes()).await {
            eprintln!("Failed to write log entry: {}", e);
            return;
        }
        if let Err(e) = self.file.flush().await {
            eprintln!("Failed to flush log entry: {}", e);
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

/// Get or create the base smartbot directory (~/.smartbot)
pub fn get_smartbot_dir() -> Result<PathBuf> {
    let home_dir = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Failed to get home directory")?;

    let dir = PathBuf::from(home_dir).join(".smartbot");
    if !dir.exists() {
        std::fs::create_dir_all(&dir).context("Failed to create smartbot directory")?;
    }
    Ok(dir)
}

/// Get or create the logs directory (~/.smartbot/logs)
pub fn get_logs_dir() -> Result<PathBuf> {
    let logs_dir = get_smartbot_dir()?.join("logs");
    if !logs_dir.exists() {
        std::fs::create_dir_all(&logs_dir).context("Failed to create logs directory")?;
    }
    Ok(logs_dir)
}

/// Safely truncate a string to a maximum number of characters
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let trunc_chars = if max_chars >= 3 { max_chars - 3 } else { 0 };
        format!("{}...", s.chars().take(trunc_chars).collect::<String>())
    }
}
