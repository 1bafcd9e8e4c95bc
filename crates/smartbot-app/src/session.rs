//! Session controller: per-session state plus the routing for the two input
//! paths (typed and spoken). Holds exactly two persistent fields — the
//! extracted PDF context and the most recent synthesized clip — and never
//! lets a remote failure take the session down.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use smartbot_api::ChatSession;
use smartbot_logging::safe_truncate;
use smartbot_speech::{AudioClip, SpeechCapture, SpeechSynth};
use smartbot_types::{SpeechError, MAX_UPLOAD_FILES};

use crate::feedback::FeedbackSink;

/// Shown whenever a question arrives before any PDFs are loaded
pub const GUIDANCE_MESSAGE: &str = "Please upload PDFs first (use /load <path>...).";

/// Per-session mutable state. Passed around explicitly; there is no global.
struct SessionState {
    pdf_context: String,
    /// RAII guard for the newest synthesized clip; replacing or clearing it
    /// deletes the file on disk.
    latest_audio: Option<AudioClip>,
}

/// Result of one batch document load
#[derive(Debug)]
pub struct LoadSummary {
    pub files: usize,
    pub context_chars: usize,
    pub over_soft_cap: bool,
}

/// Outcome of one question turn, rendered by the REPL
pub enum TurnOutcome {
    /// No context loaded; the guidance message is the only response.
    NoContext,
    /// Speech capture produced no usable text; no downstream work happened.
    Recognition(SpeechError),
    /// The chat call failed; the turn was discarded.
    TurnFailed(String),
    /// A completed turn.
    Answer {
        question: String,
        answer: String,
        audio_path: Option<PathBuf>,
        synthesis_error: Option<String>,
    },
}

pub struct SessionController {
    state: SessionState,
    chat: ChatSession,
    capture: Box<dyn SpeechCapture>,
    synth: Box<dyn SpeechSynth>,
    feedback: Box<dyn FeedbackSink>,
    audio_enabled: bool,
}

impl SessionController {
    pub fn new(
        chat: ChatSession,
        capture: Box<dyn SpeechCapture>,
        synth: Box<dyn SpeechSynth>,
        feedback: Box<dyn FeedbackSink>,
        audio_enabled: bool,
    ) -> Self {
        Self {
            state: SessionState {
                pdf_context: String::new(),
                latest_audio: None,
            },
            chat,
            capture,
            synth,
            feedback,
            audio_enabled,
        }
    }

    pub fn has_context(&self) -> bool {
        !self.state.pdf_context.is_empty()
    }

    pub fn context(&self) -> &str {
        &self.state.pdf_context
    }

    /// First few lines of the context, each truncated for console display.
    pub fn context_preview(&self, max_lines: usize, max_chars: usize) -> Vec<String> {
        self.state
            .pdf_context
            .lines()
            .take(max_lines)
            .map(|line| safe_truncate(line, max_chars))
            .collect()
    }

    pub fn latest_audio_path(&self) -> Option<&Path> {
        self.state.latest_audio.as_ref().map(|clip| clip.path())
    }

    /// Drop the current clip (deleting its file) and clear the path field.
    pub fn clear_audio(&mut self) {
        self.state.latest_audio = None;
    }

    /// Stage the given PDF files (or directories of PDFs) into a temporary
    /// directory, extract their text, and *replace* the session context.
    /// Re-loading is a deliberate reset of the working set, not an append.
    pub async fn load_documents(&mut self, paths: &[PathBuf]) -> Result<LoadSummary> {
        let files = collect_pdf_paths(paths)?;
        if files.is_empty() {
            bail!("no .pdf files found in the given paths");
        }

        // Staging mirrors the upload surface: documents are materialized
        // into a temp dir for the duration of extraction, then removed.
        let staging = tempfile::tempdir().context("failed to create staging directory")?;
        for file in &files {
            let name = file
                .file_name()
                .with_context(|| format!("invalid file name: {}", file.display()))?;
            std::fs::copy(file, staging.path().join(name))
                .with_context(|| format!("failed to stage {}", file.display()))?;
        }

        let context = smartbot_pdf::extract_all(staging.path())?;
        self.state.pdf_context = context;

        Ok(LoadSummary {
            files: files.len(),
            context_chars: self.state.pdf_context.chars().count(),
            over_soft_cap: files.len() > MAX_UPLOAD_FILES,
        })
    }

    /// Typed input path. With no context loaded the remote model is never
    /// reached; otherwise the full turn runs: ask, synthesize, record.
    pub async fn handle_typed(&mut self, question: &str) -> TurnOutcome {
        if !self.has_context() {
            return TurnOutcome::NoContext;
        }
        self.run_turn(question.to_string()).await
    }

    /// Spoken input path. Gated on context presence *before* capture so an
    /// unanswerable question never opens the microphone.
    pub async fn handle_spoken(&mut self) -> TurnOutcome {
        if !self.has_context() {
            return TurnOutcome::NoContext;
        }
        match self.capture.capture_and_transcribe().await {
            Ok(question) => self.run_turn(question).await,
            Err(e) => TurnOutcome::Recognition(e),
        }
    }

    async fn run_turn(&mut self, question: String) -> TurnOutcome {
        let answer = match self.chat.ask(&question, &self.state.pdf_context).await {
            Ok(answer) => answer,
            Err(e) => return TurnOutcome::TurnFailed(e.to_string()),
        };

        // A synthesis failure degrades to a text-only answer.
        let mut synthesis_error = None;
        let mut audio_path = None;
        if self.audio_enabled {
            match self.synth.synthesize(&answer).await {
                Ok(clip) => {
                    audio_path = Some(clip.path().to_path_buf());
                    // Replacing the guard deletes the previous clip.
                    self.state.latest_audio = Some(clip);
                }
                Err(e) => synthesis_error = Some(e.to_string()),
            }
        }

        if let Err(e) = self.feedback.record(&question, &answer).await {
            eprintln!("Failed to record turn: {}", e);
        }

        TurnOutcome::Answer {
            question,
            answer,
            audio_path,
            synthesis_error,
        }
    }
}

/// Expand the given paths into concrete PDF file paths, sorted by name.
/// Directories contribute their direct `.pdf` children (case-sensitive
/// suffix, matching the extraction filter).
fn collect_pdf_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let entries = std::fs::read_dir(path)
                .with_context(|| format!("failed to read directory {}", path.display()))?;
            for entry in entries {
                let candidate = entry?.path();
                if candidate.is_file() && has_pdf_suffix(&candidate) {
                    files.push(candidate);
                }
            }
        } else if path.is_file() {
            if !has_pdf_suffix(path) {
                bail!("not a .pdf file: {}", path.display());
            }
            files.push(path.clone());
        } else {
            bail!("no such file or directory: {}", path.display());
        }
    }
    files.sort();
    Ok(files)
}

/// Case-sensitive suffix match, same filter the batch extraction applies
fn has_pdf_suffix(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(".pdf"))
        .unwrap_or(false)
}
