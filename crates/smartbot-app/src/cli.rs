use std::path::PathBuf;

use clap::Parser;

/// CLI arguments for smartbot
#[derive(Parser)]
#[command(name = "smartbot")]
#[command(about = "SmartBot - ask questions about your PDFs, typed or spoken")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// PDF files or directories to load at startup (same as /load in the REPL)
    #[arg(long, value_name = "PATH", num_args = 1..)]
    pub docs: Vec<PathBuf>,

    /// API base URL (OpenAI-compatible; chat, transcription and synthesis
    /// all live under it)
    #[arg(long, value_name = "URL", env = "SMARTBOT_API_URL")]
    pub api_url: Option<String>,

    /// Override the chat model
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Override the speech-recognition model
    #[arg(long, value_name = "MODEL")]
    pub stt_model: Option<String>,

    /// Override the text-to-speech voice
    #[arg(long, value_name = "VOICE")]
    pub tts_voice: Option<String>,

    /// Text answers only: skip speech synthesis and playback
    #[arg(long)]
    pub no_audio: bool,

    /// Enable verbose debug output
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
