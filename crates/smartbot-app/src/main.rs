use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use smartbot::cli::Cli;
use smartbot::config::AppConfig;
use smartbot::feedback::{FeedbackSink, JsonlFeedbackSink, NoopFeedbackSink};
use smartbot::repl;
use smartbot::session::SessionController;

use smartbot_api::{ChatSession, GroqChatClient};
use smartbot_logging::{get_logs_dir, ConversationLogger};
use smartbot_speech::{MicrophoneRecognizer, SpeechSynthesizer};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = match AppConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "❌".bright_red(), e);
            std::process::exit(1);
        }
    };

    if config.verbose {
        eprintln!(
            "{} api_url={} chat={} stt={} tts={}/{}",
            "🔧".bright_cyan(),
            config.api_url,
            config.chat_model,
            config.stt_model,
            config.tts_model,
            config.tts_voice
        );
    }

    let chat = ChatSession::new(Box::new(GroqChatClient::new(
        config.api_key.clone(),
        config.chat_model.clone(),
        config.api_url.clone(),
    )));
    let capture = Box::new(MicrophoneRecognizer::new(
        config.api_key.clone(),
        config.stt_model.clone(),
        config.api_url.clone(),
    ));
    let synth = Box::new(SpeechSynthesizer::new(
        config.api_key.clone(),
        config.tts_model.clone(),
        config.tts_voice.clone(),
        config.api_url.clone(),
    ));

    // A broken log file degrades to no logging, never to a dead session.
    let feedback: Box<dyn FeedbackSink> = match logger(&config).await {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!("{} Conversation logging disabled: {}", "⚠️".bright_yellow(), e);
            Box::new(NoopFeedbackSink)
        }
    };

    let mut session =
        SessionController::new(chat, capture, synth, feedback, config.audio_enabled);

    if !cli.docs.is_empty() {
        match session.load_documents(&cli.docs).await {
            Ok(summary) => println!(
                "{} Preloaded {} PDF file(s)",
                "📂".bright_green(),
                summary.files
            ),
            Err(e) => eprintln!("{} Failed to preload documents: {}", "❌".bright_red(), e),
        }
    }

    repl::run(session).await
}

async fn logger(config: &AppConfig) -> Result<Box<dyn FeedbackSink>> {
    let logs_dir = get_logs_dir()?;
    let logger = ConversationLogger::new(&logs_dir).await?;
    if config.verbose {
        eprintln!(
            "{} Logging conversation to {}",
            "📝".bright_cyan(),
            logger.path().display()
        );
    }
    Ok(Box::new(JsonlFeedbackSink::new(
        logger,
        config.chat_model.clone(),
    )))
}
