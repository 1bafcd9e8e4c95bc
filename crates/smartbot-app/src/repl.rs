//! Interactive loop: banner, prompt, slash commands, turn rendering.

use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

use smartbot_types::MAX_UPLOAD_FILES;

use crate::playback;
use crate::session::{LoadSummary, SessionController, TurnOutcome, GUIDANCE_MESSAGE};

pub fn print_banner() {
    println!("{}", "🤖 SmartBot — voice-enabled PDF Q&A".bright_cyan().bold());
    println!("{}", "Load PDFs with /load, then ask questions by typing or with /speak".bright_black());
    println!("{}", "Commands: /load <path>..., /speak, /context, /replay".bright_black());
    println!("{}", "Type 'exit' or 'quit' to exit\n".bright_black());
}

pub async fn run(mut session: SessionController) -> Result<()> {
    print_banner();

    let mut rl = DefaultEditor::new()?;

    loop {
        let context_indicator = if session.has_context() {
            "[docs]".bright_magenta()
        } else {
            "[no docs]".bright_black()
        };
        let readline = rl.readline(&format!("{} {} ", context_indicator, "You:".bright_green().bold()));

        match readline {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                if line == "exit" || line == "quit" {
                    println!("{}", "Goodbye!".bright_cyan());
                    break;
                }

                let _ = rl.add_history_entry(line);

                if line.starts_with("/load ") {
                    let paths = split_load_args(&line[6..]);
                    match session.load_documents(&paths).await {
                        Ok(summary) => print_load_summary(&summary),
                        Err(e) => eprintln!("{} Failed to load documents: {}", "❌".bright_red(), e),
                    }
                    continue;
                }

                if line == "/load" {
                    println!(
                        "{} Usage: /load <file-or-directory>... (quote paths containing spaces)",
                        "💡".bright_yellow()
                    );
                    continue;
                }

                if line == "/speak" {
                    if session.has_context() {
                        println!("{} {}", "🎤".bright_cyan(), "Listening...".bright_black());
                    }
                    let outcome = session.handle_spoken().await;
                    render_outcome(&outcome).await;
                    continue;
                }

                if line == "/context" {
                    print_context(&session);
                    continue;
                }

                if line == "/replay" {
                    match session.latest_audio_path() {
                        Some(path) => play(path.to_path_buf()).await,
                        None => println!("{} No answer audio to replay yet", "ℹ️".bright_blue()),
                    }
                    continue;
                }

                if line.starts_with('/') {
                    eprintln!("{} Unknown command: {}", "❌".bright_red(), line);
                    continue;
                }

                let outcome = session.handle_typed(line).await;
                render_outcome(&outcome).await;
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "Interrupted. Type 'exit' to quit.".bright_black());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".bright_cyan());
                break;
            }
            Err(err) => {
                eprintln!("{} Input error: {}", "❌".bright_red(), err);
                break;
            }
        }
    }

    Ok(())
}

fn print_load_summary(summary: &LoadSummary) {
    println!(
        "{} Loaded {} PDF file(s), {} characters of context",
        "📂".bright_green(),
        summary.files,
        summary.context_chars
    );
    if summary.over_soft_cap {
        println!(
            "{} More than {} files loaded; responses may slow down with large contexts",
            "⚠️".bright_yellow(),
            MAX_UPLOAD_FILES
        );
    }
}

fn print_context(session: &SessionController) {
    if !session.has_context() {
        println!("{} {}", "ℹ️".bright_blue(), GUIDANCE_MESSAGE);
        return;
    }
    println!(
        "{} {} characters of extracted text",
        "📄".bright_cyan(),
        session.context().chars().count()
    );
    // First few lines are enough to confirm the right documents loaded.
    for line in session.context_preview(8, 100) {
        println!("  {}", line.bright_black());
    }
}

/// Split `/load` arguments on whitespace, honoring single or double quotes
/// so paths containing spaces can be loaded.
fn split_load_args(input: &str) -> Vec<PathBuf> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for ch in input.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch.is_whitespace() => {
                if !current.is_empty() {
                    args.push(PathBuf::from(std::mem::take(&mut current)));
                }
            }
            None => current.push(ch),
        }
    }
    if !current.is_empty() {
        args.push(PathBuf::from(current));
    }
    args
}

async fn render_outcome(outcome: &TurnOutcome) {
    match outcome {
        TurnOutcome::NoContext => {
            println!("{} {}", "ℹ️".bright_blue(), GUIDANCE_MESSAGE.bright_yellow());
        }
        TurnOutcome::Recognition(e) => {
            eprintln!("{} {}", "🎤".bright_red(), e);
        }
        TurnOutcome::TurnFailed(msg) => {
            eprintln!("{} {}", "❌".bright_red(), msg);
        }
        TurnOutcome::Answer {
            question,
            answer,
            audio_path,
            synthesis_error,
        } => {
            println!("{} {}", "You asked:".bright_black(), question);
            println!("{} {}\n", "Bot:".bright_cyan().bold(), answer);
            if let Some(e) = synthesis_error {
                eprintln!("{} Audio unavailable: {}", "🔇".bright_yellow(), e);
            }
            if let Some(path) = audio_path {
                play(path.clone()).await;
            }
        }
    }
}

/// Decode and play an MP3 on a blocking thread; playback problems are
/// reported but never end the session.
async fn play(path: PathBuf) {
    let result = tokio::task::spawn_blocking(move || playback::play_mp3(&path)).await;
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => eprintln!("{} Playback failed: {}", "🔇".bright_yellow(), e),
        Err(e) => eprintln!("{} Playback task failed: {}", "🔇".bright_yellow(), e),
    }
}
