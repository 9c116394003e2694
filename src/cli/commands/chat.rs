//! Interactive chat command.

use crate::chat::{ChatEngine, ChatSession};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::llm::OpenAICompleter;
use crate::transcript::FileTranscriptStore;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

/// Run the interactive chat command.
pub async fn run_chat(transcript: Option<String>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Chat, &settings.llm) {
        Output::error(&format!("{}", e));
        Output::info("Run 'clipscout doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;
    let engine = ChatEngine::new(
        Arc::new(FileTranscriptStore::new(settings.transcript_dir())),
        Arc::new(OpenAICompleter::from_settings(&settings.llm)?),
    )
    .with_prompts(prompts);

    let mut session = ChatSession::new(uuid::Uuid::new_v4().to_string());

    println!("\n{}", style("Clipscout Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about the video, or 'exit' to quit. Use 'clear' to reset conversation.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            session.clear();
            Output::info("Conversation history cleared.");
            continue;
        }

        match engine.ask(&mut session, input, transcript.as_deref()).await {
            Ok(response) => {
                println!("\n{} {}\n", style("Clipscout:").cyan().bold(), response);
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}
