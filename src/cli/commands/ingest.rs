//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::ingest::Ingestor;
use anyhow::Result;
use std::path::Path;

/// Run the ingest command.
pub async fn run_ingest(video: &Path, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest, &settings.llm) {
        Output::error(&format!("{}", e));
        Output::info("Run 'clipscout doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let ingestor = Ingestor::new(&settings)?;

    let spinner = Output::spinner(&format!("Transcribing {}...", video.display()));
    let result = ingestor.ingest_file(video).await;
    spinner.finish_and_clear();

    match result {
        Ok(result) => {
            Output::success(&result.message);
            Output::kv("Transcript", &result.transcript_id);
            Output::kv("Chunks", &result.chunk_count.to_string());
            Output::kv("File", &result.transcript_file);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Ingest failed: {}", e));
            Err(e.into())
        }
    }
}
