//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::transcript::FileTranscriptStore;
use anyhow::Result;

/// Run the list command.
pub fn run_list(settings: Settings) -> Result<()> {
    let store = FileTranscriptStore::new(settings.transcript_dir());

    let records = match store.list() {
        Ok(records) => records,
        Err(e) => {
            Output::error(&format!("Failed to list transcripts: {}", e));
            return Err(e.into());
        }
    };

    if records.is_empty() {
        Output::info("No transcripts yet. Use 'clipscout ingest <video>' to add one.");
        return Ok(());
    }

    let active = store.active_id()?;

    Output::header(&format!("Transcripts ({})", records.len()));
    println!();

    for record in &records {
        Output::transcript_info(record, active.as_deref() == Some(record.id.as_str()));
    }

    let total_chunks: usize = records.iter().map(|r| r.chunk_count).sum();
    println!();
    Output::kv("Total transcripts", &records.len().to_string());
    Output::kv("Total chunks", &total_chunks.to_string());

    Ok(())
}
