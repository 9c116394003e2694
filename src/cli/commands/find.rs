//! Find command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::SegmentFinder;
use anyhow::Result;

/// Run the find command.
pub async fn run_find(
    query: &str,
    transcript: Option<&str>,
    no_summary: bool,
    json: bool,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Find, &settings.llm) {
        Output::error(&format!("{}", e));
        Output::info("Run 'clipscout doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let mut finder = SegmentFinder::new(&settings)?;
    if no_summary {
        finder = finder.with_summary(false);
    }

    let spinner = Output::spinner("Searching transcript...");
    let result = finder.find_best_segments_in(query, transcript).await;
    spinner.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        Output::header(&format!("Segments for: {}", query));
        Output::segment_result(&result);
    }

    if !result.is_success() {
        anyhow::bail!(result.error.unwrap_or_else(|| "Segment search failed".to_string()));
    }

    Ok(())
}
