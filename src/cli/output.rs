//! CLI output formatting utilities.

use crate::segments::SegmentResult;
use crate::transcript::TranscriptRecord;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a stored transcript.
    pub fn transcript_info(record: &TranscriptRecord, active: bool) {
        let marker = if active { style("*").green() } else { style("*").cyan() };
        println!(
            "  {} {} ({}, {} chunks, {}){}",
            marker,
            style(&record.source_filename).bold(),
            style(&record.id).dim(),
            record.chunk_count,
            format_duration(record.duration_seconds),
            if active { style(" [active]").green().to_string() } else { String::new() }
        );
    }

    /// Print the segments of a search result.
    pub fn segment_result(result: &SegmentResult) {
        if !result.is_success() {
            Self::error(result.error.as_deref().unwrap_or("Unknown error"));
            return;
        }

        if result.segments.is_empty() {
            Self::info("No segments found.");
            return;
        }

        for (i, formatted) in result.segments.iter().enumerate() {
            println!(
                "\n{} {} {} (score: {:.1}/10)",
                style(format!("{}.", i + 1)).green().bold(),
                style(&formatted.timestamp_display).cyan().bold(),
                style(format!("[{:.1}s - {:.1}s]", formatted.segment.start, formatted.segment.end)).dim(),
                formatted.segment.relevance_score
            );
            println!("   {}", content_preview(&formatted.segment.explanation, 300));
        }

        if let Some(summary) = &result.summary {
            Self::header("Summary");
            println!("{}", summary);
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Format duration in seconds to a human-readable string.
fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Truncate content with ellipsis, on a character boundary.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
