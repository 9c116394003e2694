//! Caller-facing formatting of selected segments.

use super::VideoSegment;
use crate::config::Prompts;
use crate::llm::Completer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{instrument, warn};

/// A segment plus its display string, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedSegment {
    #[serde(flatten)]
    pub segment: VideoSegment,
    /// `M:SS - M:SS`
    pub timestamp_display: String,
}

impl From<VideoSegment> for FormattedSegment {
    fn from(segment: VideoSegment) -> Self {
        let timestamp_display = timestamp_display(segment.start, segment.end);
        Self {
            segment,
            timestamp_display,
        }
    }
}

/// Format seconds as `M:SS`, flooring to whole seconds. Minutes are unbounded.
pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Format a time range as `M:SS - M:SS`.
pub fn timestamp_display(start: f64, end: f64) -> String {
    format!("{} - {}", format_timestamp(start), format_timestamp(end))
}

pub fn format_segments(segments: Vec<VideoSegment>) -> Vec<FormattedSegment> {
    segments.into_iter().map(FormattedSegment::from).collect()
}

/// Listing used when no summary can be generated.
pub fn plain_listing(segments: &[VideoSegment]) -> String {
    if segments.is_empty() {
        return "No segments found.".to_string();
    }
    let ranges = segments
        .iter()
        .map(|s| timestamp_display(s.start, s.end))
        .collect::<Vec<_>>()
        .join(", ");
    format!("Segments found: {}", ranges)
}

/// Ask the model for a readable summary of the selected segments.
///
/// Best effort: any LLM failure is logged and replaced by [`plain_listing`].
#[instrument(skip_all, fields(segments = segments.len()))]
pub async fn summarize(
    completer: &dyn Completer,
    prompts: &Prompts,
    query: &str,
    segments: &[VideoSegment],
) -> String {
    let prompt = build_summary_prompt(prompts, query, segments);

    match completer.complete(&prompt).await {
        Ok(summary) if !summary.trim().is_empty() => summary.trim().to_string(),
        Ok(_) => {
            warn!("Summary response was empty, using plain listing");
            plain_listing(segments)
        }
        Err(e) => {
            warn!("Summary generation failed, using plain listing: {}", e);
            plain_listing(segments)
        }
    }
}

fn build_summary_prompt(prompts: &Prompts, query: &str, segments: &[VideoSegment]) -> String {
    let listing = segments
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "Segment {}: {}s - {}s (Score: {}/10) - {}",
                i + 1,
                s.start,
                s.end,
                s.relevance_score,
                s.explanation
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let time_ranges = segments
        .iter()
        .map(|s| format!("({}, {})", s.start, s.end))
        .collect::<Vec<_>>()
        .join(", ");

    let mut vars = HashMap::new();
    vars.insert("query".to_string(), query.to_string());
    vars.insert("segments".to_string(), listing);
    vars.insert("time_ranges".to_string(), format!("[{}]", time_ranges));
    vars.insert("segment_count".to_string(), segments.len().to_string());

    prompts.render_with_custom(&prompts.selection.summary, &vars)
}
