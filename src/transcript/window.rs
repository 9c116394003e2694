//! Fixed-window grouping of speech segments into transcript chunks.

use super::{SpeechSegment, TranscriptChunk};

/// Shortest window used; smaller positive values are raised to this.
pub const MIN_WINDOW_SECONDS: f64 = 0.01;

/// Group speech segments into fixed-duration windows.
///
/// Windows run from 0 to the end of the last segment. A segment belongs to
/// the window containing its start time. Windows without text are skipped, so
/// chunk boundaries stay on the window grid even across silence.
///
/// Returns no chunks for a non-positive window or a non-finite end time.
pub fn chunk_by_window(segments: &[SpeechSegment], window_seconds: f64) -> Vec<TranscriptChunk> {
    let mut chunks = Vec::new();

    if segments.is_empty() || window_seconds.is_nan() || window_seconds <= 0.0 {
        return chunks;
    }

    let total_duration = segments.last().map(|s| s.end).unwrap_or(0.0);
    if !total_duration.is_finite() {
        return chunks;
    }
    let window_seconds = window_seconds.max(MIN_WINDOW_SECONDS);
    let mut window_start: f64 = 0.0;

    while window_start < total_duration {
        let window_end = (window_start + window_seconds).min(total_duration);
        if window_end <= window_start {
            break;
        }

        let text = segments
            .iter()
            .filter(|s| s.start >= window_start && s.start < window_end)
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if !text.is_empty() {
            chunks.push(TranscriptChunk::new(window_start, window_end, text));
        }

        window_start = window_end;
    }

    chunks
}
