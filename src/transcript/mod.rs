//! Time-segmented transcripts.
//!
//! A transcript is an ordered list of [`TranscriptChunk`]s, each covering a
//! fixed window of speech. The JSON form (`[{"start", "end", "text"}]`) is
//! shared with the ingest pipeline and any external transcription tooling.

mod store;
mod window;

pub use store::{FileTranscriptStore, TranscriptRecord, TranscriptSource};
pub use window::chunk_by_window;

use serde::{Deserialize, Serialize};

/// A window of transcribed speech with start/end time in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptChunk {
    /// Create a new transcript chunk.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Check the chunk against the transcript data model.
    pub fn is_valid(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start >= 0.0 && self.end > self.start
    }
}

/// A timed piece of speech as returned by the speech-to-text service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl SpeechSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// End of the transcript's time domain (0 when empty).
pub fn total_duration(chunks: &[TranscriptChunk]) -> f64 {
    chunks.iter().map(|c| c.end).fold(0.0, f64::max)
}

/// Render chunks as `[MM:SS] text` lines for chat context.
pub fn format_for_context(chunks: &[TranscriptChunk]) -> String {
    chunks
        .iter()
        .map(|c| {
            let total = c.start.max(0.0) as u64;
            format!("[{:02}:{:02}] {}", total / 60, total % 60, c.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
