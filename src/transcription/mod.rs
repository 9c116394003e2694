//! Speech-to-text for uploaded videos.
//!
//! Speech recognition itself is delegated to the Whisper API; this module
//! handles request plumbing and stitching split audio back together.

mod whisper;

pub use whisper::{merge_pieces, WhisperTranscriber};

use crate::error::Result;
use crate::transcript::SpeechSegment;
use async_trait::async_trait;
use std::path::Path;

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file into timed speech segments, in time order.
    async fn transcribe(&self, audio_path: &Path) -> Result<Vec<SpeechSegment>>;
}
