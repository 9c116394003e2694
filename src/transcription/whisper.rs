//! OpenAI Whisper transcription implementation.

use super::Transcriber;
use crate::audio::split_audio;
use crate::config::{LlmSettings, TranscriptionSettings};
use crate::error::{ClipscoutError, Result};
use crate::openai::create_client;
use crate::transcript::SpeechSegment;
use async_openai::types::{AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::{debug, info, instrument};

/// OpenAI Whisper-based transcriber.
pub struct WhisperTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    split_seconds: u32,
    max_concurrent: usize,
}

impl WhisperTranscriber {
    /// Create a transcriber. Uses the LLM endpoint and credentials.
    pub fn from_settings(llm: &LlmSettings, transcription: &TranscriptionSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(llm)?,
            model: transcription.model.clone(),
            split_seconds: transcription.split_seconds,
            max_concurrent: transcription.max_concurrent.max(1),
        })
    }

    /// Transcribe a single audio file (no splitting).
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_single(&self, audio_path: &Path) -> Result<Vec<SpeechSegment>> {
        debug!("Transcribing audio file");

        let file_bytes = tokio::fs::read(audio_path).await?;

        let request = CreateTranscriptionRequestArgs::default()
            .file(async_openai::types::AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson)
            .build()
            .map_err(|e| ClipscoutError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| ClipscoutError::Transcription(format!("Whisper API error: {}", e)))?;

        let segments: Vec<SpeechSegment> = response
            .segments
            .map(|segs| {
                segs.iter()
                    .map(|s| SpeechSegment::new(s.start as f64, s.end as f64, s.text.trim()))
                    .collect()
            })
            .unwrap_or_else(|| {
                vec![SpeechSegment::new(0.0, response.duration as f64, response.text.trim())]
            });

        debug!("Transcribed {} segments", segments.len());
        Ok(segments)
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<Vec<SpeechSegment>> {
        let temp_dir = tempfile::tempdir()?;
        let pieces = split_audio(audio_path, temp_dir.path(), self.split_seconds).await?;

        if pieces.len() == 1 {
            return self.transcribe_single(audio_path).await;
        }

        let piece_count = pieces.len();
        info!("Transcribing {} audio pieces with {}", piece_count, self.model);

        let pb = ProgressBar::new(piece_count as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} Whisper   [{bar:30.cyan/blue}] {pos}/{len}")
                .map_err(|e| ClipscoutError::Transcription(e.to_string()))?
                .progress_chars("█▓░"),
        );

        let mut results = Vec::with_capacity(piece_count);
        let mut stream = stream::iter(pieces.into_iter().enumerate())
            .map(|(idx, (piece_path, offset))| async move {
                let result = self.transcribe_single(&piece_path).await;
                (idx, offset, result)
            })
            .buffer_unordered(self.max_concurrent);

        while let Some((idx, offset, result)) = stream.next().await {
            pb.inc(1);
            match result {
                Ok(segments) => results.push((idx, offset, segments)),
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(ClipscoutError::Transcription(format!(
                        "Piece {} at {:.0}s failed: {}",
                        idx, offset, e
                    )));
                }
            }
        }

        pb.finish_and_clear();
        Ok(merge_pieces(results))
    }
}

/// Merge per-piece segments into one timeline, shifting by each piece's offset.
pub fn merge_pieces(mut results: Vec<(usize, f64, Vec<SpeechSegment>)>) -> Vec<SpeechSegment> {
    results.sort_by_key(|(idx, _, _)| *idx);

    results
        .into_iter()
        .flat_map(|(_, offset, segments)| {
            segments.into_iter().map(move |mut s| {
                s.start += offset;
                s.end += offset;
                s
            })
        })
        .collect()
}
