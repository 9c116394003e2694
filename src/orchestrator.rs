//! Segment search orchestrator.
//!
//! Runs one query through the selection pipeline:
//!
//! ```text
//! BuiltPrompt -> AwaitingLlm -> Parsing -> Parsed | Fallback -> Formatted -> Done
//! ```
//!
//! A missing transcript, an unreachable LLM, or an elapsed deadline ends in
//! `Error`. Unparseable model output is recovered by the fallback extractor
//! and a failed summary falls back to a plain listing; neither is reported
//! to the caller as a failure.

use crate::config::{Prompts, Settings};
use crate::error::{ClipscoutError, Result};
use crate::llm::{Completer, OpenAICompleter};
use crate::segments::{
    build_selection_prompt, extract_fallback, format_instructions, format_segments,
    pad_from_transcript, parse_segments, plain_listing, summarize, SegmentResult, VideoSegment,
    MAX_SEGMENTS,
};
use crate::transcript::{total_duration, FileTranscriptStore, TranscriptChunk, TranscriptSource};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Pipeline states, logged as a query advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    BuiltPrompt,
    AwaitingLlm,
    Parsing,
    Parsed,
    Fallback,
    Formatted,
    Done,
    Error,
}

/// Finds the transcript segments most relevant to a query.
pub struct SegmentFinder {
    transcripts: Arc<dyn TranscriptSource>,
    completer: Arc<dyn Completer>,
    prompts: Prompts,
    format_instructions: String,
    segment_count: usize,
    summary_enabled: bool,
    llm_timeout: Option<Duration>,
}

impl SegmentFinder {
    /// Create a finder over the configured transcript store and LLM.
    ///
    /// Fails with [`ClipscoutError::Config`] when the API key is missing.
    pub fn new(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let completer = Arc::new(OpenAICompleter::from_settings(&settings.llm)?);
        let transcripts = Arc::new(FileTranscriptStore::new(settings.transcript_dir()));

        let timeout = match settings.llm.timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(Self::with_components(transcripts, completer, prompts)
            .with_segment_count(settings.selection.segment_count)
            .with_summary(settings.selection.summary_enabled)
            .with_timeout(timeout))
    }

    /// Create a finder with custom components.
    pub fn with_components(
        transcripts: Arc<dyn TranscriptSource>,
        completer: Arc<dyn Completer>,
        prompts: Prompts,
    ) -> Self {
        Self {
            transcripts,
            completer,
            prompts,
            format_instructions: format_instructions(),
            segment_count: MAX_SEGMENTS,
            summary_enabled: true,
            llm_timeout: None,
        }
    }

    /// Number of segments to request and return, capped at [`MAX_SEGMENTS`].
    pub fn with_segment_count(mut self, count: usize) -> Self {
        self.segment_count = count.clamp(1, MAX_SEGMENTS);
        self
    }

    /// Enable or skip the summary stage.
    pub fn with_summary(mut self, enabled: bool) -> Self {
        self.summary_enabled = enabled;
        self
    }

    /// Deadline for each LLM call.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.llm_timeout = timeout;
        self
    }

    /// Find the best segments in the active transcript.
    pub async fn find_best_segments(&self, query: &str) -> SegmentResult {
        self.find_best_segments_in(query, None).await
    }

    /// Find the best segments in a specific transcript, or the active one.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn find_best_segments_in(&self, query: &str, transcript_id: Option<&str>) -> SegmentResult {
        match self.run(query, transcript_id).await {
            Ok(result) => {
                enter(Stage::Done);
                result
            }
            Err(e) => {
                enter(Stage::Error);
                warn!("Segment search failed: {}", e);
                SegmentResult::error(query, e.to_string())
            }
        }
    }

    async fn run(&self, query: &str, transcript_id: Option<&str>) -> Result<SegmentResult> {
        if query.trim().is_empty() {
            return Err(ClipscoutError::InvalidInput("Query must not be empty".to_string()));
        }

        let transcript = self.transcripts.fetch(transcript_id)?;
        if transcript.is_empty() {
            info!("Transcript has no chunks, nothing to select");
            return Ok(SegmentResult::success(query, Vec::new(), None));
        }

        let prompt = build_selection_prompt(
            &self.prompts,
            query,
            &transcript,
            self.segment_count,
            &self.format_instructions,
        );
        enter(Stage::BuiltPrompt);

        enter(Stage::AwaitingLlm);
        let response = self.call_llm(&prompt).await?;

        enter(Stage::Parsing);
        let segments = self.select(&response, &transcript);

        let summary = if self.summary_enabled && !segments.is_empty() {
            Some(self.summary(query, &segments).await)
        } else {
            None
        };
        enter(Stage::Formatted);

        info!("Selected {} segments", segments.len());
        Ok(SegmentResult::success(query, format_segments(segments), summary))
    }

    /// Parse the response, or recover from it when parsing fails.
    fn select(&self, response: &str, transcript: &[TranscriptChunk]) -> Vec<VideoSegment> {
        let parsed = parse_segments(response)
            .and_then(|segments| within_domain(segments, total_duration(transcript)));

        match parsed {
            Ok(segments) => {
                enter(Stage::Parsed);
                if segments.len() != self.segment_count {
                    debug!(
                        "Model returned {} segments, normalizing to {}",
                        segments.len(),
                        self.segment_count
                    );
                }
                pad_from_transcript(segments, transcript, self.segment_count)
            }
            Err(e) => {
                enter(Stage::Fallback);
                warn!("Structured parsing failed, using fallback extraction: {}", e);
                extract_fallback(response, transcript, self.segment_count)
            }
        }
    }

    async fn call_llm(&self, prompt: &str) -> Result<String> {
        match self.llm_timeout {
            Some(limit) => tokio::time::timeout(limit, self.completer.complete(prompt))
                .await
                .map_err(|_| {
                    ClipscoutError::LlmService(format!("No response within {}s", limit.as_secs_f64()))
                })?,
            None => self.completer.complete(prompt).await,
        }
    }

    async fn summary(&self, query: &str, segments: &[VideoSegment]) -> String {
        let summarizing = summarize(self.completer.as_ref(), &self.prompts, query, segments);
        match self.llm_timeout {
            Some(limit) => tokio::time::timeout(limit, summarizing).await.unwrap_or_else(|_| {
                warn!("Summary timed out, using plain listing");
                plain_listing(segments)
            }),
            None => summarizing.await,
        }
    }
}

/// Reject parsed segments that end past the transcript.
fn within_domain(segments: Vec<VideoSegment>, duration: f64) -> Result<Vec<VideoSegment>> {
    match segments.iter().find(|s| s.end > duration + 1e-6) {
        Some(s) => Err(ClipscoutError::Parse(format!(
            "segment {}-{} ends after the transcript ({}s)",
            s.start, s.end, duration
        ))),
        None => Ok(segments),
    }
}

fn enter(stage: Stage) {
    debug!(?stage, "segment pipeline");
}
