//! Clipscout - query-driven video segment search
//!
//! Finds the moments in a video that matter for a free-text question.
//!
//! # Overview
//!
//! Clipscout allows you to:
//! - Transcribe an uploaded video into ~20 second transcript chunks
//! - Ask an LLM for the three segments most relevant to a query
//! - Recover usable segments even when the model's reply is malformed
//! - Chat about the video's content
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `transcript` - Transcript data model and file-backed store
//! - `audio` - Audio extraction and splitting with ffmpeg
//! - `transcription` - Speech-to-text
//! - `ingest` - Upload to stored transcript
//! - `llm` - Text-completion service abstraction
//! - `segments` - Prompt building, parsing, fallback and formatting
//! - `orchestrator` - The segment search pipeline
//! - `chat` - Transcript-grounded conversation
//!
//! # Example
//!
//! ```rust,no_run
//! use clipscout::config::Settings;
//! use clipscout::orchestrator::SegmentFinder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let finder = SegmentFinder::new(&settings)?;
//!
//!     let result = finder.find_best_segments("pricing plans").await;
//!     for segment in &result.segments {
//!         println!("{} {}", segment.timestamp_display, segment.segment.explanation);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod segments;
pub mod transcript;
pub mod transcription;

pub use error::{ClipscoutError, Result};
