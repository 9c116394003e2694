//! Video ingest pipeline.
//!
//! Saves an uploaded video, extracts its audio, transcribes it, groups the
//! speech into fixed windows and stores the result as the active transcript.

use crate::audio::extract_audio;
use crate::config::Settings;
use crate::error::{ClipscoutError, Result};
use crate::transcript::{chunk_by_window, FileTranscriptStore, SpeechSegment, TranscriptRecord};
use crate::transcription::{Transcriber, WhisperTranscriber};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Result of ingesting one video.
#[derive(Debug, Clone, Serialize)]
pub struct IngestResult {
    pub message: String,
    /// Name the client uploaded the file under.
    pub filename: String,
    /// Name the video was saved under.
    pub saved_as: String,
    pub transcript_id: String,
    pub transcript_file: String,
    pub chunk_count: usize,
}

/// Turns videos into stored transcripts.
pub struct Ingestor {
    store: FileTranscriptStore,
    transcriber: Arc<dyn Transcriber>,
    video_dir: PathBuf,
    temp_dir: PathBuf,
    window_seconds: f64,
}

impl Ingestor {
    /// Create an ingestor with the Whisper transcriber.
    pub fn new(settings: &Settings) -> Result<Self> {
        let transcriber = Arc::new(WhisperTranscriber::from_settings(
            &settings.llm,
            &settings.transcription,
        )?);

        Ok(Self::with_components(
            FileTranscriptStore::new(settings.transcript_dir()),
            transcriber,
            settings.video_dir(),
            settings.temp_dir(),
        )
        .with_window(settings.transcription.chunk_window_seconds))
    }

    /// Create an ingestor with custom components.
    pub fn with_components(
        store: FileTranscriptStore,
        transcriber: Arc<dyn Transcriber>,
        video_dir: PathBuf,
        temp_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            transcriber,
            video_dir,
            temp_dir,
            window_seconds: 20.0,
        }
    }

    /// Set the transcript window length in seconds.
    pub fn with_window(mut self, seconds: f64) -> Self {
        self.window_seconds = seconds;
        self
    }

    pub fn store(&self) -> &FileTranscriptStore {
        &self.store
    }

    /// Save uploaded bytes to the video directory and ingest them.
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    pub async fn ingest_upload(&self, filename: &str, data: &[u8]) -> Result<IngestResult> {
        let filename = upload_name(filename)?;
        tokio::fs::create_dir_all(&self.video_dir).await?;

        let short = uuid::Uuid::new_v4().simple().to_string();
        let saved_as = format!("{}_{}", &short[..8], filename);
        let video_path = self.video_dir.join(&saved_as);

        tokio::fs::write(&video_path, data).await?;
        info!("Saved upload to {}", video_path.display());

        let mut result = self.ingest_file(&video_path).await?;
        result.filename = filename;
        Ok(result)
    }

    /// Ingest a video that is already on disk.
    #[instrument(skip(self), fields(video = %video_path.display()))]
    pub async fn ingest_file(&self, video_path: &Path) -> Result<IngestResult> {
        if !video_path.is_file() {
            return Err(ClipscoutError::InvalidInput(format!(
                "File not found: {}",
                video_path.display()
            )));
        }

        let audio_path = extract_audio(video_path, &self.temp_dir).await?;
        let transcribed = self.transcriber.transcribe(&audio_path).await;

        if let Err(e) = tokio::fs::remove_file(&audio_path).await {
            warn!("Could not remove {}: {}", audio_path.display(), e);
        }

        let saved_as = video_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let record = self.store_speech(&saved_as, &transcribed?)?;

        Ok(IngestResult {
            message: "Video uploaded and transcribed successfully".to_string(),
            filename: saved_as.clone(),
            saved_as,
            transcript_file: self.store.transcript_path(&record.id)?.display().to_string(),
            transcript_id: record.id,
            chunk_count: record.chunk_count,
        })
    }

    /// Window the speech, store it and make it the active transcript.
    pub fn store_speech(&self, source_filename: &str, speech: &[SpeechSegment]) -> Result<TranscriptRecord> {
        let chunks = chunk_by_window(speech, self.window_seconds);
        if chunks.is_empty() {
            return Err(ClipscoutError::Transcription("No speech found in video".to_string()));
        }

        let id = FileTranscriptStore::new_id(source_filename);
        let record = self.store.save(&id, source_filename, &chunks)?;
        self.store.set_active(&id)?;
        Ok(record)
    }
}

/// Final path component of a client-supplied file name.
fn upload_name(filename: &str) -> Result<String> {
    Path::new(filename.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.starts_with('.'))
        .map(str::to_string)
        .ok_or_else(|| ClipscoutError::InvalidInput(format!("Invalid file name: '{}'", filename)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio_test::{assert_err, assert_ok};

    struct Silent;

    #[async_trait]
    impl Transcriber for Silent {
        async fn transcribe(&self, _audio_path: &Path) -> Result<Vec<SpeechSegment>> {
            Ok(Vec::new())
        }
    }

    fn ingestor(dir: &Path) -> Ingestor {
        Ingestor::with_components(
            FileTranscriptStore::new(dir.join("transcripts")),
            Arc::new(Silent),
            dir.join("videos"),
            dir.join("tmp"),
        )
    }

    #[test]
    fn test_upload_name() {
        assert_eq!(upload_name("talk.mp4").unwrap(), "talk.mp4");
        assert_eq!(upload_name("../../etc/talk.mp4").unwrap(), "talk.mp4");
        assert_err!(upload_name(""));
        assert_err!(upload_name(".."));
        assert_err!(upload_name(".hidden"));
    }

    #[test]
    fn test_store_speech_becomes_active() {
        let dir = tempfile::tempdir().unwrap();
        let ingestor = ingestor(dir.path());
        let speech = vec![
            SpeechSegment::new(0.0, 8.0, "Hello and welcome."),
            SpeechSegment::new(8.0, 19.0, "Today we cover pricing."),
            SpeechSegment::new(21.0, 30.0, "Plans start at ten dollars."),
        ];

        let record = assert_ok!(ingestor.store_speech("ab12cd34_talk.mp4", &speech));

        assert_eq!(record.chunk_count, 2);
        assert_eq!(record.duration_seconds, 30.0);
        assert_eq!(ingestor.store().active_id().unwrap(), Some(record.id.clone()));
        assert_eq!(ingestor.store().load(&record.id).unwrap().len(), 2);
    }

    #[test]
    fn test_store_speech_rejects_silence() {
        let dir = tempfile::tempdir().unwrap();
        let ingestor = ingestor(dir.path());

        assert_err!(ingestor.store_speech("talk.mp4", &[]));
        assert!(ingestor.store().list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ingest_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let ingestor = ingestor(dir.path());

        let result = ingestor.ingest_file(&dir.path().join("nope.mp4")).await;
        assert!(matches!(result, Err(ClipscoutError::InvalidInput(_))));
    }
}
