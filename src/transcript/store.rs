//! File-backed transcript storage.
//!
//! Layout under the store directory:
//! - `<id>.json`: the transcript chunks
//! - `<id>.meta.json`: a [`TranscriptRecord`]
//! - `ACTIVE`: id of the transcript used when a caller names none
//!
//! Lookups go through an explicit id or the `ACTIVE` pointer, never through
//! directory iteration order.

use super::{total_duration, TranscriptChunk};
use crate::error::{ClipscoutError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

const ACTIVE_FILE: &str = "ACTIVE";
const META_SUFFIX: &str = ".meta.json";

/// Source of transcripts for the segment pipeline.
pub trait TranscriptSource: Send + Sync {
    /// Fetch a transcript by id, or the active transcript when `transcript_id` is None.
    ///
    /// Fails with [`ClipscoutError::TranscriptUnavailable`] when nothing is found
    /// or the stored data is unreadable.
    fn fetch(&self, transcript_id: Option<&str>) -> Result<Vec<TranscriptChunk>>;
}

/// Listing entry for a stored transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub id: String,
    /// Name of the uploaded file the transcript came from.
    pub source_filename: String,
    pub created_at: DateTime<Utc>,
    pub chunk_count: usize,
    pub duration_seconds: f64,
}

/// Transcript store backed by a directory of JSON files.
#[derive(Debug, Clone)]
pub struct FileTranscriptStore {
    dir: PathBuf,
}

impl FileTranscriptStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Build a transcript id from an uploaded file name.
    pub fn new_id(source_filename: &str) -> String {
        let stem = Path::new(source_filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("video");
        let stem: String = stem
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .take(64)
            .collect();
        let short = uuid::Uuid::new_v4().simple().to_string();
        format!("{}_{}", &short[..8], stem)
    }

    /// Path of the chunk file for a transcript id.
    pub fn transcript_path(&self, id: &str) -> Result<PathBuf> {
        validate_id(id)?;
        Ok(self.dir.join(format!("{}.json", id)))
    }

    /// Store a transcript and its record. Files are written atomically.
    #[instrument(skip(self, chunks), fields(chunks = chunks.len()))]
    pub fn save(&self, id: &str, source_filename: &str, chunks: &[TranscriptChunk]) -> Result<TranscriptRecord> {
        validate_id(id)?;
        std::fs::create_dir_all(&self.dir)?;

        let record = TranscriptRecord {
            id: id.to_string(),
            source_filename: source_filename.to_string(),
            created_at: Utc::now(),
            chunk_count: chunks.len(),
            duration_seconds: total_duration(chunks),
        };

        self.write_atomic(&format!("{}.json", id), &serde_json::to_vec_pretty(chunks)?)?;
        self.write_atomic(&format!("{}{}", id, META_SUFFIX), &serde_json::to_vec_pretty(&record)?)?;

        info!("Stored transcript {} ({} chunks)", id, chunks.len());
        Ok(record)
    }

    /// Make `id` the transcript used when no id is given.
    pub fn set_active(&self, id: &str) -> Result<()> {
        if !self.transcript_path(id)?.exists() {
            return Err(ClipscoutError::TranscriptUnavailable(format!("No transcript with id '{}'", id)));
        }
        self.write_atomic(ACTIVE_FILE, id.as_bytes())
    }

    /// Id of the active transcript, if any.
    pub fn active_id(&self) -> Result<Option<String>> {
        let path = self.dir.join(ACTIVE_FILE);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let id = content.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Load the chunks of a transcript.
    pub fn load(&self, id: &str) -> Result<Vec<TranscriptChunk>> {
        let path = self.transcript_path(id)?;
        debug!("Loading transcript from {}", path.display());

        let content = std::fs::read_to_string(&path).map_err(|e| {
            ClipscoutError::TranscriptUnavailable(format!("Cannot read transcript '{}': {}", id, e))
        })?;

        let chunks: Vec<TranscriptChunk> = serde_json::from_str(&content).map_err(|e| {
            ClipscoutError::TranscriptUnavailable(format!("Invalid JSON in transcript '{}': {}", id, e))
        })?;

        if let Some((idx, _)) = chunks.iter().enumerate().find(|(_, c)| !c.is_valid()) {
            return Err(ClipscoutError::TranscriptUnavailable(format!(
                "Transcript '{}' has an invalid time range at chunk {}",
                id, idx
            )));
        }

        Ok(chunks)
    }

    /// List stored transcripts, oldest first.
    pub fn list(&self) -> Result<Vec<TranscriptRecord>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            if !name.to_string_lossy().ends_with(META_SUFFIX) {
                continue;
            }
            let content = std::fs::read_to_string(entry.path())?;
            records.push(serde_json::from_str::<TranscriptRecord>(&content)?);
        }

        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    fn write_atomic(&self, name: &str, bytes: &[u8]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.persist(self.dir.join(name)).map_err(|e| e.error)?;
        Ok(())
    }
}

impl TranscriptSource for FileTranscriptStore {
    fn fetch(&self, transcript_id: Option<&str>) -> Result<Vec<TranscriptChunk>> {
        let id = match transcript_id {
            Some(id) => id.to_string(),
            None => self.active_id()?.ok_or_else(|| {
                ClipscoutError::TranscriptUnavailable(format!(
                    "No active transcript in {}. Upload a video first.",
                    self.dir.display()
                ))
            })?,
        };
        self.load(&id)
    }
}

fn validate_id(id: &str) -> Result<()> {
    let ok = !id.is_empty()
        && id.len() <= 128
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(ClipscoutError::InvalidInput(format!("Invalid transcript id: '{}'", id)))
    }
}
