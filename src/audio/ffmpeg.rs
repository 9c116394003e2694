//! ffmpeg/ffprobe wrappers.
//!
//! Audio is extracted as mono 16 kHz MP3, which keeps uploads to the
//! speech-to-text API small without hurting recognition.

use crate::error::{ClipscoutError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Extract the audio track of a video into `output_dir`.
#[instrument(skip(output_dir), fields(video = %video_path.display()))]
pub async fn extract_audio(video_path: &Path, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let stem = video_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");
    let target_path = output_dir.join(format!("{}.mp3", stem));

    info!("Extracting audio to {}", target_path.display());

    let result = Command::new("ffmpeg")
        .arg("-i").arg(video_path)
        .arg("-vn")
        .arg("-ac").arg("1")
        .arg("-ar").arg("16000")
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("4")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(&target_path)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(target_path),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(ClipscoutError::AudioExtraction(format!("ffmpeg failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ClipscoutError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(ClipscoutError::AudioExtraction(format!("ffmpeg error: {e}"))),
    }
}

/// Offsets and lengths of the pieces a file of `total` seconds is split into.
pub fn split_points(total: f64, chunk_seconds: u32) -> Vec<(f64, f64)> {
    let chunk_len = chunk_seconds.max(1) as f64;
    if total <= chunk_len {
        return vec![(0.0, total)];
    }

    let mut points = Vec::new();
    let mut offset = 0.0;
    while offset < total {
        points.push((offset, chunk_len.min(total - offset)));
        offset += chunk_len;
    }
    points
}

/// Split a long audio file into pieces of about `chunk_seconds`.
///
/// Returns (path, offset_seconds) tuples in order. Short files are returned
/// as-is with offset 0.
#[instrument(skip_all)]
pub async fn split_audio(
    source: &Path,
    output_dir: &Path,
    chunk_seconds: u32,
) -> Result<Vec<(PathBuf, f64)>> {
    std::fs::create_dir_all(output_dir)?;

    let total_duration = probe_duration(source).await?;
    info!("Total audio duration: {:.1}s", total_duration);

    let points = split_points(total_duration, chunk_seconds);
    if points.len() == 1 {
        return Ok(vec![(source.to_path_buf(), 0.0)]);
    }

    let base_name = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");

    let mut pieces = Vec::with_capacity(points.len());
    for (idx, (offset, length)) in points.into_iter().enumerate() {
        let piece_path = output_dir.join(format!("{}_{:04}.mp3", base_name, idx));
        extract_piece(source, &piece_path, offset, length).await?;
        debug!("Created piece {} at offset {:.1}s", idx, offset);
        pieces.push((piece_path, offset));
    }

    info!("Created {} audio pieces", pieces.len());
    Ok(pieces)
}

async fn extract_piece(source: &Path, dest: &Path, start: f64, length: f64) -> Result<()> {
    let copy_result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-c").arg("copy")
        .arg("-y")
        .arg("-loglevel").arg("warning")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    if let Ok(status) = copy_result {
        if status.success() && dest.exists() {
            return Ok(());
        }
    }

    warn!("Stream copy failed, re-encoding piece");

    let encode_result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-codec:a").arg("libmp3lame")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match encode_result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(ClipscoutError::AudioExtraction(format!("Piece extraction failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ClipscoutError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(ClipscoutError::AudioExtraction(format!("ffmpeg error: {e}"))),
    }
}

/// Duration of a media file in seconds, from ffprobe's JSON output.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ClipscoutError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(ClipscoutError::AudioExtraction(format!("ffprobe failed: {e}")));
        }
    };

    if !output.status.success() {
        return Err(ClipscoutError::AudioExtraction("ffprobe returned error".into()));
    }

    parse_probe_duration(&String::from_utf8_lossy(&output.stdout))
}

fn parse_probe_duration(json_str: &str) -> Result<f64> {
    let parsed: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|_| ClipscoutError::AudioExtraction("Invalid ffprobe output".into()))?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| ClipscoutError::AudioExtraction("Could not determine audio duration".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_points() {
        assert_eq!(split_points(90.0, 600), vec![(0.0, 90.0)]);
        assert_eq!(
            split_points(1300.0, 600),
            vec![(0.0, 600.0), (600.0, 600.0), (1200.0, 100.0)]
        );
        assert_eq!(split_points(1200.0, 600).len(), 2);
    }

    #[test]
    fn test_parse_probe_duration() {
        let json = r#"{"format": {"filename": "talk.mp3", "duration": "734.120000"}}"#;
        assert_eq!(parse_probe_duration(json).unwrap(), 734.12);

        assert!(parse_probe_duration(r#"{"format": {}}"#).is_err());
        assert!(parse_probe_duration("garbage").is_err());
    }

    #[tokio::test]
    async fn test_extract_audio_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let result = extract_audio(&dir.path().join("missing.mp4"), dir.path()).await;
        // Either ffmpeg is absent or it rejects the missing file.
        assert!(result.is_err());
    }
}
