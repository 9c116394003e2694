//! Audio extraction and splitting with ffmpeg.

mod ffmpeg;

pub use ffmpeg::{extract_audio, probe_duration, split_audio, split_points};
