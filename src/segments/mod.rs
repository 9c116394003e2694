//! Segment selection: prompt building, response parsing, fallback recovery
//! and result formatting.
//!
//! The pieces are pure functions over the transcript and the raw LLM text,
//! sequenced by [`crate::orchestrator::SegmentFinder`].

mod fallback;
mod format;
mod parser;
mod prompt;

pub use fallback::{
    extract_fallback, pad_from_transcript, Strategy, DEFAULT_EXPLANATION, DEFAULT_SCORE,
    FALLBACK_EXPLANATION, FALLBACK_SCORE,
};
pub use format::{format_segments, format_timestamp, plain_listing, summarize, timestamp_display, FormattedSegment};
pub use parser::parse_segments;
pub use prompt::{build_selection_prompt, format_instructions};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Maximum number of segments returned for a query.
pub const MAX_SEGMENTS: usize = 3;

/// A time range judged relevant to a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoSegment {
    /// Start time of the segment in seconds
    #[serde(deserialize_with = "numeric::deserialize")]
    #[schemars(with = "f64")]
    pub start: f64,
    /// End time of the segment in seconds
    #[serde(deserialize_with = "numeric::deserialize")]
    #[schemars(with = "f64")]
    pub end: f64,
    /// Relevance score from 0-10
    #[serde(deserialize_with = "numeric::deserialize")]
    #[schemars(with = "f64")]
    pub relevance_score: f64,
    /// Why this segment is relevant
    pub explanation: String,
}

impl VideoSegment {
    pub fn new(start: f64, end: f64, relevance_score: f64, explanation: impl Into<String>) -> Self {
        Self {
            start,
            end,
            relevance_score,
            explanation: explanation.into(),
        }
    }

    /// Check the segment invariants, returning a description of the first violation.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.start.is_finite() || !self.end.is_finite() || !self.relevance_score.is_finite() {
            return Err("times and score must be finite numbers".to_string());
        }
        if self.start < 0.0 {
            return Err(format!("start {} is negative", self.start));
        }
        if self.end < self.start {
            return Err(format!("end {} is before start {}", self.end, self.start));
        }
        if !(0.0..=10.0).contains(&self.relevance_score) {
            return Err(format!("relevance_score {} is outside 0-10", self.relevance_score));
        }
        if self.explanation.trim().is_empty() {
            return Err("explanation is empty".to_string());
        }
        Ok(())
    }
}

/// The structured response expected from the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentSelection {
    /// List of the 3 best video segments
    pub segments: Vec<VideoSegment>,
}

/// Outcome of a segment query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Error,
}

/// Response contract of [`crate::orchestrator::SegmentFinder::find_best_segments`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentResult {
    pub status: ResultStatus,
    pub query: String,
    pub segments: Vec<FormattedSegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SegmentResult {
    pub fn success(query: &str, segments: Vec<FormattedSegment>, summary: Option<String>) -> Self {
        Self {
            status: ResultStatus::Success,
            query: query.to_string(),
            segments,
            summary,
            error: None,
        }
    }

    pub fn error(query: &str, message: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Error,
            query: query.to_string(),
            segments: Vec::new(),
            summary: None,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }
}

/// Accepts JSON numbers and numeric strings as `f64`, rejecting everything else.
mod numeric {
    use serde::{de, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Numeric {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Numeric::deserialize(deserializer)? {
            Numeric::Number(n) => Ok(n),
            Numeric::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| de::Error::custom(format!("expected a number, got \"{}\"", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(VideoSegment::new(0.0, 20.0, 8.0, "covers pricing").validate().is_ok());
        assert!(VideoSegment::new(20.0, 20.0, 0.0, "instant").validate().is_ok());
        assert!(VideoSegment::new(20.0, 10.0, 8.0, "x").validate().is_err());
        assert!(VideoSegment::new(0.0, 10.0, 11.0, "x").validate().is_err());
        assert!(VideoSegment::new(0.0, 10.0, 5.0, "  ").validate().is_err());
        assert!(VideoSegment::new(-5.0, 10.0, 5.0, "x").validate().is_err());
    }

    #[test]
    fn test_numeric_coercion() {
        let seg: VideoSegment = serde_json::from_str(
            r#"{"start": "12.5", "end": 40, "relevance_score": 9, "explanation": "x"}"#,
        )
        .unwrap();
        assert_eq!(seg.start, 12.5);
        assert_eq!(seg.end, 40.0);

        let bad = serde_json::from_str::<VideoSegment>(
            r#"{"start": true, "end": 40, "relevance_score": 9, "explanation": "x"}"#,
        );
        assert!(bad.is_err());

        let text = serde_json::from_str::<VideoSegment>(
            r#"{"start": "soon", "end": 40, "relevance_score": 9, "explanation": "x"}"#,
        );
        assert!(text.is_err());
    }

    #[test]
    fn test_error_result_shape() {
        let result = SegmentResult::error("pricing", "Transcript unavailable");
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["status"], "error");
        assert_eq!(json["query"], "pricing");
        assert_eq!(json["segments"], serde_json::json!([]));
        assert_eq!(json["error"], "Transcript unavailable");
        assert!(json.get("summary").is_none());
    }
}
