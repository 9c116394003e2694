//! Structured parsing of the selection response.

use super::{SegmentSelection, VideoSegment};
use crate::error::{ClipscoutError, Result};

/// Parse a raw LLM response into validated segments.
///
/// Markdown fences and prose around the JSON object are ignored. Every
/// segment must deserialize and satisfy [`VideoSegment::validate`]; otherwise
/// the whole response is rejected with [`ClipscoutError::Parse`].
pub fn parse_segments(response: &str) -> Result<Vec<VideoSegment>> {
    let json_start = response.find('{');
    let json_end = response.rfind('}');

    let json_str = match (json_start, json_end) {
        (Some(start), Some(end)) if end > start => &response[start..=end],
        _ => {
            return Err(ClipscoutError::Parse(format!(
                "No JSON object in response: {}",
                preview(response)
            )))
        }
    };

    let selection: SegmentSelection = serde_json::from_str(json_str).map_err(|e| {
        ClipscoutError::Parse(format!("{}. Response was: {}", e, preview(response)))
    })?;

    for (idx, segment) in selection.segments.iter().enumerate() {
        segment
            .validate()
            .map_err(|reason| ClipscoutError::Parse(format!("segment {}: {}", idx, reason)))?;
    }

    Ok(selection.segments)
}

fn preview(s: &str) -> &str {
    match s.char_indices().nth(500) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clean_response() {
        let response = r#"{"segments": [
            {"start": 0.0, "end": 20.0, "relevance_score": 9.5, "explanation": "Introduces Opus"},
            {"start": 40.0, "end": 60.0, "relevance_score": 8, "explanation": "Benchmarks"},
            {"start": 100.0, "end": 120.0, "relevance_score": 6.5, "explanation": "Pricing"}
        ]}"#;

        let segments = parse_segments(response).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], VideoSegment::new(0.0, 20.0, 9.5, "Introduces Opus"));
        assert_eq!(segments[1].relevance_score, 8.0);
    }

    #[test]
    fn test_parse_fenced_response() {
        let response = "Here you go:\n```json\n{\"segments\": [{\"start\": \"20.0\", \"end\": \"40.0\", \"relevance_score\": 7, \"explanation\": \"Mentions pricing\"}]}\n```\nHope this helps.";

        let segments = parse_segments(response).unwrap();
        assert_eq!(segments, vec![VideoSegment::new(20.0, 40.0, 7.0, "Mentions pricing")]);
    }

    #[test]
    fn test_accepts_more_or_fewer_than_three() {
        let empty = parse_segments(r#"{"segments": []}"#).unwrap();
        assert!(empty.is_empty());

        let many: String = format!(
            r#"{{"segments": [{}]}}"#,
            (0..5)
                .map(|i| format!(
                    r#"{{"start": {}, "end": {}, "relevance_score": 5, "explanation": "part {}"}}"#,
                    i * 20,
                    i * 20 + 20,
                    i
                ))
                .collect::<Vec<_>>()
                .join(",")
        );
        assert_eq!(parse_segments(&many).unwrap().len(), 5);
    }

    #[test]
    fn test_rejects_missing_fields() {
        let response = r#"{"segments": [{"start": 0.0, "end": 20.0, "explanation": "no score"}]}"#;
        assert!(matches!(parse_segments(response), Err(ClipscoutError::Parse(_))));
    }

    #[test]
    fn test_rejects_invalid_values() {
        let backwards = r#"{"segments": [{"start": 50, "end": 20, "relevance_score": 5, "explanation": "x"}]}"#;
        assert!(matches!(parse_segments(backwards), Err(ClipscoutError::Parse(_))));

        let out_of_range = r#"{"segments": [{"start": 0, "end": 20, "relevance_score": 42, "explanation": "x"}]}"#;
        assert!(matches!(parse_segments(out_of_range), Err(ClipscoutError::Parse(_))));

        let null_start = r#"{"segments": [{"start": null, "end": 20, "relevance_score": 5, "explanation": "x"}]}"#;
        assert!(matches!(parse_segments(null_start), Err(ClipscoutError::Parse(_))));
    }

    #[test]
    fn test_rejects_prose() {
        let response = "The best parts are 12.0 - 30.0 and 45.0 to 60.0.";
        assert!(matches!(parse_segments(response), Err(ClipscoutError::Parse(_))));
    }
}
