//! Recovery of segments from responses that failed structured parsing.
//!
//! Recovery is a pure function of the response text and the transcript. It
//! never fails: the worst case is the first transcript chunks in order.

use super::{VideoSegment, MAX_SEGMENTS};
use crate::transcript::{total_duration, TranscriptChunk};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Score given to time ranges recovered from the response text.
pub const FALLBACK_SCORE: f64 = 7.0;
/// Explanation given to time ranges recovered from the response text.
pub const FALLBACK_EXPLANATION: &str = "Segment extracted from fallback parsing";
/// Score given to transcript chunks used as padding.
pub const DEFAULT_SCORE: f64 = 5.0;
/// Explanation given to transcript chunks used as padding.
pub const DEFAULT_EXPLANATION: &str = "Default segment from transcript";

const TIME_EPSILON: f64 = 1e-6;

/// A way of recognizing time ranges in free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `"start": 12.0 ... "end": 30.0`, as in near-valid JSON.
    KeyedJson,
    /// `12.0 - 30.0`
    DashRange,
    /// `12.0 to 30.0`
    ProseRange,
}

impl Strategy {
    /// Strategies in the order they are tried.
    pub const ORDER: [Strategy; 3] = [Strategy::KeyedJson, Strategy::DashRange, Strategy::ProseRange];

    fn regex(self) -> &'static Regex {
        static KEYED: OnceLock<Regex> = OnceLock::new();
        static DASH: OnceLock<Regex> = OnceLock::new();
        static PROSE: OnceLock<Regex> = OnceLock::new();

        match self {
            Strategy::KeyedJson => KEYED.get_or_init(|| {
                Regex::new(r#"(?s)"start"\s*:\s*"?(\d+(?:\.\d+)?)"?.*?"end"\s*:\s*"?(\d+(?:\.\d+)?)"#)
                    .expect("valid regex")
            }),
            Strategy::DashRange => DASH.get_or_init(|| {
                Regex::new(r"(\d+\.\d+)\s*[-–]\s*(\d+\.\d+)").expect("valid regex")
            }),
            Strategy::ProseRange => PROSE.get_or_init(|| {
                Regex::new(r"(\d+\.\d+)\s*to\s*(\d+\.\d+)").expect("valid regex")
            }),
        }
    }

    /// All (start, end) pairs in text order.
    pub fn find_pairs(self, text: &str) -> Vec<(f64, f64)> {
        self.regex()
            .captures_iter(text)
            .filter_map(|caps| {
                let start = caps.get(1)?.as_str().parse::<f64>().ok()?;
                let end = caps.get(2)?.as_str().parse::<f64>().ok()?;
                Some((start, end))
            })
            .collect()
    }
}

/// Recover up to `count` segments from an unparseable response.
///
/// The first strategy that matches anything is used on its own, even when
/// none of its pairs survive filtering. Pairs are kept in text order. A pair is
/// usable when `start <= end` and it lies inside the transcript's time domain.
/// Any shortfall is padded from the transcript.
pub fn extract_fallback(response: &str, transcript: &[TranscriptChunk], count: usize) -> Vec<VideoSegment> {
    let count = count.min(MAX_SEGMENTS);
    let duration = total_duration(transcript);

    let matched = Strategy::ORDER
        .iter()
        .map(|strategy| (*strategy, strategy.find_pairs(response)))
        .find(|(_, pairs)| !pairs.is_empty());

    let segments: Vec<VideoSegment> = match matched {
        Some((strategy, pairs)) => {
            let usable: Vec<VideoSegment> = pairs
                .into_iter()
                .filter(|&(start, end)| start <= end && end <= duration + TIME_EPSILON)
                .take(count)
                .map(|(start, end)| VideoSegment::new(start, end, FALLBACK_SCORE, FALLBACK_EXPLANATION))
                .collect();
            debug!("Fallback recovered {} segments with {:?}", usable.len(), strategy);
            usable
        }
        None => {
            debug!("Fallback found no time ranges in response");
            Vec::new()
        }
    };

    pad_from_transcript(segments, transcript, count)
}

/// Fill `segments` up to `count` (at most [`MAX_SEGMENTS`]) with transcript
/// chunks in order, truncating any excess.
///
/// Chunks whose range is already present are skipped. Stops early when the
/// transcript runs out.
pub fn pad_from_transcript(
    mut segments: Vec<VideoSegment>,
    transcript: &[TranscriptChunk],
    count: usize,
) -> Vec<VideoSegment> {
    let count = count.min(MAX_SEGMENTS);
    segments.truncate(count);

    for chunk in transcript {
        if segments.len() >= count {
            break;
        }
        let represented = segments.iter().any(|s| {
            (s.start - chunk.start).abs() < TIME_EPSILON && (s.end - chunk.end).abs() < TIME_EPSILON
        });
        if !represented {
            segments.push(VideoSegment::new(chunk.start, chunk.end, DEFAULT_SCORE, DEFAULT_EXPLANATION));
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript(n: usize) -> Vec<TranscriptChunk> {
        (0..n)
            .map(|i| TranscriptChunk::new(i as f64 * 20.0, (i + 1) as f64 * 20.0, format!("chunk {}", i)))
            .collect()
    }

    #[test]
    fn test_keyed_json_in_text_order() {
        let response = r#"Sure! {"segments": [
            {"start": 40.0, "end": 60.0, "relevance_score": "high", "explanation": "a"},
            {"start": 0.0, "end": 20.0, "relevance_score": "high"},
            {"start": 100.0, "end": 120.0},
            {"start": 20.0, "end": 40.0}
        ]"#;

        let segments = extract_fallback(response, &transcript(10), MAX_SEGMENTS);

        assert_eq!(segments.len(), 3);
        let ranges: Vec<(f64, f64)> = segments.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(ranges, vec![(40.0, 60.0), (0.0, 20.0), (100.0, 120.0)]);
        assert!(segments.iter().all(|s| s.relevance_score == FALLBACK_SCORE));
        assert!(segments.iter().all(|s| s.explanation == FALLBACK_EXPLANATION));
    }

    #[test]
    fn test_strategies_are_not_mixed() {
        // One keyed pair plus dash ranges: only the keyed strategy is used.
        let response = r#"{"start": 20.0, "end": 40.0} and also 60.0 - 80.0, 80.0 - 100.0"#;

        let segments = extract_fallback(response, &transcript(10), MAX_SEGMENTS);

        assert_eq!(segments.len(), 3);
        assert_eq!((segments[0].start, segments[0].end), (20.0, 40.0));
        assert_eq!(segments[0].relevance_score, FALLBACK_SCORE);
        // Padding starts at index 0 and skips the represented 20-40 chunk.
        assert_eq!((segments[1].start, segments[1].end), (0.0, 20.0));
        assert_eq!((segments[2].start, segments[2].end), (40.0, 60.0));
        assert_eq!(segments[1].relevance_score, DEFAULT_SCORE);
        assert_eq!(segments[2].explanation, DEFAULT_EXPLANATION);
    }

    #[test]
    fn test_dash_then_prose() {
        let dash = "Best parts: 20.0 - 40.0, then 60.0 – 80.0.";
        let segments = extract_fallback(dash, &transcript(10), MAX_SEGMENTS);
        assert_eq!((segments[0].start, segments[0].end), (20.0, 40.0));
        assert_eq!((segments[1].start, segments[1].end), (60.0, 80.0));
        assert_eq!(segments[1].relevance_score, FALLBACK_SCORE);
        assert_eq!(segments[2].relevance_score, DEFAULT_SCORE);

        let prose = "Look from 120.0 to 140.0 for the demo.";
        let segments = extract_fallback(prose, &transcript(10), MAX_SEGMENTS);
        assert_eq!((segments[0].start, segments[0].end), (120.0, 140.0));
        assert_eq!(segments[0].relevance_score, FALLBACK_SCORE);
    }

    #[test]
    fn test_no_patterns_uses_transcript_order() {
        let segments = extract_fallback("I could not find anything relevant.", &transcript(5), MAX_SEGMENTS);

        assert_eq!(segments.len(), 3);
        for (i, seg) in segments.iter().enumerate() {
            assert_eq!(seg.start, i as f64 * 20.0);
            assert_eq!(seg.end, (i + 1) as f64 * 20.0);
            assert_eq!(seg.relevance_score, DEFAULT_SCORE);
        }
    }

    #[test]
    fn test_short_transcript_returns_fewer() {
        let segments = extract_fallback("nothing", &transcript(2), MAX_SEGMENTS);
        assert_eq!(segments.len(), 2);

        assert!(extract_fallback("nothing", &[], MAX_SEGMENTS).is_empty());
    }

    #[test]
    fn test_out_of_domain_pairs_are_ignored() {
        // 500-520 lies past the transcript end, 30-10 runs backwards.
        let response = "Try 500.0 - 520.0 or 30.0 - 10.0, or 0.0 - 20.0.";
        let segments = extract_fallback(response, &transcript(3), MAX_SEGMENTS);

        assert_eq!((segments[0].start, segments[0].end), (0.0, 20.0));
        assert_eq!(segments[0].relevance_score, FALLBACK_SCORE);
        assert_eq!((segments[1].start, segments[1].end), (20.0, 40.0));
        assert_eq!(segments[1].relevance_score, DEFAULT_SCORE);
        assert_eq!(segments.len(), 3);
    }

    #[test]
    fn test_matching_strategy_is_kept_when_all_pairs_are_unusable() {
        // The keyed pair is past the end; the valid dash range must not be used.
        let response = r#"{"start": 500.0, "end": 520.0} or maybe 20.0 - 40.0"#;
        let segments = extract_fallback(response, &transcript(3), MAX_SEGMENTS);

        assert_eq!(segments.len(), 3);
        assert!(segments.iter().all(|s| s.relevance_score == DEFAULT_SCORE));
        let starts: Vec<f64> = segments.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![0.0, 20.0, 40.0]);
    }

    #[test]
    fn test_count_limits_recovery_and_padding() {
        let response = "20.0 - 40.0 and 60.0 - 80.0";
        let one = extract_fallback(response, &transcript(10), 1);
        assert_eq!(one.len(), 1);
        assert_eq!((one[0].start, one[0].end), (20.0, 40.0));

        let padded = pad_from_transcript(Vec::new(), &transcript(10), 2);
        assert_eq!(padded.len(), 2);
        assert_eq!(pad_from_transcript(Vec::new(), &transcript(10), 10).len(), MAX_SEGMENTS);
    }

    #[test]
    fn test_integers_need_json_keys() {
        assert!(Strategy::DashRange.find_pairs("Chapters 1 - 3").is_empty());
        assert_eq!(Strategy::KeyedJson.find_pairs(r#""start": 20, "end": 40"#), vec![(20.0, 40.0)]);
    }

    #[test]
    fn test_pad_truncates_excess() {
        let many = (0..5).map(|i| VideoSegment::new(i as f64, i as f64 + 1.0, 9.0, "x")).collect();
        assert_eq!(pad_from_transcript(many, &transcript(5), MAX_SEGMENTS).len(), MAX_SEGMENTS);
    }
}
