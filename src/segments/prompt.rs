//! Selection prompt construction.

use super::SegmentSelection;
use crate::config::Prompts;
use crate::transcript::TranscriptChunk;
use schemars::schema_for;
use std::collections::HashMap;

/// Describe the expected output format, generated from [`SegmentSelection`].
///
/// The schema comes from the same type the parser deserializes into, so
/// field names, types and required fields in the prompt always match what is
/// accepted.
pub fn format_instructions() -> String {
    let mut schema = serde_json::to_value(schema_for!(SegmentSelection)).unwrap_or_default();
    if let Some(obj) = schema.as_object_mut() {
        obj.remove("$schema");
    }
    let schema_text = serde_json::to_string(&schema).unwrap_or_default();

    format!(
        "The output should be formatted as a JSON instance that conforms to the JSON schema below.\n\
         \n\
         As an example, for the schema {{\"properties\": {{\"foo\": {{\"description\": \"a list of strings\", \"type\": \"array\", \"items\": {{\"type\": \"string\"}}}}}}, \"required\": [\"foo\"]}}\n\
         the object {{\"foo\": [\"bar\", \"baz\"]}} is a well-formatted instance of the schema. \
         The object {{\"properties\": {{\"foo\": [\"bar\", \"baz\"]}}}} is not well-formatted.\n\
         \n\
         Here is the output schema:\n\
         ```\n\
         {}\n\
         ```",
        schema_text
    )
}

/// Build the segment selection prompt.
///
/// Pure function of the template, query, transcript and format instructions.
pub fn build_selection_prompt(
    prompts: &Prompts,
    query: &str,
    transcript: &[TranscriptChunk],
    segment_count: usize,
    format_instructions: &str,
) -> String {
    let transcript_json = serde_json::to_string_pretty(transcript).unwrap_or_else(|_| "[]".to_string());

    let mut vars = HashMap::new();
    vars.insert("query".to_string(), query.to_string());
    vars.insert("transcript".to_string(), transcript_json);
    vars.insert("segment_count".to_string(), segment_count.to_string());
    vars.insert("format_instructions".to_string(), format_instructions.to_string());

    prompts.render_with_custom(&prompts.selection.user, &vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_instructions_follow_schema() {
        let instructions = format_instructions();

        for field in ["segments", "start", "end", "relevance_score", "explanation"] {
            assert!(instructions.contains(&format!("\"{}\"", field)), "missing {}", field);
        }
        assert!(instructions.contains("\"required\""));
        assert!(instructions.contains("Relevance score from 0-10"));
        assert!(!instructions.contains("$schema"));
    }

    #[test]
    fn test_required_fields_match_segment_type() {
        let schema = serde_json::to_value(schema_for!(SegmentSelection)).unwrap();
        let segment = &schema["definitions"]["VideoSegment"];
        let mut required: Vec<&str> = segment["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        required.sort();

        assert_eq!(required, vec!["end", "explanation", "relevance_score", "start"]);
        assert_eq!(segment["properties"]["start"]["type"], "number");
    }

    #[test]
    fn test_build_selection_prompt() {
        let transcript = vec![
            TranscriptChunk::new(0.0, 20.0, "Welcome."),
            TranscriptChunk::new(20.0, 40.0, "Opus supports long context."),
        ];

        let prompt = build_selection_prompt(
            &Prompts::default(),
            "Claude 3 Opus features",
            &transcript,
            3,
            "FORMAT",
        );

        assert!(prompt.contains("User Query: Claude 3 Opus features"));
        assert!(prompt.contains("\"text\": \"Opus supports long context.\""));
        assert!(prompt.contains("find the 3 most relevant"));
        assert!(prompt.ends_with("FORMAT"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_placeholder_query_builds_one_prompt() {
        let transcript = vec![TranscriptChunk::new(0.0, 20.0, "Welcome.")];

        let prompts: std::collections::HashSet<String> = (0..200)
            .map(|_| build_selection_prompt(&Prompts::default(), "{{transcript}}", &transcript, 3, "FORMAT"))
            .collect();

        assert_eq!(prompts.len(), 1);
        let prompt = prompts.into_iter().next().unwrap();
        assert!(prompt.contains("User Query: {{transcript}}"));
    }
}
