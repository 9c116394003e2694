//! Prompt templates for Clipscout.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub selection: SelectionPrompts,
    pub chat: ChatPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for segment selection and the result summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionPrompts {
    /// Variables: query, transcript, segment_count, format_instructions.
    pub user: String,
    /// Variables: query, segments, time_ranges, segment_count.
    pub summary: String,
}

impl Default for SelectionPrompts {
    fn default() -> Self {
        Self {
            user: r#"You are an expert video content analyzer. Your task is to find the {{segment_count}} most relevant video segments based on the user's query.

User Query: {{query}}

Video Transcript Data:
{{transcript}}

Analyze the transcript and identify the {{segment_count}} segments that best match the user's query. For each segment, provide:
1. The exact start and end times from the transcript (only use values that appear in the transcript data)
2. A relevance score from 0-10 (10 being most relevant)
3. A clear explanation of why this segment is relevant to the query

Focus on segments that directly address or relate to the user's query content.

{{format_instructions}}"#
                .to_string(),

            summary: r#"Format the following video segment results in a clear, professional summary:

User Query: "{{query}}"

Selected Segments:
{{segments}}

Time Ranges: {{time_ranges}}

Create a concise, well-formatted summary that explains:
1. What the user was looking for
2. The {{segment_count}} selected time ranges
3. Why these segments were chosen

Keep it professional and informative."#
                .to_string(),
        }
    }
}

/// Prompts for transcript-grounded chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatPrompts {
    /// Variables: context.
    pub system: String,
}

impl Default for ChatPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an AI assistant helping users understand and analyze their video content.

Video Transcript Context:
{{context}}

Based on the above transcript, please answer the user's question about their video.
Format your response using proper markdown:
- Use **bold** for emphasis
- Use bullet points with - for lists
- Use proper paragraphs for readability
- Reference specific timestamps when relevant (e.g., "At 2:15...")

If the question relates to specific timestamps or content in the video, reference the relevant parts of the transcript.
If the question is not related to the video content, you can provide general assistance but try to relate it back to the video when possible."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let selection_path = custom_path.join("selection.toml");
            if selection_path.exists() {
                let content = std::fs::read_to_string(&selection_path)?;
                prompts.selection = toml::from_str(&content)?;
            }

            let chat_path = custom_path.join("chat.toml");
            if chat_path.exists() {
                let content = std::fs::read_to_string(&chat_path)?;
                prompts.chat = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are substituted in one pass, so `{{...}}` text inside a
    /// value is never expanded. Unknown placeholders are left as written.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        let placeholder =
            PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("valid regex"));

        placeholder
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.selection.user.contains("{{format_instructions}}"));
        assert!(prompts.selection.summary.contains("{{time_ranges}}"));
        assert!(prompts.chat.system.contains("{{context}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), "{{transcript}}".to_string());
        vars.insert("transcript".to_string(), "[chunks]".to_string());

        let result = Prompts::render("Q: {{query}} T: {{transcript}} X: {{unknown}}", &vars);
        assert_eq!(result, "Q: {{transcript}} T: [chunks] X: {{unknown}}");
    }

    #[test]
    fn test_provided_vars_override_custom() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("channel".to_string(), "config".to_string());
        prompts.variables.insert("tone".to_string(), "formal".to_string());

        let mut vars = HashMap::new();
        vars.insert("channel".to_string(), "call".to_string());

        let rendered = prompts.render_with_custom("{{channel}}/{{tone}}", &vars);
        assert_eq!(rendered, "call/formal");
    }

    #[test]
    fn test_load_custom_chat_prompt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("chat.toml"),
            "system = \"Only answer in haiku.\\n{{context}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert!(prompts.chat.system.starts_with("Only answer in haiku."));
        assert!(prompts.selection.user.contains("{{query}}"));
    }
}
