//! Configuration settings for Clipscout.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub selection: SelectionSettings,
    pub transcription: TranscriptionSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for uploaded videos and transcripts.
    pub data_dir: String,
    /// Directory for temporary audio files.
    pub temp_dir: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.clipscout".to_string(),
            temp_dir: "/tmp/clipscout".to_string(),
        }
    }
}

/// Settings for the text-completion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Model used for segment selection, summaries and chat.
    pub model: String,
    /// Sampling temperature for segment selection.
    pub temperature: f32,
    /// Base URL of an OpenAI-compatible API. None uses api.openai.com.
    pub api_base: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Deadline for a single LLM call. 0 disables it.
    pub timeout_seconds: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            api_base: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_seconds: 120,
        }
    }
}

/// Segment selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionSettings {
    /// Number of segments requested from the model (at most 3 are returned).
    pub segment_count: usize,
    /// Ask the model for a readable summary of the selected segments.
    pub summary_enabled: bool,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            segment_count: 3,
            summary_enabled: true,
        }
    }
}

/// Speech-to-text settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model to use.
    pub model: String,
    /// Width of each transcript chunk in seconds.
    pub chunk_window_seconds: f64,
    /// Audio longer than this is split before upload to the API.
    pub split_seconds: u32,
    /// Maximum concurrent transcription requests.
    pub max_concurrent: usize,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            chunk_window_seconds: 20.0,
            split_seconds: 600,
            max_concurrent: 3,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// First localhost port allowed by CORS.
    pub cors_port_start: u16,
    /// Last localhost port allowed by CORS (inclusive).
    pub cors_port_end: u16,
    /// Extra allowed origins.
    pub extra_origins: Vec<String>,
    /// Maximum upload size in megabytes.
    pub max_upload_mb: usize,
    /// Chat sessions kept in memory before the least recently used is dropped.
    pub max_chat_sessions: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_port_start: 5173,
            cors_port_end: 6200,
            extra_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:8080".to_string(),
                "http://localhost:8081".to_string(),
            ],
            max_upload_mb: 1024,
            max_chat_sessions: 1000,
        }
    }
}

impl ServerSettings {
    /// All origins allowed by CORS.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = (self.cors_port_start..=self.cors_port_end)
            .map(|port| format!("http://localhost:{}", port))
            .collect();
        for origin in &self.extra_origins {
            if !origins.contains(origin) {
                origins.push(origin.clone());
            }
        }
        origins
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ClipscoutError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("clipscout")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Directory holding transcript JSON files.
    pub fn transcript_dir(&self) -> PathBuf {
        self.data_dir().join("transcripts")
    }

    /// Directory holding uploaded videos.
    pub fn video_dir(&self) -> PathBuf {
        self.data_dir().join("videos")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [llm]
            model = "gemini-2.0-flash"
            api_base = "https://generativelanguage.googleapis.com/v1beta/openai"
            "#,
        )
        .unwrap();

        assert_eq!(settings.llm.model, "gemini-2.0-flash");
        assert_eq!(settings.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(settings.selection.segment_count, 3);
        assert_eq!(settings.transcription.chunk_window_seconds, 20.0);
    }

    #[test]
    fn test_allowed_origins() {
        let server = ServerSettings::default();
        let origins = server.allowed_origins();

        assert_eq!(origins.first().map(String::as_str), Some("http://localhost:5173"));
        assert!(origins.contains(&"http://localhost:6200".to_string()));
        assert!(origins.contains(&"http://localhost:3000".to_string()));
        assert!(origins.contains(&"http://localhost:8081".to_string()));
        assert_eq!(origins.len(), (6200 - 5173 + 1) + 3);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.selection.summary_enabled = false;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert!(!loaded.selection.summary_enabled);
    }
}
