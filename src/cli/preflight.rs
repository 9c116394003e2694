//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::LlmSettings;
use crate::error::{ClipscoutError, Result};
use crate::openai::api_key;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingest needs ffmpeg, ffprobe and the API key.
    Ingest,
    /// Segment search needs the API key.
    Find,
    /// Chat needs the API key.
    Chat,
    /// Listing transcripts has no external requirements.
    List,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, llm: &LlmSettings) -> Result<()> {
    match operation {
        Operation::Ingest => {
            check_api_key(llm)?;
            check_tool("ffmpeg")?;
            check_tool("ffprobe")?;
        }
        Operation::Find | Operation::Chat => {
            check_api_key(llm)?;
        }
        Operation::List => {}
    }
    Ok(())
}

fn check_api_key(llm: &LlmSettings) -> Result<()> {
    api_key(llm).map(|_| ())
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("-version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(ClipscoutError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ClipscoutError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(ClipscoutError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_list_no_requirements() {
        assert!(check(Operation::List, &LlmSettings::default()).is_ok());
    }

    #[test]
    fn test_missing_key_names_variable() {
        let llm = LlmSettings {
            api_key_env: "CLIPSCOUT_TEST_UNSET_KEY".to_string(),
            ..Default::default()
        };

        let err = check(Operation::Find, &llm).unwrap_err();
        assert!(err.to_string().contains("CLIPSCOUT_TEST_UNSET_KEY"));
    }
}
