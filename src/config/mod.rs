//! Configuration module for Clipscout.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ChatPrompts, Prompts, SelectionPrompts};
pub use settings::{
    GeneralSettings, LlmSettings, PromptSettings, SelectionSettings, ServerSettings, Settings,
    TranscriptionSettings,
};
