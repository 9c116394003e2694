//! CLI module for Clipscout.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Clipscout - find the moments in a video that answer your question
///
/// Transcribes a video once, then asks an LLM to pick the three transcript
/// segments most relevant to a query.
#[derive(Parser, Debug)]
#[command(name = "clipscout")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check system requirements and configuration
    Doctor,

    /// Transcribe a local video and make it the active transcript
    Ingest {
        /// Path to the video file
        video: PathBuf,
    },

    /// Find the segments most relevant to a query
    Find {
        /// What to look for in the video
        query: String,

        /// Transcript id (defaults to the active transcript)
        #[arg(short, long)]
        transcript: Option<String>,

        /// Skip the LLM summary of the selected segments
        #[arg(long)]
        no_summary: bool,

        /// Print the raw JSON result
        #[arg(long)]
        json: bool,
    },

    /// Start an interactive chat about a transcript
    Chat {
        /// Transcript id (defaults to the active transcript)
        #[arg(short, long)]
        transcript: Option<String>,
    },

    /// List stored transcripts
    List,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_find() {
        let cli = Cli::try_parse_from(["clipscout", "-v", "find", "pricing plans", "--no-summary"]).unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Find { query, transcript, no_summary, json } => {
                assert_eq!(query, "pricing plans");
                assert!(transcript.is_none());
                assert!(no_summary);
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["clipscout", "serve"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { host: None, port: None }));
    }
}
