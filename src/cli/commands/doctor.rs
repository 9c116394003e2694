//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::Settings;
use crate::openai::api_key;
use crate::transcript::FileTranscriptStore;
use console::style;
use std::process::Command;

/// Outcome of one diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

/// One line of the doctor report.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

impl CheckResult {
    fn new(status: CheckStatus, name: &str, message: &str, hint: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.to_string(),
            hint: hint.map(str::to_string),
        }
    }

    fn ok(name: &str, message: &str) -> Self {
        Self::new(CheckStatus::Ok, name, message, None)
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self::new(CheckStatus::Warning, name, message, Some(hint))
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self::new(CheckStatus::Error, name, message, Some(hint))
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);
        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &std::path::Path) -> anyhow::Result<()> {
    Output::header("Clipscout Doctor");
    println!();

    let sections = [
        (
            "External Tools",
            vec![check_tool("ffmpeg"), check_tool("ffprobe")],
        ),
        ("API Configuration", vec![check_api_key(settings)]),
        ("Transcripts", check_transcripts(settings)),
        ("Configuration", vec![check_config_file(config_path)]),
    ];

    let mut errors = 0;
    let mut warnings = 0;

    for (title, checks) in &sections {
        println!("{}", style(title).bold());
        for check in checks {
            check.print();
            match check.status {
                CheckStatus::Error => errors += 1,
                CheckStatus::Warning => warnings += 1,
                CheckStatus::Ok => {}
            }
        }
        println!();
    }

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Clipscout.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Clipscout is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> CheckResult {
    match Command::new(name).arg("-version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .chars()
                .take(50)
                .collect::<String>();
            CheckResult::ok(name, &version)
        }
        Ok(_) => CheckResult::error(name, "installed but not working", install_hint_ffmpeg()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, "not found", install_hint_ffmpeg())
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), install_hint_ffmpeg()),
    }
}

fn check_api_key(settings: &Settings) -> CheckResult {
    let name = settings.llm.api_key_env.as_str();
    match api_key(&settings.llm) {
        Ok(key) if key.chars().count() > 12 => {
            let chars: Vec<char> = key.chars().collect();
            let masked = format!(
                "{}...{}",
                chars[..4].iter().collect::<String>(),
                chars[chars.len() - 4..].iter().collect::<String>()
            );
            CheckResult::ok(name, &format!("configured ({})", masked))
        }
        Ok(_) => CheckResult::warning(name, "set but looks too short", "Check the key value"),
        Err(_) => CheckResult::error(name, "not set", &format!("Set with: export {}='...'", name)),
    }
}

fn check_transcripts(settings: &Settings) -> Vec<CheckResult> {
    let store = FileTranscriptStore::new(settings.transcript_dir());
    let dir = store.dir().display().to_string();

    let count = match store.list() {
        Ok(records) => records.len(),
        Err(e) => return vec![CheckResult::error("Transcript store", &format!("{}: {}", dir, e), "Check directory permissions")],
    };

    let mut results = vec![CheckResult::ok("Transcript store", &format!("{} ({} stored)", dir, count))];

    match store.active_id() {
        Ok(Some(id)) => results.push(CheckResult::ok("Active transcript", &id)),
        Ok(None) => results.push(CheckResult::warning(
            "Active transcript",
            "none",
            "Create one with: clipscout ingest <video>",
        )),
        Err(e) => results.push(CheckResult::error("Active transcript", &e.to_string(), "Re-run ingest")),
    }

    results
}

fn check_config_file(config_path: &std::path::Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning("Config file", "using defaults", "Create with: clipscout config edit")
    }
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}
