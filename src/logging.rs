//! Decision logging to `~/.local/share/cc-toolguard/gate.log`.
//!
//! Best-effort: if the log file cannot be opened, nothing is logged
//! (logging must never block the hook).

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;

use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

use crate::eval::{Evaluation, ToolInvocationRequest};

/// Environment variable that overrides `settings.log_level`.
pub const LOG_ENV: &str = "CC_TOOLGUARD_LOG";

fn log_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    let dir = PathBuf::from(home).join(".local/share/cc-toolguard");
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir.join("gate.log"))
}

/// Level from `CC_TOOLGUARD_LOG`, else `configured`, else `info`.
pub fn resolve_level(configured: &str) -> LevelFilter {
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|v| LevelFilter::from_str(v.trim()).ok())
        .or_else(|| LevelFilter::from_str(configured.trim()).ok())
        .unwrap_or(LevelFilter::Info)
}

/// Install the file logger. The logger itself accepts everything; the
/// effective level is the global max level, adjustable with [`set_level`]
/// once the configuration is known.
pub fn init(level: LevelFilter) {
    let Some(path) = log_path() else {
        return;
    };
    let Ok(file) = OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();
    if WriteLogger::init(LevelFilter::Trace, config, file).is_ok() {
        set_level(level);
    }
}

pub fn set_level(level: LevelFilter) {
    log::set_max_level(level);
}

/// One tab-separated line per decision:
/// decision, tool, session, subject, reason.
pub fn log_decision(request: &ToolInvocationRequest, evaluation: &Evaluation) {
    let subject: String = request
        .subject
        .chars()
        .take(200)
        .map(|c| if c == '\n' || c == '\t' { ' ' } else { c })
        .collect();
    let reason = evaluation
        .decision
        .reason()
        .or_else(|| evaluation.note.clone())
        .unwrap_or_default()
        .replace('\n', "; ");
    let session = if request.session_id.is_empty() {
        "-"
    } else {
        request.session_id.as_str()
    };
    log::info!(
        "{}\t{}\t{}\t{}\t{}",
        evaluation.decision.label(),
        request.tool.name(),
        session,
        subject,
        reason,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_parses() {
        // CC_TOOLGUARD_LOG is not set under `cargo test`
        if std::env::var_os(LOG_ENV).is_none() {
            assert_eq!(resolve_level("debug"), LevelFilter::Debug);
            assert_eq!(resolve_level("WARN"), LevelFilter::Warn);
            assert_eq!(resolve_level("nonsense"), LevelFilter::Info);
        }
    }
}
