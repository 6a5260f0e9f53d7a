//! Command prefixes the user approved in earlier sessions.
//!
//! Patterns are plain strings, matched as case-insensitive literal prefixes
//! of the normalized command. They are never compiled into a regex or glob.
//! Any problem reading the file yields an empty list.

use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::commands::CommandRule;
use crate::commands::danger::classify_danger;
use crate::commands::git::GitSafety;
use crate::config::LearnedConfig;
use crate::eval::{CommandContext, Decision, Policy, Verdict};
use crate::files::containment::absolutize;

#[derive(Debug, Error)]
pub enum LearnedError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path} is {size} bytes, limit is {limit}")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },
    #[error("malformed learned-pattern file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Accepted layouts: `["npm run build", ...]` or
/// `{"patterns": [...]}` / `{"autoApprovePatterns": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum LearnedFile {
    List(Vec<String>),
    Object {
        #[serde(default, alias = "autoApprovePatterns")]
        patterns: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LearnedPattern {
    text: String,
    folded: String,
}

#[derive(Debug, Clone, Default)]
pub struct LearnedPatterns {
    patterns: Vec<LearnedPattern>,
}

impl LearnedPatterns {
    /// Validate raw strings. Empty, overlong or control-character entries are dropped.
    pub fn from_strings<I, S>(raw: I, config: &LearnedConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut patterns = Vec::new();
        for text in raw {
            let text: String = text.into();
            if text.trim().is_empty()
                || text.chars().count() > config.max_pattern_len
                || text.chars().any(char::is_control)
            {
                log::debug!("skipping invalid learned pattern {text:?}");
                continue;
            }
            if patterns.len() >= config.max_patterns {
                log::warn!(
                    "learned patterns truncated to {} entries",
                    config.max_patterns
                );
                break;
            }
            patterns.push(LearnedPattern {
                folded: text.to_lowercase(),
                text,
            });
        }
        Self { patterns }
    }

    /// Read a learned-pattern file. A missing file is an empty list.
    pub fn load(path: &Path, config: &LearnedConfig) -> Result<Self, LearnedError> {
        let meta = match std::fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(LearnedError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        if meta.len() > config.max_file_bytes {
            return Err(LearnedError::TooLarge {
                path: path.to_path_buf(),
                size: meta.len(),
                limit: config.max_file_bytes,
            });
        }
        let content = std::fs::read_to_string(path).map_err(|source| LearnedError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: LearnedFile =
            serde_json::from_str(&content).map_err(|source| LearnedError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        let raw = match file {
            LearnedFile::List(list) => list,
            LearnedFile::Object { patterns } => patterns,
        };
        Ok(Self::from_strings(raw, config))
    }

    /// Load the configured file for `project_root`, logging and discarding any error.
    pub fn load_or_empty(config: &LearnedConfig, project_root: &Path) -> Self {
        if config.path.trim().is_empty() {
            return Self::default();
        }
        let path = absolutize(&config.path, project_root);
        match Self::load(&path, config) {
            Ok(patterns) => {
                log::debug!("loaded {} learned patterns", patterns.len());
                patterns
            }
            Err(e) => {
                log::warn!("ignoring learned patterns: {e}");
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The first pattern that is a case-insensitive prefix of `command`.
    pub fn find_match(&self, command: &str) -> Option<&str> {
        let folded = command.to_lowercase();
        self.patterns
            .iter()
            .find(|p| folded.starts_with(&p.folded))
            .map(|p| p.text.as_str())
    }
}

/// Approve a command the user approved before.
///
/// The reject list and git rules are re-checked first, and compound
/// commands defer, so a learned prefix can never approve
/// `npm test && rm -rf /`.
pub fn auto_approve_learned(ctx: &CommandContext, policy: &Policy) -> Verdict {
    if let Some(blocked) = classify_danger(ctx).or_else(|| GitSafety.check(ctx, policy)) {
        return Some(blocked);
    }
    if ctx.is_compound() {
        return Some(Decision::Deferred);
    }
    let pattern = policy.learned.find_match(ctx.text())?;
    if let Some(ref r) = ctx.redirection {
        log::debug!("learned pattern {pattern:?} voided by {}", r.description);
        return None;
    }
    Some(Decision::approved(format!("learned:{pattern}")))
}

/// Pipeline adapter for [`auto_approve_learned`].
pub struct Learned;

impl CommandRule for Learned {
    fn name(&self) -> &str {
        "learned"
    }

    fn check(&self, ctx: &CommandContext, policy: &Policy) -> Verdict {
        auto_approve_learned(ctx, policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::eval::Category;
    use crate::parse::normalize;

    fn config() -> LearnedConfig {
        Config::default_config().learned
    }

    fn policy_with(patterns: &[&str]) -> Policy {
        let learned = LearnedPatterns::from_strings(patterns.iter().copied(), &config());
        Policy::default().with_learned(learned)
    }

    fn run(cmd: &str, policy: &Policy) -> Verdict {
        let normalized = normalize(cmd);
        let ctx = CommandContext::new(&normalized, Path::new("/nonexistent-repo-xyz"));
        auto_approve_learned(&ctx, policy)
    }

    #[test]
    fn prefix_match_approves() {
        let policy = policy_with(&["npm run build"]);
        assert_eq!(
            run("npm run build --prod", &policy),
            Some(Decision::approved("learned:npm run build"))
        );
    }

    #[test]
    fn match_is_case_insensitive() {
        let policy = policy_with(&["Make Docs"]);
        assert_eq!(
            run("make docs", &policy),
            Some(Decision::approved("learned:Make Docs"))
        );
    }

    #[test]
    fn pattern_is_literal_not_regex() {
        let policy = policy_with(&["npm .*"]);
        assert_eq!(run("npm install", &policy), None);
    }

    #[test]
    fn no_match_has_no_opinion() {
        let policy = policy_with(&["npm run build"]);
        assert_eq!(run("npm publish", &policy), None);
    }

    #[test]
    fn redirection_voids_learned_match() {
        let policy = policy_with(&["echo"]);
        assert_eq!(run("echo x > ~/.bashrc", &policy), None);
        assert_eq!(run("echo x >> notes.md", &policy), None);
        assert_eq!(
            run("echo x 2>/dev/null", &policy),
            Some(Decision::approved("learned:echo"))
        );
    }

    #[test]
    fn compound_defers_even_with_match() {
        let policy = policy_with(&["npm test"]);
        assert_eq!(run("npm test && npm publish", &policy), Some(Decision::Deferred));
    }

    #[test]
    fn reject_list_wins_over_learned() {
        let policy = policy_with(&["rm"]);
        let verdict = run("rm -rf /", &policy).unwrap();
        assert_eq!(verdict.category(), Some(Category::DestructiveFilesystem));
    }

    #[test]
    fn git_rules_win_over_learned() {
        let policy = policy_with(&["git push"]);
        let verdict = run("git push --force origin feature", &policy).unwrap();
        assert_eq!(verdict.category(), Some(Category::GitForcePush));
    }

    #[test]
    fn invalid_entries_are_skipped() {
        let long = "x".repeat(500);
        let learned = LearnedPatterns::from_strings(
            ["", "   ", "ok cmd", "bad\u{7}bell", long.as_str()],
            &config(),
        );
        assert_eq!(learned.len(), 1);
        assert_eq!(learned.find_match("ok cmd --flag"), Some("ok cmd"));
    }

    #[test]
    fn load_bare_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learned.json");
        std::fs::write(&path, r#"["cargo build", "just fmt"]"#).unwrap();
        let learned = LearnedPatterns::load(&path, &config()).unwrap();
        assert_eq!(learned.len(), 2);
    }

    #[test]
    fn load_object_forms() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.json");
        std::fs::write(&a, r#"{"patterns": ["cargo build"]}"#).unwrap();
        std::fs::write(&b, r#"{"autoApprovePatterns": ["just fmt"], "version": 2}"#).unwrap();
        assert_eq!(LearnedPatterns::load(&a, &config()).unwrap().len(), 1);
        assert_eq!(LearnedPatterns::load(&b, &config()).unwrap().len(), 1);
    }

    #[test]
    fn missing_file_is_empty() {
        let learned =
            LearnedPatterns::load(Path::new("/nonexistent-xyz/learned.json"), &config()).unwrap();
        assert!(learned.is_empty());
    }

    #[test]
    fn malformed_file_fails_closed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learned.json");
        std::fs::write(&path, r#"["cargo build", 42]"#).unwrap();
        assert!(matches!(
            LearnedPatterns::load(&path, &config()),
            Err(LearnedError::Malformed { .. })
        ));

        let mut cfg = config();
        cfg.path = path.to_string_lossy().into_owned();
        assert!(LearnedPatterns::load_or_empty(&cfg, dir.path()).is_empty());
    }

    #[test]
    fn oversized_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learned.json");
        std::fs::write(&path, r#"["cargo build"]"#).unwrap();
        let mut cfg = config();
        cfg.max_file_bytes = 4;
        assert!(matches!(
            LearnedPatterns::load(&path, &cfg),
            Err(LearnedError::TooLarge { .. })
        ));
    }

    #[test]
    fn relative_path_resolves_against_project_root() {
        let dir = tempfile::tempdir().unwrap();
        let feedback = dir.path().join(".claude/feedback");
        std::fs::create_dir_all(&feedback).unwrap();
        std::fs::write(feedback.join("learned-patterns.json"), r#"["make docs"]"#).unwrap();
        let learned = LearnedPatterns::load_or_empty(&config(), dir.path());
        assert_eq!(learned.find_match("make docs"), Some("make docs"));
    }
}
