//! cc-toolguard: a PreToolUse hook for Claude Code that gates shell commands
//! and file writes before they run.
//!
//! Every request ends in exactly one [`eval::Decision`]: `Blocked` (with a
//! category and reason), `AutoApproved` (with the rule that approved it), or
//! `Deferred` to the user's normal approval prompt. Anything the gate cannot
//! classify with confidence is deferred.
//!
//! # Architecture
//!
//! - **[`parse`]**: Command normalization, quote-aware operator and substitution scanner, shlex tokenizer.
//! - **[`commands`]**: Reject list, git safety rules, safe-prefix and learned-pattern allow-lists.
//! - **[`files`]**: Write-target resolution, sensitive-file guard, trusted-root containment.
//! - **[`eval`]**: Decision types, compiled policy, and the [`Gate`](eval::Gate) pipeline.
//! - **[`config`]**: Configuration loading: embedded defaults + user overlay merge.
//! - **[`logging`]**: Decision logging to `~/.local/share/cc-toolguard/gate.log`.

/// Command rules: reject list, git safety, allow-lists.
pub mod commands;
/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Decision pipeline, policy, request and decision types.
pub mod eval;
/// File write checks.
pub mod files;
/// File-based decision logging.
pub mod logging;
/// Shell command normalization and parsing.
pub mod parse;

use eval::{Evaluation, Gate, ToolInvocationRequest};

/// Evaluate one request against the default configuration.
///
/// This is the main entry point for tests and simple usage. Learned patterns
/// are not loaded; build a [`Gate`] with [`Gate::from_config`] for that.
pub fn evaluate(request: &ToolInvocationRequest) -> Evaluation {
    Gate::default().evaluate(request)
}
