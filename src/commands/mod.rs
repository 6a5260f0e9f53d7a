//! Command rules: the reject list, git safety, and the two allow-lists.
//!
//! Each rule looks at a [`CommandContext`] and either has no opinion
//! (`None`) or returns a terminal [`Decision`](crate::eval::Decision).

/// Built-in reject list (destructive commands, raw device writes, fork bombs, ...).
pub mod danger;
/// Protected branches, force pushes and commands that discard work.
pub mod git;
/// Previously approved command prefixes.
pub mod learned;
/// Configured read-only command prefixes.
pub mod safe;

use crate::eval::{CommandContext, Policy, Verdict};

/// A rule the pipeline can run against a Bash command.
pub trait CommandRule: Send + Sync {
    /// Short identifier used in debug logs.
    fn name(&self) -> &str;

    /// `None` passes the command on to the next rule.
    fn check(&self, ctx: &CommandContext, policy: &Policy) -> Verdict;
}
