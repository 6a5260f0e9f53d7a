//! Data-driven allow-list of read-only command prefixes.

use crate::commands::CommandRule;
use crate::commands::danger::classify_danger;
use crate::eval::{CommandContext, Decision, Policy, Verdict};

/// Auto-approves commands that start with a configured read-only prefix.
pub struct SafeBash;

/// `prefix` matches `text` on a word boundary: `git status` matches
/// `git status -s` but not `git statusx`.
fn matches_prefix(text: &str, prefix: &str) -> bool {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return false;
    }
    match text.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with(' '),
        None => false,
    }
}

/// `word` is `flag`, `flag=value`, or a short cluster holding a
/// single-letter `flag` (`-rD` for `-D`).
fn word_is_flag(word: &str, flag: &str) -> bool {
    if word == flag || word.strip_prefix(flag).is_some_and(|rest| rest.starts_with('=')) {
        return true;
    }
    let short = flag.strip_prefix('-').filter(|f| f.len() == 1 && *f != "-");
    match (short, word.strip_prefix('-')) {
        (Some(letter), Some(cluster)) if !cluster.starts_with('-') => cluster.contains(letter),
        _ => false,
    }
}

/// The first deny flag among the words after the matched prefix.
fn denied_flag<'a>(
    ctx: &CommandContext,
    prefix: &str,
    flags: &[&'a String],
) -> Option<&'a str> {
    let skip = prefix.split_whitespace().count();
    ctx.words.iter().skip(skip).find_map(|word| {
        flags
            .iter()
            .copied()
            .find(|flag| word_is_flag(word, flag))
            .map(String::as_str)
    })
}

/// Find the safe rule group matching a non-compound command.
///
/// Output redirection or a deny flag after the prefix voids any match.
pub fn match_safe(ctx: &CommandContext, policy: &Policy) -> Verdict {
    if ctx.is_compound() {
        return None;
    }
    let (rule, prefix) = policy.safe_rules.iter().find_map(|rule| {
        rule.prefixes
            .iter()
            .find(|p| matches_prefix(ctx.text(), p))
            .map(|p| (rule, p))
    })?;
    if let Some(ref r) = ctx.redirection {
        log::debug!("safe prefix {prefix:?} voided by {}", r.description);
        return None;
    }
    let flags: Vec<&String> = policy.deny_flags.iter().chain(&rule.deny_flags).collect();
    if let Some(flag) = denied_flag(ctx, prefix, &flags) {
        log::debug!("safe prefix {prefix:?} voided by {flag}");
        return None;
    }
    Some(Decision::approved(rule.name.as_str()))
}

/// Approve a command by the safe-prefix rules, or defer it.
///
/// Compound commands and anything the reject list matches are never approved.
pub fn auto_approve(ctx: &CommandContext, policy: &Policy) -> Decision {
    if ctx.is_compound() || classify_danger(ctx).is_some() {
        return Decision::Deferred;
    }
    match_safe(ctx, policy).unwrap_or(Decision::Deferred)
}

impl CommandRule for SafeBash {
    fn name(&self) -> &str {
        "safe-bash"
    }

    fn check(&self, ctx: &CommandContext, policy: &Policy) -> Verdict {
        match_safe(ctx, policy)
    }
}
