use std::path::Path;

use glob::MatchOptions;

use crate::eval::{Category, Decision, Policy, Verdict};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Whether the file name of `path` is a credential or secret file.
pub fn is_sensitive(path: &Path, policy: &Policy) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let name = name.to_lowercase();
    if policy
        .sensitive_exceptions
        .iter()
        .any(|p| p.matches_with(&name, MATCH_OPTIONS))
    {
        return false;
    }
    policy
        .sensitive
        .iter()
        .any(|p| p.matches_with(&name, MATCH_OPTIONS))
}

/// Block writes whose resolved target is a sensitive file, wherever it lives.
///
/// `resolved` must already be the real target (see
/// [`resolve_target`](super::resolve_target)); a symlink named `notes.txt`
/// that points at `.env` is judged as `.env`.
pub fn guard_write(resolved: &Path, policy: &Policy) -> Verdict {
    if is_sensitive(resolved, policy) {
        return Some(Decision::blocked(
            Category::SensitiveFile,
            format!("write to sensitive file {}", resolved.display()),
        ));
    }
    None
}
