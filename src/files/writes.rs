use std::path::{Component, Path, PathBuf};

use super::containment::{absolutize, relative_to, resolve_root};
use crate::eval::{Decision, Policy};

/// Which trusted root a write target falls under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    Project,
    Additional,
}

impl RootKind {
    pub fn rule_name(self) -> &'static str {
        match self {
            RootKind::Project => "project-root",
            RootKind::Additional => "additional-directory",
        }
    }
}

/// Where a resolved write target sits relative to the trusted roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathDecision {
    pub resolved: PathBuf,
    /// First root containing the target, with its kind.
    pub root: Option<(PathBuf, RootKind)>,
    /// The target lies under an excluded directory of that root.
    pub excluded: bool,
}

/// Find the first root (project root, then additional roots in order)
/// containing `resolved`, and whether the match is under an excluded directory.
pub fn locate(
    resolved: &Path,
    project_root: &Path,
    additional_roots: &[PathBuf],
    policy: &Policy,
) -> PathDecision {
    let roots = std::iter::once((resolve_root(project_root), RootKind::Project)).chain(
        additional_roots.iter().map(|r| {
            let raw = r.to_string_lossy();
            (resolve_root(&absolutize(&raw, project_root)), RootKind::Additional)
        }),
    );

    for (root, kind) in roots {
        if let Some(rel) = relative_to(resolved, &root) {
            let excluded = under_excluded_dir(&rel, &policy.excluded_dirs);
            return PathDecision {
                resolved: resolved.to_path_buf(),
                root: Some((root, kind)),
                excluded,
            };
        }
    }

    PathDecision {
        resolved: resolved.to_path_buf(),
        root: None,
        excluded: false,
    }
}

/// Directory components of `rel` (not the file name itself) that are excluded.
fn under_excluded_dir(rel: &Path, excluded_dirs: &[String]) -> bool {
    let Some(parent) = rel.parent() else {
        return false;
    };
    parent.components().any(|c| match c {
        Component::Normal(name) => name
            .to_str()
            .is_some_and(|n| excluded_dirs.iter().any(|d| d == n)),
        _ => false,
    })
}

/// Contained and not excluded → approved by the root's rule; anything else defers.
pub fn auto_approve(decision: &PathDecision) -> Decision {
    match &decision.root {
        Some((_, kind)) if !decision.excluded => Decision::approved(kind.rule_name()),
        _ => Decision::Deferred,
    }
}
