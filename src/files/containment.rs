//! Path containment and target resolution.
//!
//! Containment is decided by computing a component-wise relative path, never
//! by comparing strings, so `/project-evil/x` is not inside `/project`.

use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("empty path")]
    Empty,
    #[error("broken symlink: {0}")]
    BrokenLink(PathBuf),
    #[error("cannot resolve {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Collapse `.` and `..` without touching the filesystem.
/// `..` never climbs above the root of an absolute path.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// `path` relative to `root`, if `path` lies at or below `root`.
pub fn relative_to(path: &Path, root: &Path) -> Option<PathBuf> {
    let path = lexical_normalize(path);
    let root = lexical_normalize(root);
    let rel = path.strip_prefix(&root).ok()?;
    // A surviving `..` means the path walked out of the root.
    if rel.components().any(|c| c == Component::ParentDir) {
        return None;
    }
    Some(rel.to_path_buf())
}

/// Whether `path` is `root` itself or lies beneath it.
pub fn is_inside(path: &Path, root: &Path) -> bool {
    relative_to(path, root).is_some()
}

/// Expand `~`, anchor relative paths at `base`, and normalize lexically.
pub fn absolutize(raw: &str, base: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(raw);
    let path = Path::new(expanded.as_ref());
    if path.is_absolute() {
        lexical_normalize(path)
    } else {
        lexical_normalize(&base.join(path))
    }
}

/// Resolve a root directory the same way targets are resolved, so both
/// sides of a containment check agree about symlinked ancestors.
pub fn resolve_root(root: &Path) -> PathBuf {
    let root = lexical_normalize(root);
    canonicalize_existing_prefix(&root).unwrap_or(root)
}

/// Resolve a write target to the real path that would be written.
///
/// Existing ancestors are canonicalized; if the final component is a
/// symlink, the link's real target is returned instead of the link name.
/// A dangling link or an unreadable ancestor is an error, never a guess.
pub fn resolve_target(raw: &str, project_root: &Path) -> Result<PathBuf, ResolveError> {
    if raw.trim().is_empty() {
        return Err(ResolveError::Empty);
    }
    let path = absolutize(raw, project_root);

    match std::fs::symlink_metadata(&path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            return std::fs::canonicalize(&path).map_err(|source| {
                if source.kind() == io::ErrorKind::NotFound {
                    ResolveError::BrokenLink(path.clone())
                } else {
                    ResolveError::Io {
                        path: path.clone(),
                        source,
                    }
                }
            });
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => return Err(ResolveError::Io { path, source }),
    }

    canonicalize_existing_prefix(&path)
}

/// Canonicalize the longest existing ancestor and re-append the rest.
fn canonicalize_existing_prefix(path: &Path) -> Result<PathBuf, ResolveError> {
    let mut existing = path.to_path_buf();
    let mut missing = Vec::new();
    loop {
        match std::fs::canonicalize(&existing) {
            Ok(mut resolved) => {
                for part in missing.iter().rev() {
                    resolved.push(part);
                }
                return Ok(resolved);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let Some(name) = existing.file_name().map(|n| n.to_os_string()) else {
                    return Ok(path.to_path_buf());
                };
                missing.push(name);
                if !existing.pop() {
                    return Ok(path.to_path_buf());
                }
            }
            Err(source) => {
                return Err(ResolveError::Io {
                    path: existing,
                    source,
                });
            }
        }
    }
}
