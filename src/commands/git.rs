use std::path::{Path, PathBuf};

use crate::commands::CommandRule;
use crate::eval::{Category, CommandContext, Decision, Policy, Verdict};
use crate::files::containment::absolutize;

/// Git rules that protect branches and uncommitted work.
pub struct GitSafety;

/// A `git` call with global options peeled off.
#[derive(Debug)]
struct GitInvocation<'a> {
    subcommand: &'a str,
    args: &'a [String],
    /// Directory from `-C <dir>`, if given.
    dir: Option<&'a str>,
}

impl<'a> GitInvocation<'a> {
    fn parse(ctx: &'a CommandContext) -> Option<Self> {
        let (name, args) = ctx.effective()?;
        if name != "git" {
            return None;
        }
        let mut dir = None;
        let mut i = 0;
        while let Some(word) = args.get(i) {
            match word.as_str() {
                "-C" => {
                    dir = args.get(i + 1).map(String::as_str);
                    i += 2;
                }
                "-c" | "--git-dir" | "--work-tree" | "--namespace" | "--exec-path" => i += 2,
                w if w.starts_with('-') => i += 1,
                _ => break,
            }
        }
        Some(Self {
            subcommand: args.get(i)?,
            args: &args[i + 1..],
            dir,
        })
    }

    fn has(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a == flag)
    }

    /// Combined short flags such as `-fd` contain `letter`.
    fn has_short(&self, letter: char) -> bool {
        self.args.iter().any(|a| {
            a.len() > 1 && a.starts_with('-') && !a.starts_with("--") && a[1..].contains(letter)
        })
    }

    fn repo_dir(&self, project_root: &Path) -> PathBuf {
        match self.dir {
            Some(dir) => absolutize(dir, project_root),
            None => project_root.to_path_buf(),
        }
    }
}

/// Read the checked-out branch of the repository containing `dir`.
///
/// Walks up from `dir` to the nearest `.git`, following `gitdir:` files
/// used by worktrees and submodules. Detached HEAD yields `None`.
pub fn current_branch(dir: &Path) -> Option<String> {
    let git_dir = dir.ancestors().find_map(|d| {
        let candidate = d.join(".git");
        if candidate.is_dir() {
            Some(candidate)
        } else if candidate.is_file() {
            let content = std::fs::read_to_string(&candidate).ok()?;
            let target = content.trim().strip_prefix("gitdir:")?.trim();
            Some(d.join(target))
        } else {
            None
        }
    })?;
    let head = std::fs::read_to_string(git_dir.join("HEAD")).ok()?;
    head.trim()
        .strip_prefix("ref: refs/heads/")
        .map(|b| b.to_string())
}

impl GitSafety {
    fn is_protected(policy: &Policy, branch: &str) -> bool {
        policy.protected_branches.iter().any(|b| b == branch)
    }

    fn check_commit(git: &GitInvocation, ctx: &CommandContext, policy: &Policy) -> Verdict {
        let branch = current_branch(&git.repo_dir(ctx.project_root))?;
        if Self::is_protected(policy, &branch) {
            return Some(Decision::blocked(
                Category::GitProtectedBranch,
                format!("git commit directly on protected branch {branch}"),
            ));
        }
        None
    }

    fn check_push(git: &GitInvocation, ctx: &CommandContext, policy: &Policy) -> Verdict {
        let mut positional = Vec::new();
        let mut force = None;
        let mut i = 0;
        while let Some(arg) = git.args.get(i) {
            i += 1;
            let is_force_flag = policy
                .force_push_flags
                .iter()
                .any(|f| arg == f || arg.starts_with(&format!("{f}=")));
            if is_force_flag || arg == "--mirror" {
                force = Some(arg.clone());
            } else if arg.starts_with("--") {
                if matches!(arg.as_str(), "--repo" | "--push-option" | "--receive-pack" | "--exec")
                {
                    i += 1;
                }
            } else if arg.starts_with('-') && arg.len() > 1 {
                if arg[1..].contains('f') {
                    force = Some(arg.clone());
                }
                if arg == "-o" {
                    i += 1;
                }
            } else {
                positional.push(arg.as_str());
            }
        }

        if let Some(flag) = force {
            return Some(Decision::blocked(
                Category::GitForcePush,
                format!("force push ({flag}) rewrites remote history"),
            ));
        }
        let refspecs = positional.get(1..).unwrap_or_default();
        if let Some(spec) = refspecs.iter().find(|r| r.starts_with('+')) {
            return Some(Decision::blocked(
                Category::GitForcePush,
                format!("force push via refspec {spec}"),
            ));
        }

        let current = || current_branch(&git.repo_dir(ctx.project_root));
        if refspecs.is_empty() || git.has("--all") {
            if git.has("--all") {
                if let Some(branch) = policy.protected_branches.first() {
                    return Some(Decision::blocked(
                        Category::GitProtectedBranch,
                        format!("git push --all includes protected branch {branch}"),
                    ));
                }
            }
            let branch = current()?;
            if Self::is_protected(policy, &branch) {
                return Some(Decision::blocked(
                    Category::GitProtectedBranch,
                    format!("git push from protected branch {branch}"),
                ));
            }
            return None;
        }

        for spec in refspecs {
            let dst = spec.rsplit_once(':').map_or(*spec, |(_, dst)| dst);
            let dst = dst.strip_prefix("refs/heads/").unwrap_or(dst);
            let dst = if dst == "HEAD" {
                match current() {
                    Some(branch) => branch,
                    None => continue,
                }
            } else {
                dst.to_string()
            };
            if Self::is_protected(policy, &dst) {
                return Some(Decision::blocked(
                    Category::GitProtectedBranch,
                    format!("git push to protected branch {dst}"),
                ));
            }
        }
        None
    }

    fn check_discards(git: &GitInvocation) -> Verdict {
        let discards = match git.subcommand {
            "clean" => !(git.has("--dry-run") || git.has_short('n')),
            "reset" => git.has("--hard"),
            "checkout" => {
                let after_dashdash = git
                    .args
                    .iter()
                    .position(|a| a == "--")
                    .map(|p| &git.args[p + 1..]);
                git.has(".")
                    || git.has("--force")
                    || git.has("-f")
                    || after_dashdash
                        .is_some_and(|rest| rest.is_empty() || rest.iter().any(|a| a == "."))
            }
            "restore" => git.has(".") && !(git.has("--staged") || git.has("-S")),
            _ => false,
        };
        if discards {
            let line = std::iter::once(git.subcommand)
                .chain(git.args.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(" ");
            return Some(Decision::blocked(
                Category::GitDiscardsWork,
                format!("git {line} discards uncommitted work"),
            ));
        }
        None
    }
}

impl CommandRule for GitSafety {
    fn name(&self) -> &str {
        "git-safety"
    }

    fn check(&self, ctx: &CommandContext, policy: &Policy) -> Verdict {
        if ctx.is_compound() {
            return None;
        }
        let git = GitInvocation::parse(ctx)?;
        match git.subcommand {
            "commit" => Self::check_commit(&git, ctx, policy),
            "push" => Self::check_push(&git, ctx, policy),
            _ => Self::check_discards(&git),
        }
    }
}
