pub mod context;
pub mod decision;
pub mod policy;
pub mod request;

pub use context::CommandContext;
pub use decision::{Category, Decision, Verdict};
pub use policy::{Policy, SafeRule};
pub use request::{Tool, ToolInvocationRequest};

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::commands::CommandRule;
use crate::commands::danger::PATTERNS;
use crate::commands::git::GitSafety;
use crate::commands::learned::Learned;
use crate::commands::safe::SafeBash;
use crate::config::Config;
use crate::files;
use crate::parse;

/// Stages a request passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Received,
    Normalized,
    CompoundChecked,
    DangerClassified,
    PathGuarded,
    AutoApproveEvaluated,
}

impl PipelineState {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineState::Received => "received",
            PipelineState::Normalized => "normalized",
            PipelineState::CompoundChecked => "compound-checked",
            PipelineState::DangerClassified => "danger-classified",
            PipelineState::PathGuarded => "path-guarded",
            PipelineState::AutoApproveEvaluated => "auto-approve-evaluated",
        }
    }
}

/// The outcome of one request plus the stages it visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub decision: Decision,
    pub trail: Vec<PipelineState>,
    /// Why a request was deferred, when there is something to say.
    pub note: Option<String>,
}

impl Evaluation {
    fn deferred(trail: Vec<PipelineState>, note: impl Into<String>) -> Self {
        Self {
            decision: Decision::Deferred,
            trail,
            note: Some(note.into()),
        }
    }
}

/// One pipeline stage: `None` hands the subject to the next stage.
struct Step<S> {
    state: PipelineState,
    run: fn(&Policy, &S) -> Verdict,
}

/// Fold `steps` left to right; the first terminal decision wins.
fn run_steps<S>(
    steps: &[Step<S>],
    policy: &Policy,
    subject: &S,
    trail: &mut Vec<PipelineState>,
) -> Decision {
    for step in steps {
        trail.push(step.state);
        if let Some(decision) = (step.run)(policy, subject) {
            log::debug!("{} -> {}", step.state.as_str(), decision.label());
            return decision;
        }
    }
    Decision::Deferred
}

// ── Bash stages ──

fn bash_steps<'a>() -> [Step<CommandContext<'a>>; 3] {
    [
        Step {
            state: PipelineState::CompoundChecked,
            run: compound_checked,
        },
        Step {
            state: PipelineState::DangerClassified,
            run: danger_classified,
        },
        Step {
            state: PipelineState::AutoApproveEvaluated,
            run: auto_approve_command,
        },
    ]
}

fn compound_checked(_policy: &Policy, ctx: &CommandContext) -> Verdict {
    if ctx.is_compound() {
        log::debug!("compound command: {}", ctx.pipeline.describe());
    }
    None
}

fn danger_classified(policy: &Policy, ctx: &CommandContext) -> Verdict {
    PATTERNS
        .iter()
        .map(|p| p as &dyn CommandRule)
        .chain(std::iter::once(&GitSafety as &dyn CommandRule))
        .find_map(|rule| rule.check(ctx, policy))
}

fn auto_approve_command(policy: &Policy, ctx: &CommandContext) -> Verdict {
    if ctx.is_compound() {
        return Some(Decision::Deferred);
    }
    let rules: [&dyn CommandRule; 2] = [&SafeBash, &Learned];
    rules.iter().find_map(|rule| {
        let verdict = rule.check(ctx, policy);
        if verdict.is_some() {
            log::debug!("auto-approve rule {} answered", rule.name());
        }
        verdict
    })
}

// ── File-write stages ──

struct WriteTarget<'a> {
    resolved: PathBuf,
    project_root: &'a Path,
    additional_roots: &'a [PathBuf],
}

fn write_steps<'a>() -> [Step<WriteTarget<'a>>; 2] {
    [
        Step {
            state: PipelineState::PathGuarded,
            run: path_guarded,
        },
        Step {
            state: PipelineState::AutoApproveEvaluated,
            run: auto_approve_write,
        },
    ]
}

fn path_guarded(policy: &Policy, target: &WriteTarget) -> Verdict {
    files::guard_write(&target.resolved, policy)
}

fn auto_approve_write(policy: &Policy, target: &WriteTarget) -> Verdict {
    let located = files::locate(
        &target.resolved,
        target.project_root,
        target.additional_roots,
        policy,
    );
    Some(files::auto_approve(&located))
}

/// Evaluates requests against a shared, swappable [`Policy`].
pub struct Gate {
    policy: RwLock<Arc<Policy>>,
}

impl Default for Gate {
    fn default() -> Self {
        Self::new(Policy::default())
    }
}

impl Gate {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy: RwLock::new(Arc::new(policy)),
        }
    }

    /// Compile `config` and load learned patterns for `project_root`.
    pub fn from_config(config: &Config, project_root: &Path) -> Self {
        Self::new(Policy::load(config, project_root))
    }

    /// Snapshot of the current policy.
    pub fn policy(&self) -> Arc<Policy> {
        let guard = self.policy.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Swap the policy. Evaluations already running keep their snapshot.
    pub fn replace_policy(&self, policy: Policy) {
        let mut guard = self.policy.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(policy);
    }

    /// Classify one request. Never fails: internal errors become `Deferred`.
    pub fn evaluate(&self, request: &ToolInvocationRequest) -> Evaluation {
        let policy = self.policy();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            match &request.tool {
                Tool::Bash => evaluate_bash(request, &policy),
                tool if tool.writes_files() => evaluate_write(request, &policy),
                Tool::Other(name) => Evaluation::deferred(
                    vec![PipelineState::Received],
                    format!("no rules for tool {name}"),
                ),
                _ => Evaluation::deferred(vec![PipelineState::Received], "unsupported tool"),
            }
        }));
        let evaluation = outcome.unwrap_or_else(|_| {
            log::error!(
                "evaluation panicked for {} request; deferring",
                request.tool.name()
            );
            Evaluation::deferred(vec![PipelineState::Received], "internal error")
        });
        crate::logging::log_decision(request, &evaluation);
        evaluation
    }
}

fn evaluate_bash(request: &ToolInvocationRequest, policy: &Policy) -> Evaluation {
    let mut trail = vec![PipelineState::Received];
    let normalized = parse::normalize(&request.subject);
    trail.push(PipelineState::Normalized);
    if normalized.is_empty() {
        return Evaluation::deferred(trail, "empty command");
    }

    let ctx = CommandContext::new(&normalized, &request.project_root);
    let decision = run_steps(&bash_steps(), policy, &ctx, &mut trail);
    let note = match decision {
        Decision::Deferred if ctx.is_compound() => {
            Some(format!("compound command ({})", ctx.pipeline.describe()))
        }
        _ => None,
    };
    Evaluation {
        decision,
        trail,
        note,
    }
}

fn evaluate_write(request: &ToolInvocationRequest, policy: &Policy) -> Evaluation {
    let mut trail = vec![PipelineState::Received];
    let resolved = files::resolve_target(&request.subject, &request.project_root);
    trail.push(PipelineState::Normalized);
    let resolved = match resolved {
        Ok(path) => path,
        Err(e) => return Evaluation::deferred(trail, e.to_string()),
    };
    log::debug!("write target resolved to {}", resolved.display());

    let target = WriteTarget {
        resolved,
        project_root: &request.project_root,
        additional_roots: &request.additional_roots,
    };
    let decision = run_steps(&write_steps(), policy, &target, &mut trail);
    let note = match decision {
        Decision::Deferred => {
            let located = files::locate(
                &target.resolved,
                target.project_root,
                target.additional_roots,
                policy,
            );
            Some(match located.root {
                Some((root, _)) => format!("excluded directory under {}", root.display()),
                None => "outside trusted roots".to_string(),
            })
        }
        _ => None,
    };
    Evaluation {
        decision,
        trail,
        note,
    }
}
