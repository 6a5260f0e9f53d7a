use std::fmt;

/// Reason family for a `Blocked` decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    DestructiveFilesystem,
    RawDeviceWrite,
    PermissionEscalation,
    ForkBomb,
    RemotePipeToShell,
    SubstitutionWrapsDenied,
    InlineScript,
    GitProtectedBranch,
    GitForcePush,
    GitDiscardsWork,
    SensitiveFile,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::DestructiveFilesystem => "destructive-filesystem",
            Category::RawDeviceWrite => "raw-device-write",
            Category::PermissionEscalation => "permission-escalation",
            Category::ForkBomb => "fork-bomb",
            Category::RemotePipeToShell => "remote-pipe-to-shell",
            Category::SubstitutionWrapsDenied => "substitution-wraps-denied",
            Category::InlineScript => "inline-script",
            Category::GitProtectedBranch => "git-protected-branch",
            Category::GitForcePush => "git-force-push",
            Category::GitDiscardsWork => "git-discards-work",
            Category::SensitiveFile => "sensitive-file",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Denied. `reason` is always non-empty; build through [`Decision::blocked`].
    Blocked { category: Category, reason: String },
    /// Permitted without prompting.
    AutoApproved { rule: String },
    /// Hand the request to the host's manual approval flow.
    Deferred,
}

impl Decision {
    pub fn blocked(category: Category, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let reason = if reason.trim().is_empty() {
            format!("blocked: {category}")
        } else {
            reason
        };
        Decision::Blocked { category, reason }
    }

    pub fn approved(rule: impl Into<String>) -> Self {
        Decision::AutoApproved { rule: rule.into() }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Blocked { .. } => "deny",
            Decision::AutoApproved { .. } => "allow",
            Decision::Deferred => "ask",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Decision::Blocked { .. } => "BLOCKED",
            Decision::AutoApproved { .. } => "AUTO-APPROVED",
            Decision::Deferred => "DEFERRED",
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Decision::Blocked { .. })
    }

    pub fn category(&self) -> Option<Category> {
        match self {
            Decision::Blocked { category, .. } => Some(*category),
            _ => None,
        }
    }

    /// Human-readable explanation: the deny reason or the approving rule.
    pub fn reason(&self) -> Option<String> {
        match self {
            Decision::Blocked { reason, .. } => Some(reason.clone()),
            Decision::AutoApproved { rule } => Some(format!("auto-approved by {rule}")),
            Decision::Deferred => None,
        }
    }
}

/// A stage's answer: `None` means no opinion, pass to the next stage.
pub type Verdict = Option<Decision>;
