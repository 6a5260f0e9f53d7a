use std::path::PathBuf;

/// Which host tool the request targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tool {
    Bash,
    Write,
    Edit,
    MultiEdit,
    Other(String),
}

impl Tool {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Bash" => Tool::Bash,
            "Write" => Tool::Write,
            "Edit" => Tool::Edit,
            "MultiEdit" => Tool::MultiEdit,
            other => Tool::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Tool::Bash => "Bash",
            Tool::Write => "Write",
            Tool::Edit => "Edit",
            Tool::MultiEdit => "MultiEdit",
            Tool::Other(name) => name,
        }
    }

    pub fn writes_files(&self) -> bool {
        matches!(self, Tool::Write | Tool::Edit | Tool::MultiEdit)
    }
}

/// One proposed action, as received from the host. Never mutated.
#[derive(Debug, Clone)]
pub struct ToolInvocationRequest {
    pub tool: Tool,
    /// Shell command for `Bash`, file path for writes.
    pub subject: String,
    pub session_id: String,
    pub project_root: PathBuf,
    /// User-mounted extra roots, in the order the host supplied them.
    pub additional_roots: Vec<PathBuf>,
}

impl ToolInvocationRequest {
    pub fn bash(command: impl Into<String>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            tool: Tool::Bash,
            subject: command.into(),
            session_id: String::new(),
            project_root: project_root.into(),
            additional_roots: Vec::new(),
        }
    }

    pub fn write(path: impl Into<String>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            tool: Tool::Write,
            subject: path.into(),
            session_id: String::new(),
            project_root: project_root.into(),
            additional_roots: Vec::new(),
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_additional_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.additional_roots = roots;
        self
    }
}
