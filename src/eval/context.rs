use std::path::Path;

use crate::parse::{self, NormalizedCommand, ParsedPipeline, Redirection};

/// Everything the command rules look at, derived once from a normalized command.
#[derive(Debug)]
pub struct CommandContext<'a> {
    /// The canonical command text.
    pub normalized: &'a NormalizedCommand,
    /// Segments, operators and substitutions.
    pub pipeline: ParsedPipeline,
    /// All words in the command (tokenized via shlex), grouping removed.
    pub words: Vec<String>,
    /// The base command name (e.g. "git", "ls", "sudo").
    pub base_command: String,
    /// Detected output redirection, if any.
    pub redirection: Option<Redirection>,
    /// Directory the command runs in; used to find the current git branch.
    pub project_root: &'a Path,
}

impl<'a> CommandContext<'a> {
    pub fn new(normalized: &'a NormalizedCommand, project_root: &'a Path) -> Self {
        let text = normalized.as_str();
        Self {
            normalized,
            pipeline: parse::parse(normalized),
            words: parse::ungroup(parse::tokenize(text)),
            base_command: parse::base_command(text),
            redirection: parse::has_output_redirection(text),
            project_root,
        }
    }

    pub fn text(&self) -> &str {
        self.normalized.as_str()
    }

    pub fn is_compound(&self) -> bool {
        self.pipeline.is_compound()
    }

    /// The command that runs once wrappers like `sudo`, `env` and `xargs` are peeled off.
    pub fn effective(&self) -> Option<(&str, &[String])> {
        parse::effective_command(&self.words)
    }
}
