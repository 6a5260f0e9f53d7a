//! Types produced by the shell parser and consumed by the eval layer.

use std::fmt;

/// Shell operator separating consecutive pipeline segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `&&`: run next only if previous succeeded
    And,
    /// `||`: run next only if previous failed
    Or,
    /// `;`: run next unconditionally
    Semi,
    /// `|`: pipe stdout
    Pipe,
    /// `|&`: pipe stdout+stderr
    PipeErr,
    /// `&`: run previous in the background
    Background,
}

impl Operator {
    /// The operator's shell syntax.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Semi => ";",
            Operator::Pipe => "|",
            Operator::PipeErr => "|&",
            Operator::Background => "&",
        }
    }
}

/// A single command within a compound pipeline.
///
/// Any `$()`, backtick, or process substitution spans have been replaced
/// with `__SUBST__` placeholders.
#[derive(Debug, Clone)]
pub struct ShellSegment {
    /// Command text, with substitution spans replaced by `__SUBST__`.
    pub command: String,
    /// Output redirection detected in this segment.
    pub redirection: Option<Redirection>,
}

/// Describes an output redirection that may mutate filesystem state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    /// Human-readable description, e.g. `"output redirection (>)"`.
    pub description: String,
}

/// A fully decomposed command: segments interleaved with operators,
/// plus the inner text of every top-level substitution.
///
/// For a simple command like `ls -la`, there is one segment, no operators
/// and no substitutions. For `a && b | c`, there are three segments and
/// two operators (`&&`, `|`).
#[derive(Debug, Clone)]
pub struct ParsedPipeline {
    pub segments: Vec<ShellSegment>,
    pub operators: Vec<Operator>,
    pub substitutions: Vec<String>,
}

impl ParsedPipeline {
    /// More than one shell-level operation: several segments or any substitution.
    pub fn is_compound(&self) -> bool {
        self.segments.len() > 1 || !self.substitutions.is_empty()
    }

    /// Short description of what made this pipeline compound, e.g. `"&&, |; 1 substitution(s)"`.
    pub fn describe(&self) -> String {
        let mut desc = Vec::new();
        if !self.operators.is_empty() {
            let mut ops: Vec<&str> = self.operators.iter().map(|o| o.as_str()).collect();
            ops.sort();
            ops.dedup();
            desc.push(ops.join(", "));
        }
        if !self.substitutions.is_empty() {
            desc.push(format!("{} substitution(s)", self.substitutions.len()));
        }
        desc.join("; ")
    }
}

/// Canonical form of a raw command, produced by [`normalize`](super::normalize).
///
/// Only the normalizer constructs this type, so holding one means the
/// string is already at its fixed point.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedCommand(pub(crate) String);

impl NormalizedCommand {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for NormalizedCommand {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
