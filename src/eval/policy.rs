use std::path::Path;

use glob::Pattern;

use crate::commands::learned::LearnedPatterns;
use crate::config::Config;

/// A named group of read-only command prefixes.
#[derive(Debug, Clone)]
pub struct SafeRule {
    pub name: String,
    pub prefixes: Vec<String>,
    /// Words that void a match in this group, on top of the shared list.
    pub deny_flags: Vec<String>,
}

/// Compiled, immutable view of the configuration shared by every evaluation.
///
/// Built once per process (or per [`Gate::replace_policy`](super::Gate::replace_policy))
/// and never mutated afterwards.
#[derive(Debug)]
pub struct Policy {
    /// Safe-bash rule groups, in config order.
    pub safe_rules: Vec<SafeRule>,
    /// Words that void a match in every group.
    pub deny_flags: Vec<String>,
    pub protected_branches: Vec<String>,
    pub force_push_flags: Vec<String>,
    pub sensitive: Vec<Pattern>,
    pub sensitive_exceptions: Vec<Pattern>,
    pub excluded_dirs: Vec<String>,
    pub learned: LearnedPatterns,
}

impl Policy {
    /// Compile a config without any learned patterns.
    pub fn compile(config: &Config) -> Self {
        Self {
            safe_rules: config
                .safe_bash
                .rules
                .iter()
                .map(|(name, prefixes)| SafeRule {
                    name: name.clone(),
                    prefixes: prefixes.clone(),
                    deny_flags: config
                        .safe_bash
                        .group_deny_flags
                        .get(name)
                        .cloned()
                        .unwrap_or_default(),
                })
                .collect(),
            deny_flags: config.safe_bash.deny_flags.clone(),
            protected_branches: config.git.protected_branches.clone(),
            force_push_flags: config.git.force_push_flags.clone(),
            sensitive: compile_globs(&config.files.sensitive),
            sensitive_exceptions: compile_globs(&config.files.sensitive_exceptions),
            excluded_dirs: config.files.excluded_dirs.clone(),
            learned: LearnedPatterns::default(),
        }
    }

    /// Compile a config and load the learned-pattern file for `project_root`.
    pub fn load(config: &Config, project_root: &Path) -> Self {
        let learned = LearnedPatterns::load_or_empty(&config.learned, project_root);
        Self::compile(config).with_learned(learned)
    }

    pub fn with_learned(mut self, learned: LearnedPatterns) -> Self {
        self.learned = learned;
        self
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::compile(&Config::default_config())
    }
}

fn compile_globs(patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|p| match Pattern::new(&p.to_lowercase()) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                log::warn!("ignoring invalid file pattern {p:?}: {e}");
                None
            }
        })
        .collect()
}
