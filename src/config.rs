use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub safe_bash: SafeBashConfig,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub learned: LearnedConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

/// Read-only command prefixes that may run without prompting.
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct SafeBashConfig {
    /// Rule name → command prefixes, matched on word boundaries.
    #[serde(default)]
    pub rules: BTreeMap<String, Vec<String>>,
    /// Words that void a prefix match (e.g. `--output`, `-delete`).
    #[serde(default)]
    pub deny_flags: Vec<String>,
    /// Rule name → extra words that void a match in that group only.
    #[serde(default)]
    pub group_deny_flags: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct GitConfig {
    #[serde(default)]
    pub protected_branches: Vec<String>,
    #[serde(default)]
    pub force_push_flags: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct FilesConfig {
    /// Glob patterns matched against the resolved file name.
    #[serde(default)]
    pub sensitive: Vec<String>,
    /// File names that match `sensitive` but are safe templates.
    #[serde(default)]
    pub sensitive_exceptions: Vec<String>,
    /// Directory names under a trusted root that are never auto-approved.
    #[serde(default)]
    pub excluded_dirs: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LearnedConfig {
    /// Relative paths resolve against the project root; `~` is expanded.
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_max_pattern_len")]
    pub max_pattern_len: usize,
    #[serde(default = "default_max_patterns")]
    pub max_patterns: usize,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

impl Default for LearnedConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            max_pattern_len: default_max_pattern_len(),
            max_patterns: default_max_patterns(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

fn default_max_pattern_len() -> usize {
    200
}

fn default_max_patterns() -> usize {
    500
}

fn default_max_file_bytes() -> u64 {
    256 * 1024
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    safe_bash: SafeBashOverlay,
    #[serde(default)]
    git: GitOverlay,
    #[serde(default)]
    files: FilesOverlay,
    #[serde(default)]
    learned: LearnedOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    log_level: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct SafeBashOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    rules: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    remove_rules: Vec<String>,
    #[serde(default)]
    deny_flags: Vec<String>,
    #[serde(default)]
    remove_deny_flags: Vec<String>,
    #[serde(default)]
    group_deny_flags: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct GitOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    protected_branches: Vec<String>,
    #[serde(default)]
    force_push_flags: Vec<String>,
    #[serde(default)]
    remove_protected_branches: Vec<String>,
    #[serde(default)]
    remove_force_push_flags: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct FilesOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    sensitive: Vec<String>,
    #[serde(default)]
    sensitive_exceptions: Vec<String>,
    #[serde(default)]
    excluded_dirs: Vec<String>,
    #[serde(default)]
    remove_sensitive: Vec<String>,
    #[serde(default)]
    remove_sensitive_exceptions: Vec<String>,
    #[serde(default)]
    remove_excluded_dirs: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct LearnedOverlay {
    path: Option<String>,
    max_pattern_len: Option<usize>,
    max_patterns: Option<usize>,
    max_file_bytes: Option<u64>,
}

// ── Merge logic ──

/// Merge a user list into a default list.
/// In replace mode: user list replaces default entirely.
/// In merge mode: remove items first, then extend with additions (deduped).
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|item| !remove.contains(item));
        for item in add {
            if !base.contains(&item) {
                base.push(item);
            }
        }
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge user overlay from ~/.config/cc-toolguard/config.toml (if exists)
    ///
    /// User config merges with defaults: lists extend, scalars override.
    /// Set `replace = true` in any section to replace its defaults entirely.
    /// Use `remove_<field>` lists to subtract specific items from defaults.
    pub fn load() -> Self {
        let mut config = Self::default_config();
        if let Some(overlay) = Self::load_overlay() {
            config.apply_overlay(overlay);
        }
        config
    }

    /// Try to load user overlay from ~/.config/cc-toolguard/config.toml.
    fn load_overlay() -> Option<ConfigOverlay> {
        let home = std::env::var_os("HOME")?;
        let path = std::path::Path::new(&home).join(".config/cc-toolguard/config.toml");
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                log::warn!("config parse error, using defaults: {e}");
                None
            }
        }
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        if let Some(v) = overlay.settings.log_level {
            self.settings.log_level = v;
        }

        // Safe bash: rule groups merge per name
        let s = overlay.safe_bash;
        if s.replace {
            self.safe_bash.rules = s.rules;
        } else {
            self.safe_bash
                .rules
                .retain(|name, _| !s.remove_rules.contains(name));
            for (name, prefixes) in s.rules {
                let entry = self.safe_bash.rules.entry(name).or_default();
                merge_list(entry, prefixes, &[], false);
            }
        }
        merge_list(
            &mut self.safe_bash.deny_flags,
            s.deny_flags,
            &s.remove_deny_flags,
            s.replace,
        );
        if s.replace {
            self.safe_bash.group_deny_flags = s.group_deny_flags;
        } else {
            for (name, flags) in s.group_deny_flags {
                let entry = self.safe_bash.group_deny_flags.entry(name).or_default();
                merge_list(entry, flags, &[], false);
            }
        }

        // Git
        let g = overlay.git;
        merge_list(
            &mut self.git.protected_branches,
            g.protected_branches,
            &g.remove_protected_branches,
            g.replace,
        );
        merge_list(
            &mut self.git.force_push_flags,
            g.force_push_flags,
            &g.remove_force_push_flags,
            g.replace,
        );

        // Files
        let f = overlay.files;
        merge_list(
            &mut self.files.sensitive,
            f.sensitive,
            &f.remove_sensitive,
            f.replace,
        );
        merge_list(
            &mut self.files.sensitive_exceptions,
            f.sensitive_exceptions,
            &f.remove_sensitive_exceptions,
            f.replace,
        );
        merge_list(
            &mut self.files.excluded_dirs,
            f.excluded_dirs,
            &f.remove_excluded_dirs,
            f.replace,
        );

        // Learned patterns: scalar overrides
        let l = overlay.learned;
        if let Some(v) = l.path {
            self.learned.path = v;
        }
        if let Some(v) = l.max_pattern_len {
            self.learned.max_pattern_len = v;
        }
        if let Some(v) = l.max_patterns {
            self.learned.max_patterns = v;
        }
        if let Some(v) = l.max_file_bytes {
            self.learned.max_file_bytes = v;
        }
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let config = Config::default_config();
        assert!(!config.safe_bash.rules.is_empty());
        assert!(!config.safe_bash.deny_flags.is_empty());
        assert!(!config.git.protected_branches.is_empty());
        assert!(!config.files.sensitive.is_empty());
        assert!(!config.files.excluded_dirs.is_empty());
        assert!(!config.learned.path.is_empty());
    }

    #[test]
    fn default_config_has_expected_entries() {
        let config = Config::default_config();
        assert!(config.safe_bash.rules["git-read-only"].contains(&"git status".to_string()));
        assert!(config.git.protected_branches.contains(&"main".to_string()));
        assert!(config.git.force_push_flags.contains(&"--force".to_string()));
        assert!(config.files.sensitive.contains(&".env".to_string()));
        assert!(config.files.excluded_dirs.contains(&"node_modules".to_string()));
    }

    #[test]
    fn default_log_level_is_info() {
        assert_eq!(Config::default_config().settings.log_level, "info");
    }

    // ── Merge semantics ──

    #[test]
    fn overlay_adds_rule_group() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [safe_bash.rules]
            my-tools = ["just --list"]
        "#,
        );
        assert_eq!(config.safe_bash.rules["my-tools"], vec!["just --list"]);
        assert!(config.safe_bash.rules.contains_key("git-read-only"));
    }

    #[test]
    fn overlay_extends_existing_group_without_duplicates() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [safe_bash.rules]
            git-read-only = ["git status", "git worktree list"]
        "#,
        );
        let group = &config.safe_bash.rules["git-read-only"];
        assert!(group.contains(&"git worktree list".to_string()));
        assert_eq!(group.iter().filter(|p| *p == "git status").count(), 1);
    }

    #[test]
    fn overlay_removes_rule_group() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [safe_bash]
            remove_rules = ["container-read-only"]
        "#,
        );
        assert!(!config.safe_bash.rules.contains_key("container-read-only"));
        assert!(config.safe_bash.rules.contains_key("shell-read-only"));
    }

    #[test]
    fn overlay_replace_safe_bash() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [safe_bash]
            replace = true
            deny_flags = ["--output"]
            [safe_bash.rules]
            only = ["ls"]
        "#,
        );
        assert_eq!(config.safe_bash.rules.len(), 1);
        assert_eq!(config.safe_bash.deny_flags, vec!["--output"]);
    }

    #[test]
    fn overlay_extends_group_deny_flags() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [safe_bash.group_deny_flags]
            git-read-only = ["--no-verify"]
            my-tools = ["--apply"]
        "#,
        );
        let git = &config.safe_bash.group_deny_flags["git-read-only"];
        assert!(git.contains(&"--no-verify".to_string()));
        assert!(git.contains(&"-D".to_string()));
        assert_eq!(config.safe_bash.group_deny_flags["my-tools"], vec!["--apply"]);
    }

    #[test]
    fn overlay_protected_branches() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [git]
            protected_branches = ["release"]
            remove_protected_branches = ["master"]
        "#,
        );
        assert!(config.git.protected_branches.contains(&"main".to_string()));
        assert!(config.git.protected_branches.contains(&"release".to_string()));
        assert!(!config.git.protected_branches.contains(&"master".to_string()));
    }

    #[test]
    fn overlay_files_sections() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [files]
            excluded_dirs = ["generated"]
            remove_excluded_dirs = ["out"]
            sensitive = ["*.kdbx"]
        "#,
        );
        assert!(config.files.excluded_dirs.contains(&"generated".to_string()));
        assert!(!config.files.excluded_dirs.contains(&"out".to_string()));
        assert!(config.files.sensitive.contains(&"*.kdbx".to_string()));
        assert!(config.files.sensitive.contains(&".env".to_string()));
    }

    #[test]
    fn overlay_learned_scalars() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [learned]
            path = "~/approved.json"
            max_pattern_len = 64
        "#,
        );
        assert_eq!(config.learned.path, "~/approved.json");
        assert_eq!(config.learned.max_pattern_len, 64);
        assert_eq!(config.learned.max_patterns, 500);
    }

    #[test]
    fn overlay_log_level() {
        let mut config = Config::default_config();
        config.apply_overlay_str(
            r#"
            [settings]
            log_level = "debug"
        "#,
        );
        assert_eq!(config.settings.log_level, "debug");
    }

    #[test]
    fn empty_overlay_changes_nothing() {
        let original = Config::default_config();
        let mut config = Config::default_config();
        config.apply_overlay_str("");
        assert_eq!(config.safe_bash.rules, original.safe_bash.rules);
        assert_eq!(config.files.sensitive, original.files.sensitive);
        assert_eq!(config.git.protected_branches, original.git.protected_branches);
    }
}
