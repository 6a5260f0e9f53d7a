//! cc-toolguard: PreToolUse hook for Claude Code.
//!
//! Reads the hook JSON from stdin and writes `{"continue": true}` to stdout,
//! adding a permission decision when the gate blocks or auto-approves the
//! request. Deferred requests carry no decision, so the host asks the user.
//!
//! Also usable by hand:
//!   cc-toolguard --dump-config      print the merged configuration
//!   cc-toolguard --check <command>  classify a Bash command in the current directory

use std::io::Read;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Value, json};

use cc_toolguard::config::Config;
use cc_toolguard::eval::{Decision, Evaluation, Gate, Tool, ToolInvocationRequest};
use cc_toolguard::logging;

#[derive(Debug, Deserialize)]
struct HookInput {
    tool_name: Option<String>,
    tool_input: Option<ToolInput>,
    session_id: Option<String>,
    /// Project root as reported by the host.
    project_dir: Option<String>,
    /// The shell's working directory, which may sit below the project root.
    cwd: Option<String>,
    #[serde(default)]
    additional_directories: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ToolInput {
    command: Option<String>,
    file_path: Option<String>,
    notebook_path: Option<String>,
}

fn non_empty(dir: Option<String>) -> Option<PathBuf> {
    dir.filter(|d| !d.trim().is_empty()).map(PathBuf::from)
}

fn env_project_dir() -> Option<PathBuf> {
    std::env::var_os("CLAUDE_PROJECT_DIR")
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
}

fn process_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// `CLAUDE_PROJECT_DIR`, then the working directory.
fn fallback_root() -> PathBuf {
    env_project_dir().unwrap_or_else(process_dir)
}

impl HookInput {
    fn into_request(self) -> ToolInvocationRequest {
        let tool = Tool::from_name(self.tool_name.as_deref().unwrap_or_default());
        let subject = self
            .tool_input
            .and_then(|t| {
                if tool == Tool::Bash {
                    t.command
                } else {
                    t.file_path.or(t.notebook_path)
                }
            })
            .unwrap_or_default();
        // project_dir, CLAUDE_PROJECT_DIR, cwd, then the process directory
        let project_root = non_empty(self.project_dir)
            .or_else(env_project_dir)
            .or_else(|| non_empty(self.cwd))
            .unwrap_or_else(process_dir);
        ToolInvocationRequest {
            tool,
            subject,
            session_id: self.session_id.unwrap_or_default(),
            project_root,
            additional_roots: self
                .additional_directories
                .into_iter()
                .map(PathBuf::from)
                .collect(),
        }
    }
}

fn hook_output(decision: &Decision) -> Value {
    let mut output = json!({ "continue": true });
    if let Some(reason) = decision.reason() {
        output["hookSpecificOutput"] = json!({
            "hookEventName": "PreToolUse",
            "permissionDecision": decision.as_str(),
            "permissionDecisionReason": reason,
        });
    }
    output
}

fn run_hook(config: &Config) -> Value {
    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        log::error!("failed to read stdin: {e}");
        return hook_output(&Decision::Deferred);
    }
    let hook_input: HookInput = match serde_json::from_str(&input) {
        Ok(v) => v,
        Err(e) => {
            log::error!("hook input is not valid JSON: {e}");
            return hook_output(&Decision::Deferred);
        }
    };
    let request = hook_input.into_request();
    let gate = Gate::from_config(config, &request.project_root);
    hook_output(&gate.evaluate(&request).decision)
}

fn describe(evaluation: &Evaluation) -> String {
    let mut line = evaluation.decision.label().to_string();
    if let Some(category) = evaluation.decision.category() {
        line.push_str(&format!(" [{category}]"));
    }
    if let Some(reason) = evaluation.decision.reason().or_else(|| evaluation.note.clone()) {
        line.push_str(&format!(": {reason}"));
    }
    line
}

fn main() {
    logging::init(logging::resolve_level("info"));
    let config = Config::load();
    logging::set_level(logging::resolve_level(&config.settings.log_level));

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => println!("{}", run_hook(&config)),
        Some("--dump-config") => match toml::to_string_pretty(&config) {
            Ok(text) => print!("{text}"),
            Err(e) => {
                eprintln!("cannot serialize config: {e}");
                std::process::exit(1);
            }
        },
        Some("--check") => {
            let command = args[1..].join(" ");
            let root = fallback_root();
            let gate = Gate::from_config(&config, &root);
            let evaluation = gate.evaluate(&ToolInvocationRequest::bash(command, root));
            println!("{}", describe(&evaluation));
        }
        Some(other) => {
            eprintln!("unknown argument: {other}");
            eprintln!("usage: cc-toolguard [--dump-config | --check <command>]");
            std::process::exit(2);
        }
    }
}
