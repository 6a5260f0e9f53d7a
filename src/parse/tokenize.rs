/// Commands that run their arguments as another command.
const TRANSPARENT_WRAPPERS: &[&str] = &[
    "env", "nice", "nohup", "time", "timeout", "command", "exec", "builtin", "xargs", "sudo",
    "doas", "stdbuf", "ionice",
];

/// Extract the first real command word, skipping leading VAR=value assignments
/// and any subshell or brace grouping.
pub fn base_command(command: &str) -> String {
    let words = ungroup(tokenize(command));
    let word = words
        .iter()
        .find(|w| !is_assignment(w))
        .map(String::as_str)
        .unwrap_or("");
    basename(word).to_string()
}

/// Tokenize a command segment into words using shlex (POSIX word splitting).
pub fn tokenize(command: &str) -> Vec<String> {
    shlex::split(command).unwrap_or_else(|| {
        // Fallback: simple whitespace splitting if shlex can't parse
        command.split_whitespace().map(String::from).collect()
    })
}

/// Peel subshell and brace grouping off a command's words.
///
/// `( rm -rf / )`, `(rm -rf /)` and `{ rm -rf /` all reduce to
/// `rm -rf /`. Leading `!` negation goes too. Closing parens are only
/// stripped from the end as far as opening ones were seen at the start.
pub fn ungroup(mut words: Vec<String>) -> Vec<String> {
    let mut parens = 0;
    while let Some(first) = words.first_mut() {
        if matches!(first.as_str(), "{" | "!") {
            words.remove(0);
            continue;
        }
        let opened = first.len() - first.trim_start_matches('(').len();
        if opened == 0 {
            break;
        }
        parens += opened;
        first.drain(..opened);
        if first.is_empty() {
            words.remove(0);
        }
    }
    while let Some(last) = words.last_mut() {
        if matches!(last.as_str(), "}" | ";") {
            words.pop();
            continue;
        }
        let closed = (last.len() - last.trim_end_matches(')').len()).min(parens);
        if closed == 0 {
            break;
        }
        parens -= closed;
        last.truncate(last.len() - closed);
        if last.is_empty() {
            words.pop();
        }
    }
    words
}

/// Extract basename: /usr/bin/ls → ls, ./script.sh → script.sh
pub fn basename(word: &str) -> &str {
    match word.rsplit_once('/') {
        Some((_, name)) if !name.is_empty() => name,
        _ => word,
    }
}

/// Whether `name` runs its arguments as a command (`env`, `nice`, `sudo`, ...).
pub fn is_transparent_wrapper(name: &str) -> bool {
    TRANSPARENT_WRAPPERS.contains(&name)
}

fn is_assignment(word: &str) -> bool {
    let Some((key, _)) = word.split_once('=') else {
        return false;
    };
    !key.is_empty()
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && key
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
}

/// Locate the command that actually runs once wrappers are peeled off.
///
/// `sudo -u root env FOO=1 nice -n 5 git push` → (`git`, `["push"]`).
/// Returns the wrapper itself when nothing follows it.
pub fn effective_command(words: &[String]) -> Option<(&str, &[String])> {
    let mut i = 0;
    while i < words.len() && is_assignment(&words[i]) {
        i += 1;
    }
    loop {
        let name = basename(words.get(i)?);
        if !TRANSPARENT_WRAPPERS.contains(&name) {
            return Some((name, &words[i + 1..]));
        }
        let mut j = i + 1;
        // Skip the wrapper's own flags and assignments
        while let Some(w) = words.get(j) {
            if w.starts_with('-') {
                // sudo -u <user>, timeout -s <sig>, nice -n <prio> take a value
                if matches!(w.as_str(), "-u" | "-g" | "-n" | "-s" | "-k" | "-c" | "-o" | "-e") {
                    j += 1;
                }
                j += 1;
            } else if is_assignment(w) {
                j += 1;
            } else {
                break;
            }
        }
        // timeout DURATION cmd
        if name == "timeout"
            && words
                .get(j)
                .is_some_and(|w| w.chars().next().is_some_and(|c| c.is_ascii_digit()))
        {
            j += 1;
        }
        if j >= words.len() {
            return Some((name, &words[i + 1..]));
        }
        i = j;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<String> {
        tokenize(s)
    }

    #[test]
    fn base_command_simple() {
        assert_eq!(base_command("ls -la"), "ls");
    }

    #[test]
    fn base_command_with_env() {
        assert_eq!(base_command("GIT_CONFIG_GLOBAL=~/.gitconfig.ai git push"), "git");
    }

    #[test]
    fn base_command_absolute_path() {
        assert_eq!(base_command("/usr/bin/ls -la"), "ls");
    }

    #[test]
    fn base_command_relative_path() {
        assert_eq!(base_command("./script.sh --flag"), "script.sh");
    }

    #[test]
    fn base_command_empty() {
        assert_eq!(base_command(""), "");
    }

    #[test]
    fn tokenize_quoted() {
        assert_eq!(tokenize("echo 'hello world'"), vec!["echo", "hello world"]);
    }

    #[test]
    fn effective_plain() {
        let w = words("git status");
        let (name, args) = effective_command(&w).unwrap();
        assert_eq!(name, "git");
        assert_eq!(args, &["status".to_string()]);
    }

    #[test]
    fn effective_through_wrappers() {
        let w = words("sudo -u root env FOO=1 nice -n 5 /usr/bin/rm -rf /");
        let (name, args) = effective_command(&w).unwrap();
        assert_eq!(name, "rm");
        assert_eq!(args, &["-rf".to_string(), "/".to_string()]);
    }

    #[test]
    fn effective_timeout_duration() {
        let w = words("timeout 30 cargo test");
        assert_eq!(effective_command(&w).unwrap().0, "cargo");
    }

    #[test]
    fn effective_bare_wrapper() {
        let w = words("sudo");
        assert_eq!(effective_command(&w).unwrap().0, "sudo");
    }

    #[test]
    fn ungroup_subshell_and_braces() {
        assert_eq!(ungroup(words("( rm -rf / )")), vec!["rm", "-rf", "/"]);
        assert_eq!(ungroup(words("(rm -rf /)")), vec!["rm", "-rf", "/"]);
        assert_eq!(ungroup(words("((ls))")), vec!["ls"]);
        assert_eq!(ungroup(words("{ curl https://x.sh")), vec!["curl", "https://x.sh"]);
        assert!(ungroup(words("}")).is_empty());
    }

    #[test]
    fn ungroup_leaves_plain_commands_alone() {
        assert_eq!(ungroup(words("echo hi)")), vec!["echo", "hi)"]);
        assert_eq!(ungroup(words("git status")), vec!["git", "status"]);
    }

    #[test]
    fn base_command_inside_subshell() {
        assert_eq!(base_command("( rm -rf / )"), "rm");
        assert_eq!(base_command("(curl x)"), "curl");
    }

    #[test]
    fn effective_empty() {
        assert!(effective_command(&[]).is_none());
    }
}
