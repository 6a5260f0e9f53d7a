use super::types::{NormalizedCommand, Operator, ParsedPipeline, Redirection, ShellSegment};

/// Quote and escape state while scanning a command left to right.
#[derive(Debug, Default)]
struct Quotes {
    single: bool,
    double: bool,
    escaped: bool,
}

impl Quotes {
    /// Feed one character. Returns `true` if it was a quote, a backslash,
    /// or escaped, in which case it can never start an operator.
    fn consume(&mut self, c: char) -> bool {
        if self.escaped {
            self.escaped = false;
            return true;
        }
        match c {
            '\\' if !self.single => self.escaped = true,
            '\'' if !self.double => self.single = !self.single,
            '"' if !self.single => self.double = !self.double,
            _ => return false,
        }
        true
    }

    fn quoted(&self) -> bool {
        self.single || self.double
    }
}

/// The control operator starting at `i`, with its width in chars.
fn operator_at(chars: &[char], i: usize) -> Option<(Operator, usize)> {
    let op = match (chars[i], chars.get(i + 1).copied()) {
        ('&', Some('&')) => (Operator::And, 2),
        ('|', Some('|')) => (Operator::Or, 2),
        ('|', Some('&')) => (Operator::PipeErr, 2),
        ('|', _) => (Operator::Pipe, 1),
        (';', _) => (Operator::Semi, 1),
        ('&', _) if is_background_amp(chars, i) => (Operator::Background, 1),
        _ => return None,
    };
    Some(op)
}

/// Split a command at shell operators (&&, ||, ;, |, |&, &) outside quotes.
/// Empty segments are dropped; operators are kept in order.
fn split_compound_command(command: &str) -> (Vec<String>, Vec<Operator>) {
    let chars: Vec<char> = command.chars().collect();
    let mut parts = Vec::new();
    let mut operators = Vec::new();
    let mut buf = String::new();
    let mut quotes = Quotes::default();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if !quotes.consume(c) && !quotes.quoted() {
            if let Some((op, width)) = operator_at(&chars, i) {
                parts.push(buf.trim().to_string());
                operators.push(op);
                buf.clear();
                i += width;
                continue;
            }
        }
        buf.push(c);
        i += 1;
    }
    parts.push(buf.trim().to_string());
    parts.retain(|p| !p.is_empty());

    (parts, operators)
}

/// A lone `&` that is not part of a redirection (`&>`, `>&`, `2>&1`).
fn is_background_amp(chars: &[char], i: usize) -> bool {
    let prev = i.checked_sub(1).map(|p| chars[p]);
    let next = chars.get(i + 1).copied();
    !matches!(prev, Some('>') | Some('<')) && next != Some('>')
}

/// Consume a balanced `(...)` body starting just after the opening paren.
/// Returns the inner text and the index just past the closing paren.
fn take_balanced(chars: &[char], mut i: usize) -> (String, usize) {
    let mut depth: u32 = 1;
    let mut inner = String::new();
    let mut quotes = Quotes::default();
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        if !quotes.consume(c) && !quotes.quoted() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
        inner.push(c);
    }
    (inner, i)
}

/// Body of a backtick substitution starting just after the opening backtick.
/// Backticks do not nest; an unterminated one runs to the end.
fn take_backtick(chars: &[char], mut i: usize) -> (String, usize) {
    let mut inner = String::new();
    while let Some(&c) = chars.get(i) {
        i += 1;
        match c {
            '`' => break,
            '\\' => {
                inner.push(c);
                if let Some(&next) = chars.get(i) {
                    inner.push(next);
                    i += 1;
                }
            }
            _ => inner.push(c),
        }
    }
    (inner, i)
}

/// Pull out `$(...)`, backtick and `<(...)`/`>(...)` bodies.
///
/// Returns the outer command with each substitution replaced by a
/// `__SUBST__` placeholder, plus the trimmed inner commands. Nested
/// substitutions stay inside their parent: `$(cat $(which foo))` yields
/// `cat $(which foo)`. Single quotes suppress substitution; double quotes
/// only suppress process substitution.
fn extract_substitutions(command: &str) -> (String, Vec<String>) {
    let chars: Vec<char> = command.chars().collect();
    let mut outer = String::new();
    let mut inners = Vec::new();
    let mut quotes = Quotes::default();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if quotes.consume(c) || quotes.single {
            outer.push(c);
            i += 1;
            continue;
        }

        let opens_paren = chars.get(i + 1) == Some(&'(');
        let arithmetic = c == '$' && chars.get(i + 2) == Some(&'(');
        let process = matches!(c, '<' | '>') && !quotes.double;
        let body = if opens_paren && !arithmetic && (c == '$' || process) {
            Some(take_balanced(&chars, i + 2))
        } else if c == '`' {
            Some(take_backtick(&chars, i + 1))
        } else {
            None
        };

        match body {
            Some((inner, next)) => {
                let trimmed = inner.trim();
                if !trimmed.is_empty() {
                    inners.push(trimmed.to_string());
                }
                // The `<`/`>` prefix is dropped so it is not read as a redirection
                outer.push_str("__SUBST__");
                i = next;
            }
            None => {
                outer.push(c);
                i += 1;
            }
        }
    }

    (outer, inners)
}

/// `>&N`, `>&-` style duplication starting at the `&`.
fn is_fd_dup(chars: &[char], amp: usize) -> bool {
    chars.get(amp) == Some(&'&')
        && chars
            .get(amp + 1)
            .is_some_and(|n| n.is_ascii_digit() || *n == '-')
}

/// First output redirection to a file (`>`, `>>`, `&>`, `N>`) outside quotes.
///
/// Input redirection, here-docs, fd duplication (`2>&1`, `>&-`), process
/// substitution and writes to `/dev/null` are not reported.
pub fn has_output_redirection(command: &str) -> Option<Redirection> {
    let chars: Vec<char> = command.chars().collect();
    let mut quotes = Quotes::default();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if quotes.consume(c) || quotes.quoted() {
            i += 1;
            continue;
        }
        let next = chars.get(i + 1).copied();

        // operator text and the index of its `>`
        let found = match (c, next) {
            ('&', Some('>')) => Some(("&>".to_string(), i + 1)),
            (d, Some('>')) if d.is_ascii_digit() => Some((format!("{d}>"), i + 1)),
            ('>', Some('(')) => None,
            ('>', _) => Some((">".to_string(), i)),
            _ => None,
        };
        let Some((op, gt)) = found else {
            i += 1;
            continue;
        };
        if is_fd_dup(&chars, gt + 1) {
            i = gt + 3;
            continue;
        }
        if targets_dev_null(&chars, gt + 1) {
            i = gt + 1;
            continue;
        }
        return Some(Redirection {
            description: format!("output redirection ({op})"),
        });
    }

    None
}

/// Whether the redirection target starting at `from` (after optional `>`
/// and spaces) is exactly `/dev/null`.
fn targets_dev_null(chars: &[char], mut from: usize) -> bool {
    if chars.get(from) == Some(&'>') {
        from += 1;
    }
    while chars.get(from) == Some(&' ') {
        from += 1;
    }
    let target: String = chars[from.min(chars.len())..]
        .iter()
        .take_while(|c| !c.is_whitespace() && !matches!(c, ';' | '&' | '|'))
        .collect();
    target == "/dev/null"
}

/// Parse a normalized command into segments, operators and substitutions.
///
/// This is the main entry point for the evaluation layer.
pub fn parse(command: &NormalizedCommand) -> ParsedPipeline {
    let text = command.as_str();
    let (outer, substitutions) = extract_substitutions(text);
    let (parts, operators) = split_compound_command(&outer);

    if parts.len() <= 1 && substitutions.is_empty() {
        return ParsedPipeline {
            segments: vec![ShellSegment {
                command: text.to_string(),
                redirection: has_output_redirection(text),
            }],
            operators,
            substitutions,
        };
    }

    let segments = parts
        .into_iter()
        .map(|part| {
            let redirection = has_output_redirection(&part);
            ShellSegment {
                command: part,
                redirection,
            }
        })
        .collect();

    ParsedPipeline {
        segments,
        operators,
        substitutions,
    }
}

/// Whether a normalized command performs more than one shell-level operation.
pub fn is_compound(command: &NormalizedCommand) -> bool {
    parse(command).is_compound()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::normalize;

    #[test]
    fn split_simple() {
        let (parts, ops) = split_compound_command("ls -la");
        assert_eq!(parts, vec!["ls -la"]);
        assert!(ops.is_empty());
    }

    #[test]
    fn split_and() {
        let (parts, ops) = split_compound_command("ls && pwd");
        assert_eq!(parts, vec!["ls", "pwd"]);
        assert_eq!(ops, vec![Operator::And]);
    }

    #[test]
    fn split_pipe() {
        let (parts, ops) = split_compound_command("cat file | grep pat");
        assert_eq!(parts, vec!["cat file", "grep pat"]);
        assert_eq!(ops, vec![Operator::Pipe]);
    }

    #[test]
    fn split_background() {
        let (parts, ops) = split_compound_command("sleep 5 & rm x");
        assert_eq!(parts, vec!["sleep 5", "rm x"]);
        assert_eq!(ops, vec![Operator::Background]);
    }

    #[test]
    fn split_ignores_fd_dup() {
        let (parts, ops) = split_compound_command("cargo test 2>&1");
        assert_eq!(parts, vec!["cargo test 2>&1"]);
        assert!(ops.is_empty());
    }

    #[test]
    fn split_quoted_operator() {
        let (parts, ops) = split_compound_command("echo 'a && b'");
        assert_eq!(parts, vec!["echo 'a && b'"]);
        assert!(ops.is_empty());
    }

    #[test]
    fn split_escaped_semicolon() {
        let (parts, ops) = split_compound_command("find . -exec ls {} \\;");
        assert_eq!(parts.len(), 1);
        assert!(ops.is_empty());
    }

    #[test]
    fn extract_dollar_paren() {
        let (outer, inners) = extract_substitutions("ls $(which cargo)");
        assert_eq!(outer, "ls __SUBST__");
        assert_eq!(inners, vec!["which cargo"]);
    }

    #[test]
    fn extract_backtick() {
        let (outer, inners) = extract_substitutions("echo `whoami`");
        assert_eq!(outer, "echo __SUBST__");
        assert_eq!(inners, vec!["whoami"]);
    }

    #[test]
    fn extract_single_quoted_suppressed() {
        let (_, inners) = extract_substitutions("echo '$(rm -rf /)'");
        assert!(inners.is_empty());
    }

    #[test]
    fn extract_double_quoted_expanded() {
        let (_, inners) = extract_substitutions("echo \"$(rm -rf /)\"");
        assert_eq!(inners, vec!["rm -rf /"]);
    }

    #[test]
    fn extract_process_substitution() {
        let (outer, inners) = extract_substitutions("diff <(sort a) <(sort b)");
        assert!(!outer.contains('<'));
        assert_eq!(inners, vec!["sort a", "sort b"]);
    }

    #[test]
    fn arithmetic_is_not_substitution() {
        let (_, inners) = extract_substitutions("echo $((1 + 2))");
        assert!(inners.is_empty());
    }

    #[test]
    fn compound_detection() {
        assert!(is_compound(&normalize("git status && rm -rf /")));
        assert!(is_compound(&normalize("ls || pwd")));
        assert!(is_compound(&normalize("ls; pwd")));
        assert!(is_compound(&normalize("cat x | sh")));
        assert!(is_compound(&normalize("echo $(whoami)")));
        assert!(is_compound(&normalize("git status\nls")));
        assert!(!is_compound(&normalize("git status")));
        assert!(!is_compound(&normalize("echo 'a | b'")));
        assert!(!is_compound(&normalize("")));
    }

    #[test]
    fn redir_simple_gt() {
        assert!(has_output_redirection("ls > file").is_some());
    }

    #[test]
    fn redir_append() {
        assert!(has_output_redirection("ls >> file").is_some());
    }

    #[test]
    fn redir_ampersand_gt() {
        assert!(has_output_redirection("cmd &> file").is_some());
    }

    #[test]
    fn no_redir_fd_dup() {
        assert!(has_output_redirection("cmd 2>&1").is_none());
    }

    #[test]
    fn no_redir_dev_null() {
        assert!(has_output_redirection("cmd 2>/dev/null").is_none());
        assert!(has_output_redirection("cmd > /dev/null").is_none());
    }

    #[test]
    fn no_redir_process_subst() {
        assert!(has_output_redirection("diff >(sort)").is_none());
    }

    #[test]
    fn no_redir_quoted() {
        assert!(has_output_redirection("echo 'hello > world'").is_none());
    }
}
