//! Canonical command form used by every downstream matcher.
//!
//! A single pass:
//!   - expands hex (`\xHH`), octal (`\0NNN`, `\NNN`) and ANSI-C (`$'...'`) escapes
//!   - unwraps quoted segments whose content holds no shell metacharacters
//!   - drops redundant backslashes (`\r\m` → `rm`)
//!   - collapses runs of spaces/tabs, turns unquoted newlines into `;`
//!
//! An escape that would decode to a metacharacter, quote, backslash or control
//! character stays encoded, so decoding never invents an operator. The pass is
//! repeated until the output stops changing.

use super::types::NormalizedCommand;

/// Characters that change how the shell splits or executes a command.
const SHELL_META: &[char] = &[
    ';', '&', '|', '<', '>', '(', ')', '$', '`', '\\', '\'', '"', '#',
];

/// Characters whose backslash escape carries no meaning outside quotes.
const ORDINARY_PUNCT: &[char] = &['-', '_', '.', '/', ',', ':', '=', '+', '@', '%'];

// Every changing pass strictly shrinks the input or removes an unquoted
// newline/tab, so the fixed point is reached long before this bound.
const MAX_PASSES: usize = 64;

/// Normalize a raw command string. Total: never fails, never panics.
pub fn normalize(raw: &str) -> NormalizedCommand {
    let mut current = raw.trim().to_string();
    for _ in 0..MAX_PASSES {
        let next = normalize_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    NormalizedCommand(current)
}

fn normalize_pass(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let len = chars.len();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < len {
        let c = chars[i];
        match c {
            '\'' => match find_single_close(&chars, i + 1) {
                Some(end) => {
                    let content: String = chars[i + 1..end].iter().collect();
                    push_quoted(&mut out, '\'', &decode_all(&content));
                    i = end + 1;
                }
                None => {
                    out.extend(&chars[i..]);
                    break;
                }
            },
            '"' => match find_escaped_close(&chars, i + 1, '"') {
                Some(end) => {
                    let content: String = chars[i + 1..end].iter().collect();
                    push_quoted(&mut out, '"', &decode_all(&content));
                    i = end + 1;
                }
                None => {
                    out.extend(&chars[i..]);
                    break;
                }
            },
            '$' if chars.get(i + 1) == Some(&'\'') => {
                match find_escaped_close(&chars, i + 2, '\'') {
                    Some(end) => {
                        let content: String = chars[i + 2..end].iter().collect();
                        match decode_ansi_c(&content) {
                            Some(decoded) if is_plain(&decoded) => out.push_str(&decoded),
                            _ => out.extend(&chars[i..=end]),
                        }
                        i = end + 1;
                    }
                    None => {
                        out.extend(&chars[i..]);
                        break;
                    }
                }
            }
            // $"..." is a locale-translated double-quoted string
            '$' if chars.get(i + 1) == Some(&'"') => {
                i += 1;
            }
            '\\' => {
                let Some(&next) = chars.get(i + 1) else {
                    out.push('\\');
                    break;
                };
                if next == '\n' {
                    i += 2;
                    continue;
                }
                if let Some((decoded, consumed)) = decode_escape(&chars, i) {
                    if is_safe_decoded(decoded) {
                        out.push(decoded);
                    } else {
                        out.extend(&chars[i..i + consumed]);
                    }
                    i += consumed;
                    continue;
                }
                if next.is_ascii_alphanumeric() || ORDINARY_PUNCT.contains(&next) {
                    out.push(next);
                } else {
                    out.push('\\');
                    out.push(next);
                }
                i += 2;
            }
            ' ' | '\t' => {
                if !out.is_empty() && !out.ends_with(' ') {
                    out.push(' ');
                }
                i += 1;
            }
            '\n' | '\r' => {
                let trimmed = out.trim_end().len();
                out.truncate(trimmed);
                // A newline after an operator or opening bracket continues the command.
                let continues = out.is_empty()
                    || out.ends_with(|ch: char| matches!(ch, ';' | '&' | '|' | '(' | '{'));
                if continues {
                    if !out.is_empty() {
                        out.push(' ');
                    }
                } else {
                    out.push_str("; ");
                }
                i += 1;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    out.trim().to_string()
}

/// Emit a quoted segment, unwrapping it when the content is plain.
fn push_quoted(out: &mut String, quote: char, content: &str) {
    if is_plain(content) {
        out.push_str(content);
    } else {
        out.push(quote);
        out.push_str(content);
        out.push(quote);
    }
}

/// Non-empty, no whitespace, no control characters, no shell metacharacters.
fn is_plain(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| !c.is_whitespace() && !c.is_control() && !SHELL_META.contains(&c))
}

fn is_safe_decoded(c: char) -> bool {
    c == ' ' || (c.is_ascii_graphic() && !SHELL_META.contains(&c))
}

fn find_single_close(chars: &[char], from: usize) -> Option<usize> {
    (from..chars.len()).find(|&j| chars[j] == '\'')
}

/// Find the closing quote, skipping backslash-escaped pairs.
fn find_escaped_close(chars: &[char], from: usize, quote: char) -> Option<usize> {
    let mut j = from;
    while j < chars.len() {
        match chars[j] {
            '\\' => j += 2,
            c if c == quote => return Some(j),
            _ => j += 1,
        }
    }
    None
}

/// Decode a numeric escape starting at `chars[at] == '\\'`.
/// Returns the decoded character and the number of chars consumed.
fn decode_escape(chars: &[char], at: usize) -> Option<(char, usize)> {
    let kind = *chars.get(at + 1)?;
    let (radix, start, max_digits) = match kind {
        'x' => (16, at + 2, 2),
        // echo -e style: \0 followed by up to three octal digits
        '0' => (8, at + 2, 3),
        '1'..='7' => (8, at + 1, 3),
        _ => return None,
    };
    let digits: String = chars[start.min(chars.len())..]
        .iter()
        .take(max_digits)
        .take_while(|c| c.is_digit(radix))
        .collect();
    if digits.is_empty() && kind != '0' {
        return None;
    }
    let value = if digits.is_empty() {
        0
    } else {
        u32::from_str_radix(&digits, radix).ok()?
    };
    if value > 0x7f {
        return None;
    }
    let decoded = char::from_u32(value)?;
    Some((decoded, start - at + digits.len()))
}

/// Decode numeric escapes inside quoted content, leaving unsafe ones encoded.
fn decode_all(content: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    let mut out = String::with_capacity(content.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' {
            if chars.get(i + 1) == Some(&'\\') {
                out.push_str("\\\\");
                i += 2;
                continue;
            }
            if let Some((decoded, consumed)) = decode_escape(&chars, i)
                && is_safe_decoded(decoded)
            {
                out.push(decoded);
                i += consumed;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

/// Decode the body of an ANSI-C `$'...'` string. Returns `None` when the body
/// uses an escape we do not expand or decodes to an unsafe character.
fn decode_ansi_c(content: &str) -> Option<String> {
    let chars: Vec<char> = content.chars().collect();
    let mut out = String::with_capacity(content.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' {
            let (decoded, consumed) = decode_escape(&chars, i)?;
            if !is_safe_decoded(decoded) {
                return None;
            }
            out.push(decoded);
            i += consumed;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    Some(out)
}
