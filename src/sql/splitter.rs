//! Script splitting and comment stripping.
//!
//! Both walk the text once with a small state machine so that `;`, quotes
//! and comment markers only count outside of string literals and comments.

#[derive(Clone, Copy, PartialEq)]
enum ScanState {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Split a script into trimmed, non-empty statement texts.
///
/// `;` inside a single- or double-quoted string or inside a comment does not
/// terminate a statement. A backslash escapes the next character inside a
/// string. The last statement may omit its terminator.
pub fn split_statements(script: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut state = ScanState::Code;
    let mut start = 0;
    let mut chars = script.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match state {
            ScanState::Code => match ch {
                '\'' | '"' => state = ScanState::Quoted(ch),
                '-' if matches!(chars.peek(), Some((_, '-'))) => {
                    chars.next();
                    state = ScanState::LineComment;
                }
                '/' if matches!(chars.peek(), Some((_, '*'))) => {
                    chars.next();
                    state = ScanState::BlockComment;
                }
                ';' => {
                    push_trimmed(&mut statements, &script[start..idx]);
                    start = idx + 1;
                }
                _ => {}
            },
            ScanState::Quoted(quote) => {
                if ch == '\\' {
                    chars.next();
                } else if ch == quote {
                    state = ScanState::Code;
                }
            }
            ScanState::LineComment => {
                if ch == '\n' {
                    state = ScanState::Code;
                }
            }
            ScanState::BlockComment => {
                if ch == '*' && matches!(chars.peek(), Some((_, '/'))) {
                    chars.next();
                    state = ScanState::Code;
                }
            }
        }
    }

    push_trimmed(&mut statements, &script[start..]);
    statements
}

fn push_trimmed<'a>(statements: &mut Vec<&'a str>, text: &'a str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed);
    }
}

/// Remove `--` line comments and `/* */` block comments outside of strings,
/// then trim. A comment is replaced by a single space so tokens on either
/// side stay apart.
pub fn strip_comments(statement: &str) -> String {
    let mut out = String::with_capacity(statement.len());
    let mut state = ScanState::Code;
    let mut chars = statement.chars().peekable();

    while let Some(ch) = chars.next() {
        match state {
            ScanState::Code => match ch {
                '-' if chars.peek() == Some(&'-') => {
                    chars.next();
                    state = ScanState::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = ScanState::BlockComment;
                }
                '\'' | '"' => {
                    state = ScanState::Quoted(ch);
                    out.push(ch);
                }
                _ => out.push(ch),
            },
            ScanState::Quoted(quote) => {
                out.push(ch);
                if ch == '\\' {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                } else if ch == quote {
                    state = ScanState::Code;
                }
            }
            ScanState::LineComment => {
                if ch == '\n' {
                    out.push('\n');
                    state = ScanState::Code;
                }
            }
            ScanState::BlockComment => {
                if ch == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push(' ');
                    state = ScanState::Code;
                }
            }
        }
    }

    out.trim().to_string()
}
