//! Case-sensitive glob patterns for the `like` operator
//!
//! Syntax (shell style, no path semantics):
//! - `*` matches any run of characters, including none
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]`, `[!abc]` / `[^abc]` match one character of a class
//! - `\x` matches `x` literally
//!
//! Patterns are translated once into an anchored regex.

use regex::Regex;

/// A compiled `like` pattern
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    /// Compiles a glob pattern
    pub fn new(pattern: &str) -> Result<Self, String> {
        let translated = translate(pattern);
        let regex = Regex::new(&translated).map_err(|e| e.to_string())?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Returns the original pattern text
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whole-string match
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

fn translate(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2 + 8);
    out.push_str("(?s)^");

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' if i + 1 < chars.len() => {
                i += 1;
                out.push_str(&regex::escape(&chars[i].to_string()));
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    push_class(&mut out, &chars[i + 1..end]);
                    i = end;
                }
                None => out.push_str("\\["),
            },
            c => out.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }

    out.push('$');
    out
}

/// Index of the `]` closing the class opened at `start`, if any.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    if i < chars.len() && (chars[i] == '!' || chars[i] == '^') {
        i += 1;
    }
    // A leading ']' is a literal member
    if i < chars.len() && chars[i] == ']' {
        i += 1;
    }
    while i < chars.len() {
        if chars[i] == ']' {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn push_class(out: &mut String, body: &[char]) {
    out.push('[');
    let mut rest = body;
    if let Some(first) = rest.first() {
        if *first == '!' || *first == '^' {
            out.push('^');
            rest = &rest[1..];
        }
    }
    for (pos, c) in rest.iter().enumerate() {
        let edge = pos == 0 || pos + 1 == rest.len();
        match c {
            '\\' | '[' | ']' | '&' | '~' | '^' => {
                out.push('\\');
                out.push(*c);
            }
            '-' if edge => out.push_str("\\-"),
            c => out.push(*c),
        }
    }
    out.push(']');
}
