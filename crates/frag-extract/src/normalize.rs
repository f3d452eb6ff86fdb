//! Final text cleanup.
//!
//! Runs once over the serialized output:
//!
//! 1. placeholder tokens (`<...>` written as escaped text in the page) are
//!    whitespace-normalized, with quote and square bracket spacing fixed inside;
//! 2. runs of blank lines collapse to one blank line;
//! 3. runs of spaces and tabs collapse to one space, except leading indentation,
//!    and spaces before `.` or `,` are removed;
//! 4. the result is trimmed.
//!
//! Applying the pass to its own output changes nothing.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// A placeholder token: `<` ... `>` without nested brackets.
static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^<>]*)>").expect("invalid token regex"));

/// Literal table markup emitted for nested tables.
static TABLE_MARKUP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^/?(?:table|tr|td|th)(?: (?:rowspan|colspan)="\d+")*$"#)
        .expect("invalid table markup regex")
});

/// A blank line; placeholder tokens never span one.
static BLANK_LINE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n").expect("invalid blank line regex"));

static WHITESPACE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));

static BRACKET_OPEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\s+").expect("invalid bracket regex"));

static BRACKET_CLOSE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\]").expect("invalid bracket regex"));

/// Text normalizer.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    clean_brackets: bool,
}

impl Normalizer {
    /// Create a normalizer. With `clean_brackets` off, placeholder tokens are
    /// left as they are and only line and space rules apply.
    #[must_use]
    pub fn new(clean_brackets: bool) -> Self {
        Self { clean_brackets }
    }

    /// Normalize serialized text.
    #[must_use]
    pub fn normalize(&self, text: &str) -> String {
        let text = if self.clean_brackets {
            clean_placeholders(text).into()
        } else {
            Cow::Borrowed(text)
        };

        let mut lines: Vec<String> = Vec::new();
        for line in text.lines().map(clean_line) {
            if line.is_empty() && lines.last().is_some_and(String::is_empty) {
                continue;
            }
            lines.push(line);
        }

        lines.join("\n").trim().to_owned()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Normalize with placeholder cleanup enabled.
#[must_use]
pub fn normalize(text: &str) -> String {
    Normalizer::default().normalize(text)
}

/// Clean placeholder tokens paragraph by paragraph.
fn clean_placeholders(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for blank in BLANK_LINE_PATTERN.find_iter(text) {
        out.push_str(&clean_paragraph_placeholders(&text[last..blank.start()]));
        out.push_str(blank.as_str());
        last = blank.end();
    }
    out.push_str(&clean_paragraph_placeholders(&text[last..]));
    out
}

fn clean_paragraph_placeholders(paragraph: &str) -> Cow<'_, str> {
    TOKEN_PATTERN.replace_all(paragraph, |caps: &Captures| {
        if TABLE_MARKUP_PATTERN.is_match(&caps[1]) {
            caps[0].to_owned()
        } else {
            format!("<{}>", clean_token(&caps[1]))
        }
    })
}

/// Clean the inside of a placeholder token.
fn clean_token(content: &str) -> String {
    let collapsed = WHITESPACE_PATTERN.replace_all(content.trim(), " ");
    let quoted = pair_quotes(&collapsed);
    let opened = BRACKET_OPEN_PATTERN.replace_all(&quoted, "[");
    BRACKET_CLOSE_PATTERN.replace_all(&opened, "]").into_owned()
}

/// Fix spacing around double quotes, pairing them left to right.
///
/// An opening quote loses the spaces after it and gets a space before it when
/// glued to a word; a closing quote loses the spaces before it.
fn pair_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut inside = false;
    let mut after_opening = false;

    for ch in text.chars() {
        if ch == '"' {
            if inside {
                let kept = out.trim_end().len();
                out.truncate(kept);
            } else if out.chars().next_back().is_some_and(is_word_char) {
                out.push(' ');
            }
            out.push('"');
            inside = !inside;
            after_opening = inside;
            continue;
        }
        if after_opening && ch.is_whitespace() {
            continue;
        }
        after_opening = false;
        out.push(ch);
    }
    out
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Collapse inline spaces in one line, keeping its indentation.
fn clean_line(line: &str) -> String {
    let body = line.trim_start_matches([' ', '\t']);
    let indent = &line[..line.len() - body.len()];
    if body.trim().is_empty() {
        return String::new();
    }

    let mut out = String::with_capacity(line.len());
    out.push_str(indent);

    let mut chars = body.trim_end().chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != ' ' && ch != '\t' {
            out.push(ch);
            continue;
        }
        while chars.next_if(|next| *next == ' ' || *next == '\t').is_some() {}
        if !matches!(chars.peek(), Some('.' | ',')) {
            out.push(' ');
        }
    }
    out
}
