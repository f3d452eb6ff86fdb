//! Fragment concatenation.

use std::sync::LazyLock;

use regex::Regex;

use super::table::TABLE_LABEL;

/// Runs of ASCII whitespace inside a text leaf.
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\r\n\x0C]+").expect("invalid whitespace regex"));

/// Rendered fragments that must start on their own line.
static BLOCK_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?:{}|#|\||[-*+]\s|\d+\.\s)",
        regex::escape(TABLE_LABEL)
    ))
    .expect("invalid block fragment regex")
});

/// One rendered child, with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Fragment {
    text: String,
    from_element: bool,
}

impl Fragment {
    /// Fragment from a text leaf. Never treated as a block.
    pub(super) fn text(text: String) -> Self {
        Self {
            text,
            from_element: false,
        }
    }

    /// Fragment rendered from an element.
    pub(super) fn element(text: String) -> Self {
        Self {
            text,
            from_element: true,
        }
    }

    /// Whether the fragment is a heading, list, table or numbered line.
    ///
    /// Only fragments starting exactly at the marker count, so inline text such
    /// as `" - это"` stays inline.
    fn is_block(&self) -> bool {
        self.from_element && BLOCK_FRAGMENT.is_match(&self.text)
    }
}

/// Collapse whitespace runs in a text leaf to single spaces.
///
/// Edge spaces are kept so adjacent inline fragments stay separated.
pub(super) fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").into_owned()
}

/// Concatenate fragments without separators, except that a block fragment is
/// put on its own paragraph: a blank line is inserted between it and its
/// neighbor unless the text before already ends with a newline.
pub(super) fn join_parts(fragments: &[Fragment]) -> String {
    let mut out = String::new();
    let mut previous_block = false;

    for fragment in fragments {
        if fragment.text.is_empty() {
            continue;
        }
        let block = fragment.is_block();
        if block || previous_block {
            let kept = out.trim_end_matches([' ', '\t']).len();
            out.truncate(kept);
            if !out.is_empty() && !out.ends_with('\n') {
                out.push_str("\n\n");
            }
            out.push_str(fragment.text.trim_start_matches([' ', '\t']));
        } else {
            out.push_str(&fragment.text);
        }
        previous_block = block;
    }
    out
}

/// Accumulates the output of a block container: block children become
/// separate pieces and each run of inline siblings is joined into one piece.
pub(super) struct Blocks {
    separator: &'static str,
    pieces: Vec<String>,
    inline: Vec<Fragment>,
}

impl Blocks {
    pub(super) fn new(separator: &'static str) -> Self {
        Self {
            separator,
            pieces: Vec::new(),
            inline: Vec::new(),
        }
    }

    pub(super) fn push_inline(&mut self, fragment: Fragment) {
        self.inline.push(fragment);
    }

    pub(super) fn push_block(&mut self, text: &str) {
        self.flush_inline();
        let text = text.trim();
        if !text.is_empty() {
            self.pieces.push(text.to_owned());
        }
    }

    fn flush_inline(&mut self) {
        if self.inline.is_empty() {
            return;
        }
        let joined = join_parts(&self.inline);
        self.inline.clear();
        let joined = joined.trim();
        if !joined.is_empty() {
            self.pieces.push(joined.to_owned());
        }
    }

    pub(super) fn finish(mut self) -> String {
        self.flush_inline();
        self.pieces.join(self.separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Fragment {
        Fragment::text(s.to_owned())
    }

    fn element(s: &str) -> Fragment {
        Fragment::element(s.to_owned())
    }

    #[test]
    fn test_collapse_whitespace_keeps_edges() {
        assert_eq!(collapse_whitespace("\n   Текст    с\tпробелами \n"), " Текст с пробелами ");
        assert_eq!(collapse_whitespace("a\u{a0} b"), "a\u{a0} b");
    }

    #[test]
    fn test_inline_fragments_join_tightly() {
        let parts = [text("Смотри документ: "), element("[Требования]"), text(".")];
        assert_eq!(join_parts(&parts), "Смотри документ: [Требования].");
    }

    #[test]
    fn test_block_fragment_starts_new_paragraph() {
        let parts = [text("Intro "), element("- item"), text("after")];
        assert_eq!(join_parts(&parts), "Intro\n\n- item\n\nafter");
    }

    #[test]
    fn test_block_after_newline_needs_no_blank_line() {
        let parts = [element("first\n"), element("## Heading")];
        assert_eq!(join_parts(&parts), "first\n## Heading");
    }

    #[test]
    fn test_block_detection() {
        assert!(element("# H").is_block());
        assert!(element("| a |").is_block());
        assert!(element("1. one").is_block());
        assert!(element("* star").is_block());
        assert!(element("**Таблица:**\n| a |").is_block());
        assert!(!element(" - это").is_block());
        assert!(!element("**bold**").is_block());
        assert!(!text("# not from an element").is_block());
    }

    #[test]
    fn test_blocks_separate_pieces() {
        let mut blocks = Blocks::new("\n\n");
        blocks.push_inline(text("  loose "));
        blocks.push_inline(element("text"));
        blocks.push_block("## Title ");
        blocks.push_block("   ");
        blocks.push_block("Paragraph");
        assert_eq!(blocks.finish(), "loose text\n\n## Title\n\nParagraph");
    }
}
