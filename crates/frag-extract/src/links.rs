//! Link neighbor resolution for the approved view.
//!
//! A link carries no color of its own in practice, so its status is inferred
//! from the nearest text on either side within the same parent.

use crate::color::{ColorStatus, classify_own};
use crate::tree::{Node, TagKind};

/// Scan direction from the link position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Left,
    Right,
}

/// Decide whether the link at `index` among `siblings` is kept.
///
/// The link is dropped only when the nearest status-bearing neighbors on both
/// sides are pending. A missing side takes the status of the other side; with
/// no neighbors at all the link is kept.
#[must_use]
pub fn keep_link(siblings: &[Node], index: usize) -> bool {
    let left = neighbor_status(siblings, index, Direction::Left);
    let right = neighbor_status(siblings, index, Direction::Right);

    let (left, right) = match (left, right) {
        (None, None) => return true,
        (None, Some(status)) | (Some(status), None) => (status, status),
        (Some(left), Some(right)) => (left, right),
    };

    !(left == ColorStatus::Pending && right == ColorStatus::Pending)
}

fn neighbor_status(siblings: &[Node], index: usize, direction: Direction) -> Option<ColorStatus> {
    match direction {
        Direction::Left => siblings.get(..index)?.iter().rev().find_map(block_status),
        Direction::Right => siblings.get(index + 1..)?.iter().find_map(block_status),
    }
}

/// Status of a single sibling, or `None` when it carries no text to judge by.
fn block_status(node: &Node) -> Option<ColorStatus> {
    match node {
        Node::Text(text) if text.trim().is_empty() => None,
        Node::Text(_) => Some(ColorStatus::Approved),
        Node::Element(element) => {
            if matches!(element.kind, TagKind::LineBreak | TagKind::Macro) || !element.has_text() {
                return None;
            }
            match classify_own(element) {
                ColorStatus::Pending => Some(ColorStatus::Pending),
                ColorStatus::Approved | ColorStatus::Indeterminate => Some(ColorStatus::Approved),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Element;

    fn red(text: &str) -> Node {
        Element::new("span")
            .with_attr("style", "color: rgb(255,0,0)")
            .with_text(text)
            .into()
    }

    fn link() -> Node {
        Element::new("ac:link").with_text("Page").into()
    }

    #[test]
    fn test_link_without_neighbors_is_kept() {
        assert!(keep_link(&[link()], 0));
        assert!(keep_link(&[Node::from("  "), link(), Element::new("br").into()], 1));
    }

    #[test]
    fn test_link_between_pending_neighbors_is_dropped() {
        let siblings = vec![red("before"), Node::from(" "), link(), red("after")];
        assert!(!keep_link(&siblings, 2));
    }

    #[test]
    fn test_plain_text_on_one_side_keeps_link() {
        let siblings = vec![Node::from("plain "), link(), red("after")];
        assert!(keep_link(&siblings, 1));
        let siblings = vec![red("before"), link(), Node::from(", then plain")];
        assert!(keep_link(&siblings, 1));
    }

    #[test]
    fn test_single_pending_side_substitutes_for_missing_side() {
        assert!(!keep_link(&[link(), red("after")], 0));
        assert!(!keep_link(&[red("before"), link()], 1));
    }

    #[test]
    fn test_unstyled_element_counts_as_approved() {
        let siblings = vec![
            red("before"),
            link(),
            Element::new("strong").with_text("bold").into(),
        ];
        assert!(keep_link(&siblings, 1));
    }

    #[test]
    fn test_breaks_macros_and_empty_elements_are_skipped() {
        let siblings = vec![
            red("before"),
            link(),
            Element::new("br").into(),
            Element::new("ac:structured-macro")
                .with_attr("ac:name", "jira")
                .with_text("ABC-1")
                .into(),
            Element::new("span").into(),
            red("after"),
        ];
        assert!(!keep_link(&siblings, 1));
    }
}
