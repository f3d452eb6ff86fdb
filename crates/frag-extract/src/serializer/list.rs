//! Ordered and unordered lists.

use crate::color::AncestorChain;
use crate::tree::{Element, Node, TagKind};

use super::join::Blocks;
use super::{Context, Position, Serializer, is_excluded, renders_as_block};

/// Bullet markers by nesting depth, cycling.
const BULLETS: [&str; 3] = ["-", "*", "+"];

/// Indentation per nesting level.
const INDENT: &str = "    ";

impl Serializer<'_> {
    /// Render a list at the given nesting depth, one line per item.
    ///
    /// Nested lists are rendered after their item's line at `depth + 1`.
    /// Ordered lists number only the items that produce a line.
    pub(super) fn render_list<'a>(
        &self,
        list: &'a Element,
        depth: usize,
        context: Context,
        chain: &mut AncestorChain<'a>,
    ) -> String {
        let indent = INDENT.repeat(depth);
        let ordered = list.kind == TagKind::OrderedList;
        let mut number = 1usize;
        let mut lines = Vec::new();

        chain.push(list);
        for node in &list.children {
            let Node::Element(item) = node else {
                continue;
            };
            if item.kind != TagKind::ListItem || is_excluded(item) {
                continue;
            }

            let scope = self.enter_override_scope(item, chain);

            let text = if self.gate.should_descend(item, chain) {
                self.render_item_text(item, context, chain)
            } else {
                self.recover(item, context, chain, |child| !child.kind.is_list())
            };
            let text = single_line(&text);
            if !text.is_empty() {
                let marker = if ordered {
                    let marker = format!("{number}.");
                    number += 1;
                    marker
                } else {
                    BULLETS[depth % BULLETS.len()].to_owned()
                };
                lines.push(format!("{indent}{marker} {text}"));
            }

            chain.push(item);
            for nested in item.child_elements() {
                if nested.kind.is_list() && !is_excluded(nested) {
                    let rendered = self.render_list(nested, depth + 1, context, chain);
                    if !rendered.is_empty() {
                        lines.push(rendered);
                    }
                }
            }
            chain.pop();

            if let Some(previous) = scope {
                chain.restore_scope(previous);
            }
        }
        chain.pop();

        lines.join("\n")
    }

    /// Text of an item from its non-list children.
    fn render_item_text<'a>(
        &self,
        item: &'a Element,
        context: Context,
        chain: &mut AncestorChain<'a>,
    ) -> String {
        chain.push(item);
        let mut blocks = Blocks::new(" ");
        for (index, node) in item.children.iter().enumerate() {
            let position = Position {
                siblings: &item.children,
                index,
            };
            match node {
                Node::Element(child) if child.kind.is_list() => {}
                Node::Element(child) if renders_as_block(child) => {
                    blocks.push_block(&self.render_element(child, position, context, chain));
                }
                _ => blocks.push_inline(self.render_node(node, position, context, chain)),
            }
        }
        chain.pop();
        blocks.finish()
    }
}

/// Fold a multi-line rendering onto one line.
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
