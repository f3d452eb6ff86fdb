//! Structural serializer: document tree to hybrid Markdown.
//!
//! One recursive walk serves both views. The [`ColorGate`] decides whether an
//! element is rendered; a rejected element is searched for explicitly black
//! sub-elements, which are rendered on their own. Bare text inside a rejected
//! element is never promoted.

mod join;
mod list;
mod table;

use crate::color::{AncestorChain, ColorGate, ColorStatus, classify_own, is_struck_through};
use crate::links::keep_link;
use crate::policy::ExtractionPolicy;
use crate::tree::{Document, Element, Node, TagKind};

use join::{Blocks, Fragment, collapse_whitespace, join_parts};

pub use table::TABLE_LABEL;

/// Where an element is being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    /// Page body, outside any table.
    Default,
    /// Cell of a top-level table.
    TableCell,
    /// Cell of a table nested inside another table's cell.
    NestedTableCell,
}

impl Context {
    /// Whether rendering happens inside a table cell.
    #[must_use]
    pub fn is_cell(self) -> bool {
        matches!(self, Self::TableCell | Self::NestedTableCell)
    }

    fn block_separator(self) -> &'static str {
        if self.is_cell() { "\n" } else { "\n\n" }
    }
}

/// Position of a node among its siblings; links need it to look at neighbors.
#[derive(Debug, Clone, Copy)]
struct Position<'a> {
    siblings: &'a [Node],
    index: usize,
}

/// Renders a document according to a policy and a color gate.
pub struct Serializer<'p> {
    policy: &'p ExtractionPolicy,
    gate: &'p dyn ColorGate,
}

impl<'p> Serializer<'p> {
    /// Create a serializer.
    #[must_use]
    pub fn new(policy: &'p ExtractionPolicy, gate: &'p dyn ColorGate) -> Self {
        Self { policy, gate }
    }

    /// Render a whole document. Top-level blocks are separated by blank lines.
    #[must_use]
    pub fn render_document(&self, document: &Document) -> String {
        let mut chain = AncestorChain::new();
        self.render_blocks(&document.nodes, Context::Default, &mut chain)
    }

    /// Render siblings as a block container.
    fn render_blocks<'a>(
        &self,
        nodes: &'a [Node],
        context: Context,
        chain: &mut AncestorChain<'a>,
    ) -> String {
        self.render_blocks_joined(nodes, context, chain, context.block_separator())
    }

    /// Render siblings as a block container with an explicit piece separator.
    fn render_blocks_joined<'a>(
        &self,
        nodes: &'a [Node],
        context: Context,
        chain: &mut AncestorChain<'a>,
        separator: &'static str,
    ) -> String {
        let mut blocks = Blocks::new(separator);
        for (index, node) in nodes.iter().enumerate() {
            let position = Position {
                siblings: nodes,
                index,
            };
            match node {
                Node::Element(element) if renders_as_block(element) => {
                    blocks.push_block(&self.render_element(element, position, context, chain));
                }
                _ => blocks.push_inline(self.render_node(node, position, context, chain)),
            }
        }
        blocks.finish()
    }

    /// Render siblings as inline content.
    fn render_inline<'a>(
        &self,
        nodes: &'a [Node],
        context: Context,
        chain: &mut AncestorChain<'a>,
    ) -> String {
        let fragments: Vec<Fragment> = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let position = Position {
                    siblings: nodes,
                    index,
                };
                self.render_node(node, position, context, chain)
            })
            .collect();
        join_parts(&fragments)
    }

    fn render_node<'a>(
        &self,
        node: &'a Node,
        position: Position<'a>,
        context: Context,
        chain: &mut AncestorChain<'a>,
    ) -> Fragment {
        match node {
            Node::Text(text) => Fragment::text(collapse_whitespace(text)),
            Node::Element(element) => {
                Fragment::element(self.render_element(element, position, context, chain))
            }
        }
    }

    fn render_element<'a>(
        &self,
        element: &'a Element,
        position: Position<'a>,
        context: Context,
        chain: &mut AncestorChain<'a>,
    ) -> String {
        if is_excluded(element) {
            return String::new();
        }
        if !self.gate.should_descend(element, chain) {
            return self.recover(element, context, chain, |_| true);
        }

        match element.kind {
            TagKind::Heading(level) if self.policy.format_headers => {
                self.render_heading(element, level, context, chain)
            }
            TagKind::Paragraph => self.render_paragraph(element, context, chain),
            TagKind::UnorderedList | TagKind::OrderedList if self.policy.format_lists => {
                self.render_list(element, 0, context, chain)
            }
            TagKind::Table if self.policy.format_tables => {
                self.render_table(element, context, chain)
            }
            TagKind::Anchor | TagKind::PageLink => self.render_link(element, position),
            TagKind::LineBreak => "\n".to_owned(),
            TagKind::Time => match element.attr("datetime") {
                Some(datetime) => datetime.to_owned(),
                None => self.render_children(element, context, chain),
            },
            TagKind::ColumnGroup | TagKind::MacroParameter | TagKind::PageRef => String::new(),
            TagKind::Macro if element.is_expand_macro() => {
                self.render_expand(element, context, chain)
            }
            TagKind::Macro | TagKind::RichTextBody | TagKind::Layout => {
                chain.push(element);
                let rendered = self.render_blocks(&element.children, context, chain);
                chain.pop();
                rendered
            }
            TagKind::Heading(_)
            | TagKind::Div
            | TagKind::Span
            | TagKind::UnorderedList
            | TagKind::OrderedList
            | TagKind::ListItem
            | TagKind::Table
            | TagKind::TableSection
            | TagKind::TableRow
            | TagKind::TableCell { .. }
            | TagKind::Strike
            | TagKind::Generic => self.render_children(element, context, chain),
        }
    }

    /// Render an element's children, as blocks when any child is a block.
    fn render_children<'a>(
        &self,
        element: &'a Element,
        context: Context,
        chain: &mut AncestorChain<'a>,
    ) -> String {
        chain.push(element);
        let rendered = if has_block_children(element) {
            self.render_blocks(&element.children, context, chain)
        } else {
            self.render_inline(&element.children, context, chain)
        };
        chain.pop();
        rendered
    }

    fn render_heading<'a>(
        &self,
        element: &'a Element,
        level: u8,
        context: Context,
        chain: &mut AncestorChain<'a>,
    ) -> String {
        let content = self.render_children(element, context, chain);
        let content = content.trim();
        if content.is_empty() {
            return String::new();
        }
        format!("{} {content}", "#".repeat(usize::from(level)))
    }

    fn render_paragraph<'a>(
        &self,
        element: &'a Element,
        context: Context,
        chain: &mut AncestorChain<'a>,
    ) -> String {
        let content = self.render_children(element, context, chain);
        let content = content.trim();
        if content.is_empty() {
            String::new()
        } else if context.is_cell() {
            format!("{content}\n")
        } else {
            content.to_owned()
        }
    }

    /// An expand macro contributes only its rich text body.
    fn render_expand<'a>(
        &self,
        element: &'a Element,
        context: Context,
        chain: &mut AncestorChain<'a>,
    ) -> String {
        chain.push(element);
        let mut blocks = Blocks::new(context.block_separator());
        for (index, node) in element.children.iter().enumerate() {
            if let Node::Element(body) = node
                && body.kind == TagKind::RichTextBody
            {
                let position = Position {
                    siblings: &element.children,
                    index,
                };
                blocks.push_block(&self.render_element(body, position, context, chain));
            }
        }
        chain.pop();
        blocks.finish()
    }

    fn render_link(&self, element: &Element, position: Position<'_>) -> String {
        if !self.policy.include_colored && !keep_link(position.siblings, position.index) {
            return String::new();
        }

        let title = element
            .find_descendant(&|e| e.kind == TagKind::PageRef)
            .and_then(|page| page.attr("ri:content-title"))
            .map(str::trim)
            .filter(|title| !title.is_empty());
        if let Some(title) = title {
            return format!("[{title}]");
        }

        let text = collapse_whitespace(&element.text_content());
        let text = text.trim();
        if text.is_empty() {
            String::new()
        } else {
            format!("[{text}]")
        }
    }

    /// Render what is explicitly black inside a rejected element.
    ///
    /// Bare text children are skipped. A child whose own color is black is
    /// rendered normally in a fresh inheritance scope; any other child goes
    /// through the gate again and is searched the same way when rejected.
    /// `include` filters the children considered at this level.
    fn recover<'a>(
        &self,
        element: &'a Element,
        context: Context,
        chain: &mut AncestorChain<'a>,
        include: fn(&Element) -> bool,
    ) -> String {
        chain.push(element);
        let mut blocks = Blocks::new(context.block_separator());
        for (index, node) in element.children.iter().enumerate() {
            let Node::Element(child) = node else {
                continue;
            };
            if is_excluded(child) || !include(child) {
                continue;
            }

            let position = Position {
                siblings: &element.children,
                index,
            };
            let rendered = if classify_own(child) == ColorStatus::Approved {
                let previous = chain.begin_scope();
                let rendered = self.render_element(child, position, context, chain);
                chain.restore_scope(previous);
                rendered
            } else {
                self.render_element(child, position, context, chain)
            };

            if renders_as_block(child) {
                blocks.push_block(&rendered);
            } else {
                blocks.push_inline(Fragment::element(rendered));
            }
        }
        chain.pop();
        blocks.finish()
    }

    /// Start a fresh inheritance scope for an explicitly black element that the
    /// gate rejects only because of a pending ancestor.
    ///
    /// Returns the scope to restore once the element is rendered.
    fn enter_override_scope(
        &self,
        element: &Element,
        chain: &mut AncestorChain<'_>,
    ) -> Option<usize> {
        let overrides = classify_own(element) == ColorStatus::Approved
            && !self.gate.should_descend(element, chain);
        overrides.then(|| chain.begin_scope())
    }
}

/// Struck-through text and issue tracker macros never reach the output.
fn is_excluded(element: &Element) -> bool {
    is_struck_through(element) || element.is_issue_macro()
}

fn is_block_kind(element: &Element) -> bool {
    element.kind.is_block() || (element.kind == TagKind::Macro && !element.is_issue_macro())
}

/// Whether the element is laid out as a separate block by its container.
fn renders_as_block(element: &Element) -> bool {
    is_block_kind(element)
        || (matches!(element.kind, TagKind::Span | TagKind::Generic)
            && element.child_elements().any(is_block_kind))
}

fn has_block_children(element: &Element) -> bool {
    element.child_elements().any(renders_as_block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ApprovedGate, OpenGate};
    use crate::parser::MarkupParser;
    use pretty_assertions::assert_eq;

    pub(super) fn render_with(markup: &str, policy: &ExtractionPolicy) -> String {
        let document = MarkupParser::new().parse(markup);
        let gate: &dyn ColorGate = if policy.include_colored {
            &OpenGate
        } else {
            &ApprovedGate
        };
        Serializer::new(policy, gate).render_document(&document)
    }

    pub(super) fn render_all(markup: &str) -> String {
        render_with(markup, &ExtractionPolicy::all())
    }

    pub(super) fn render_approved(markup: &str) -> String {
        render_with(markup, &ExtractionPolicy::approved())
    }

    #[test]
    fn test_headings_and_paragraphs_are_separate_blocks() {
        assert_eq!(
            render_all("<h1>Title</h1><p>First</p><h3> Sub </h3><p>Second</p>"),
            "# Title\n\nFirst\n\n### Sub\n\nSecond"
        );
    }

    #[test]
    fn test_empty_heading_is_dropped() {
        assert_eq!(render_all("<h2> </h2><p>Body</p>"), "Body");
    }

    #[test]
    fn test_inline_children_join_without_separators() {
        assert_eq!(
            render_all("<p>Смотри <strong>документ</strong>: <em>далее</em></p>"),
            "Смотри документ: далее"
        );
    }

    #[test]
    fn test_line_break_and_time() {
        assert_eq!(
            render_all(r#"<p>One<br/>Two <time datetime="2024-05-01" /></p>"#),
            "One\nTwo 2024-05-01"
        );
    }

    #[test]
    fn test_strike_and_issue_macros_are_excluded() {
        let markup = r#"<p>Keep <s>old</s><span style="text-decoration: line-through;">gone</span><ac:structured-macro ac:name="jira"><ac:parameter ac:name="key">ABC-1</ac:parameter></ac:structured-macro>end</p>"#;
        assert_eq!(render_all(markup), "Keep end");
        assert_eq!(render_approved(markup), "Keep end");
    }

    #[test]
    fn test_expand_renders_only_body() {
        let markup = r#"<ac:structured-macro ac:name="expand"><ac:parameter ac:name="title">Click</ac:parameter><ac:rich-text-body><h2>Inside</h2><p>Text</p></ac:rich-text-body></ac:structured-macro>"#;
        assert_eq!(render_all(markup), "## Inside\n\nText");
    }

    #[test]
    fn test_div_with_headings_is_block_container() {
        assert_eq!(
            render_all("<div><h2>A</h2>text<h3>B</h3></div>"),
            "## A\n\ntext\n\n### B"
        );
    }

    #[test]
    fn test_layout_cells_are_block_containers() {
        let markup = "<ac:layout><ac:layout-section><ac:layout-cell><p>Left</p></ac:layout-cell><ac:layout-cell><p>Right</p></ac:layout-cell></ac:layout-section></ac:layout>";
        assert_eq!(render_all(markup), "Left\n\nRight");
    }

    #[test]
    fn test_link_prefers_page_title() {
        let markup = r#"<p>См. <ac:link><ri:page ri:content-title="Клиент Банка" /><ac:plain-text-link-body><![CDATA[клиент]]></ac:plain-text-link-body></ac:link> и <a href="/x"> Техническое   задание </a>.</p>"#;
        assert_eq!(render_all(markup), "См. [Клиент Банка] и [Техническое задание].");
    }

    #[test]
    fn test_link_without_text_is_dropped() {
        assert_eq!(render_all(r#"<p>x<a href="/y"></a>y</p>"#), "xy");
    }

    #[test]
    fn test_color_gate_in_approved_mode() {
        let markup = r#"<p>Base <span style="color: rgb(255,0,0);">proposal</span> text</p><p style="color:red">Hidden</p>"#;
        assert_eq!(render_all(markup), "Base proposal text\n\nHidden");
        assert_eq!(render_approved(markup), "Base  text");
    }

    #[test]
    fn test_black_subtree_recovered_from_pending_container() {
        let markup = r#"<p style="color: red;">Draft <span style="color: black;">final</span> <strong>nested <span style="color: rgb(0,0,0);">also</span></strong></p>"#;
        assert_eq!(render_approved(markup), "finalalso");
    }

    #[test]
    fn test_recovered_blocks_stay_separate() {
        let markup = r#"<div style="color: red;"><p style="color: black;">One</p><p style="color: black;">Two</p></div>"#;
        assert_eq!(render_approved(markup), "One\n\nTwo");
    }

    #[test]
    fn test_rich_text_body_bounds_inheritance() {
        let markup = r#"<div style="color: red;"><ac:structured-macro ac:name="info"><ac:rich-text-body><p>Inside panel</p></ac:rich-text-body></ac:structured-macro></div>"#;
        assert_eq!(render_approved(markup), "Inside panel");
    }

    #[test]
    fn test_link_neighbor_rule_in_approved_mode() {
        let kept = r#"<p>plain <a href="/a">Link</a><span style="color:red">red</span></p>"#;
        assert_eq!(render_approved(kept), "plain [Link]");

        let dropped = r#"<p><span style="color:red">red</span><a href="/a">Link</a><span style="color:red">red</span></p>"#;
        assert_eq!(render_approved(dropped), "");
        assert_eq!(render_all(dropped), "red[Link]red");
    }

    #[test]
    fn test_unknown_tags_render_children() {
        assert_eq!(
            render_all("<custom-tag><inner>Text</inner> more</custom-tag>"),
            "Text more"
        );
    }

    #[test]
    fn test_disabled_heading_format() {
        let policy = ExtractionPolicy::all().with_headers(false);
        assert_eq!(render_with("<h2>Title</h2><p>x</p>", &policy), "Title\n\nx");
    }
}
