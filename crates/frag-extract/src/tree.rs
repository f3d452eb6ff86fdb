//! Document tree for storage-format markup.
//!
//! The tree is owned top-down: every [`Element`] owns its children and nothing
//! points back up. Style inheritance is resolved by carrying an explicit
//! ancestor stack during traversal (see [`crate::color::AncestorChain`]).

use std::collections::HashMap;

/// Node in a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Element with tag, attributes and children.
    Element(Element),
    /// Raw text content. Never carries style information.
    Text(String),
}

impl Node {
    /// Element payload, if this node is an element.
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }

    /// Text payload, if this node is a text leaf.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Element(_) => None,
            Self::Text(text) => Some(text),
        }
    }

    /// Whether this node is a text leaf containing only whitespace.
    #[must_use]
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

/// Recognized tag vocabulary.
///
/// Unrecognized tags map to [`TagKind::Generic`] and are rendered as plain
/// containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// `h1` to `h6`.
    Heading(u8),
    Paragraph,
    Div,
    Span,
    UnorderedList,
    OrderedList,
    ListItem,
    Table,
    /// `thead`, `tbody`, `tfoot`.
    TableSection,
    TableRow,
    /// `td` or `th`.
    TableCell {
        header: bool,
    },
    /// `a`.
    Anchor,
    LineBreak,
    /// `s`, `strike`, `del`.
    Strike,
    Time,
    /// `ac:structured-macro`.
    Macro,
    /// `ac:parameter`.
    MacroParameter,
    /// `ac:rich-text-body`.
    RichTextBody,
    /// `ac:layout`, `ac:layout-section`, `ac:layout-cell`.
    Layout,
    /// `ac:link`.
    PageLink,
    /// `ri:page`.
    PageRef,
    /// `colgroup`, `col`.
    ColumnGroup,
    Generic,
}

impl TagKind {
    /// Classify a (possibly namespace-prefixed) tag name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "h1" => Self::Heading(1),
            "h2" => Self::Heading(2),
            "h3" => Self::Heading(3),
            "h4" => Self::Heading(4),
            "h5" => Self::Heading(5),
            "h6" => Self::Heading(6),
            "p" => Self::Paragraph,
            "div" => Self::Div,
            "span" => Self::Span,
            "ul" => Self::UnorderedList,
            "ol" => Self::OrderedList,
            "li" => Self::ListItem,
            "table" => Self::Table,
            "thead" | "tbody" | "tfoot" => Self::TableSection,
            "tr" => Self::TableRow,
            "td" => Self::TableCell { header: false },
            "th" => Self::TableCell { header: true },
            "a" => Self::Anchor,
            "br" => Self::LineBreak,
            "s" | "strike" | "del" => Self::Strike,
            "time" => Self::Time,
            "ac:structured-macro" => Self::Macro,
            "ac:parameter" => Self::MacroParameter,
            "ac:rich-text-body" => Self::RichTextBody,
            "ac:layout" | "ac:layout-section" | "ac:layout-cell" => Self::Layout,
            "ac:link" => Self::PageLink,
            "ri:page" => Self::PageRef,
            "colgroup" | "col" => Self::ColumnGroup,
            _ => Self::Generic,
        }
    }

    /// Whether elements of this kind start a new block when rendered.
    #[must_use]
    pub fn is_block(self) -> bool {
        matches!(
            self,
            Self::Heading(_)
                | Self::Paragraph
                | Self::Div
                | Self::UnorderedList
                | Self::OrderedList
                | Self::Table
                | Self::RichTextBody
                | Self::Layout
        )
    }

    /// Whether this kind is a list (`ul` / `ol`).
    #[must_use]
    pub fn is_list(self) -> bool {
        matches!(self, Self::UnorderedList | Self::OrderedList)
    }
}

/// Element node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Tag name as written in the markup (may include namespace prefix).
    pub name: String,
    /// Classified tag.
    pub kind: TagKind,
    /// Element attributes.
    pub attrs: HashMap<String, String>,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element with the given tag name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: TagKind::from_name(&name),
            name,
            attrs: HashMap::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Set children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Append a text child.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Attribute value by name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// The `ac:name` of a structured macro or parameter.
    #[must_use]
    pub fn macro_name(&self) -> Option<&str> {
        self.attr("ac:name")
    }

    /// Whether the `class` attribute contains a token containing `needle`.
    #[must_use]
    pub fn has_class(&self, needle: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c.contains(needle)))
    }

    /// Issue-tracker reference macro.
    #[must_use]
    pub fn is_issue_macro(&self) -> bool {
        self.kind == TagKind::Macro && self.macro_name() == Some("jira")
    }

    /// Collapsible "expand" macro.
    #[must_use]
    pub fn is_expand_macro(&self) -> bool {
        self.kind == TagKind::Macro && self.macro_name() == Some("expand")
    }

    /// Direct element children.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// First direct child element matching the predicate.
    pub fn find_child(&self, predicate: impl Fn(&Element) -> bool) -> Option<&Element> {
        self.child_elements().find(|element| predicate(element))
    }

    /// First descendant element (depth-first, document order) matching the predicate.
    pub fn find_descendant(&self, predicate: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        for child in self.child_elements() {
            if predicate(child) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(predicate) {
                return Some(found);
            }
        }
        None
    }

    /// Whether any descendant element matches the predicate.
    pub fn has_descendant(&self, predicate: &dyn Fn(&Element) -> bool) -> bool {
        self.find_descendant(predicate).is_some()
    }

    /// Concatenated text of all descendant text leaves.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out, false);
        out
    }

    /// Text of all descendant leaves, each trimmed, concatenated without separators.
    #[must_use]
    pub fn stripped_text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out, true);
        out
    }

    /// Whether the element has any non-whitespace descendant text.
    #[must_use]
    pub fn has_text(&self) -> bool {
        self.children.iter().any(|child| match child {
            Node::Text(text) => !text.trim().is_empty(),
            Node::Element(element) => element.has_text(),
        })
    }
}

fn collect_text(element: &Element, out: &mut String, strip: bool) {
    for child in &element.children {
        match child {
            Node::Text(text) if strip => out.push_str(text.trim()),
            Node::Text(text) => out.push_str(text),
            Node::Element(child) => collect_text(child, out, strip),
        }
    }
}

/// Parsed document: an ordered forest of nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Top-level nodes.
    pub nodes: Vec<Node>,
}

impl Document {
    /// Create a document from top-level nodes.
    #[must_use]
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Whether the document has no non-whitespace text anywhere.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.nodes.iter().all(|node| match node {
            Node::Text(text) => text.trim().is_empty(),
            Node::Element(element) => !element.has_text(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_kind_from_name() {
        assert_eq!(TagKind::from_name("h3"), TagKind::Heading(3));
        assert_eq!(TagKind::from_name("th"), TagKind::TableCell { header: true });
        assert_eq!(TagKind::from_name("ac:layout-cell"), TagKind::Layout);
        assert_eq!(TagKind::from_name("ac:task-list"), TagKind::Generic);
        assert_eq!(TagKind::from_name("strong"), TagKind::Generic);
    }

    #[test]
    fn test_stripped_text_joins_trimmed_leaves() {
        let element = Element::new("p").with_children(vec![
            Element::new("strong").with_text(" История ").into(),
            Node::from("  изменений: "),
        ]);
        assert_eq!(element.stripped_text(), "Историяизменений:");
        assert_eq!(element.text_content(), " История   изменений: ");
    }

    #[test]
    fn test_has_class_matches_token_substring() {
        let element = Element::new("div").with_attr("class", "expand-container conf-macro");
        assert!(element.has_class("expand-container"));
        assert!(element.has_class("conf-macro"));
        assert!(!element.has_class("table-wrap"));
    }

    #[test]
    fn test_issue_and_expand_macros() {
        let jira = Element::new("ac:structured-macro").with_attr("ac:name", "jira");
        let expand = Element::new("ac:structured-macro").with_attr("ac:name", "expand");
        assert!(jira.is_issue_macro());
        assert!(!jira.is_expand_macro());
        assert!(expand.is_expand_macro());
    }

    #[test]
    fn test_find_descendant_depth_first() {
        let element = Element::new("div").with_children(vec![
            Element::new("div")
                .with_children(vec![Element::new("table").with_attr("id", "inner").into()])
                .into(),
            Element::new("table").with_attr("id", "outer").into(),
        ]);
        let found = element
            .find_descendant(&|e| e.kind == TagKind::Table)
            .and_then(|e| e.attr("id"));
        assert_eq!(found, Some("inner"));
    }

    #[test]
    fn test_blank_document() {
        let doc = Document::new(vec![
            Node::from("  \n "),
            Element::new("p").with_text(" ").into(),
        ]);
        assert!(doc.is_blank());
        let doc = Document::new(vec![Element::new("p").with_text("x").into()]);
        assert!(!doc.is_blank());
    }
}
