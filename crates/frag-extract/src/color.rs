//! Text color classification.
//!
//! Editors mark unfinished content by coloring it. Anything rendered in the
//! editor's default black (or one of its near-black swatches) is approved;
//! any other declared color is pending. Elements without a color declaration
//! inherit the status of their nearest colored ancestor.

use crate::tree::{Element, TagKind};

/// Color literals that render as default black in the source editor.
const BLACK_COLORS: &[&str] = &[
    "black",
    "#000",
    "#000000",
    "rgb(0,0,0)",
    "rgb(0, 0, 0)",
    "rgba(0,0,0,1)",
    "rgba(0, 0, 0, 1)",
    "rgb(51,51,0)",
    "rgb(51, 51, 0)",
    "rgb(0,51,0)",
    "rgb(0, 51, 0)",
    "rgb(0,51,102)",
    "rgb(0, 51, 102)",
    "rgb(51,51,51)",
    "rgb(51, 51, 51)",
    "rgb(23,43,77)",
    "rgb(23, 43, 77)",
];

/// Approval status derived from an element's own `color` declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorStatus {
    /// Declared color is black or a default near-black swatch.
    Approved,
    /// Declared color is anything else.
    Pending,
    /// No color declared; the status comes from the ancestors.
    Indeterminate,
}

/// Value of a CSS property in an inline `style` attribute.
///
/// Property names are compared case-insensitively and the last declaration
/// wins. Returns the lowercased, trimmed value.
pub(crate) fn style_property(element: &Element, property: &str) -> Option<String> {
    let style = element.attr("style")?;
    style
        .split(';')
        .filter_map(|declaration| declaration.split_once(':'))
        .filter(|(name, _)| name.trim().eq_ignore_ascii_case(property))
        .map(|(_, value)| value.trim().to_lowercase())
        .next_back()
}

/// Whether a color literal counts as visually black.
#[must_use]
pub fn is_black_color(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    let value = value.strip_suffix("!important").map_or(value.as_str(), str::trim_end);
    BLACK_COLORS.contains(&value)
}

/// Classify an element by its own `color` declaration only.
#[must_use]
pub fn classify_own(element: &Element) -> ColorStatus {
    match style_property(element, "color") {
        None => ColorStatus::Indeterminate,
        Some(value) if value.is_empty() => ColorStatus::Indeterminate,
        Some(value) if is_black_color(&value) => ColorStatus::Approved,
        Some(_) => ColorStatus::Pending,
    }
}

/// Whether the element is styled as struck-through text.
pub(crate) fn is_struck_through(element: &Element) -> bool {
    element.kind == TagKind::Strike
        || style_property(element, "text-decoration")
            .is_some_and(|value| value.contains("line-through"))
}

/// Stack of elements enclosing the node currently being rendered.
///
/// The chain replaces parent pointers: the serializer pushes an element before
/// descending into its children and pops it afterwards. A scope start hides
/// outer ancestors from inheritance lookups; it is moved when an explicitly
/// black element is recovered from inside a pending container.
#[derive(Debug, Default, Clone)]
pub struct AncestorChain<'a> {
    stack: Vec<&'a Element>,
    scope_start: usize,
}

impl<'a> AncestorChain<'a> {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter an element.
    pub fn push(&mut self, element: &'a Element) {
        self.stack.push(element);
    }

    /// Leave the innermost element.
    pub fn pop(&mut self) {
        self.stack.pop();
        self.scope_start = self.scope_start.min(self.stack.len());
    }

    /// Start a new inheritance scope at the current depth.
    ///
    /// Returns the previous scope start, to be passed to [`Self::restore_scope`].
    pub fn begin_scope(&mut self) -> usize {
        std::mem::replace(&mut self.scope_start, self.stack.len())
    }

    /// Restore a scope start returned by [`Self::begin_scope`].
    pub fn restore_scope(&mut self, previous: usize) {
        self.scope_start = previous.min(self.stack.len());
    }

    /// Ancestors visible to inheritance lookups, innermost first.
    pub fn scoped_ancestors(&self) -> impl Iterator<Item = &'a Element> + '_ {
        self.stack[self.scope_start..].iter().rev().copied()
    }
}

/// Whether an element is pending, either by its own color or by inheritance.
///
/// Ancestors are walked innermost first and the walk stops at the nearest
/// `ac:rich-text-body`, which bounds style inheritance.
#[must_use]
pub fn is_pending_in_context(element: &Element, chain: &AncestorChain<'_>) -> bool {
    if classify_own(element) == ColorStatus::Pending {
        return true;
    }
    chain
        .scoped_ancestors()
        .take_while(|ancestor| ancestor.kind != TagKind::RichTextBody)
        .any(|ancestor| classify_own(ancestor) == ColorStatus::Pending)
}

/// Decides whether the serializer renders an element normally.
pub trait ColorGate {
    /// `true` to render the element, `false` to treat it as excluded.
    fn should_descend(&self, element: &Element, chain: &AncestorChain<'_>) -> bool;
}

/// Gate for the "all fragments" view: every element passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGate;

impl ColorGate for OpenGate {
    fn should_descend(&self, _element: &Element, _chain: &AncestorChain<'_>) -> bool {
        true
    }
}

/// Gate for the "approved fragments" view: pending elements are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApprovedGate;

impl ColorGate for ApprovedGate {
    fn should_descend(&self, element: &Element, chain: &AncestorChain<'_>) -> bool {
        !is_pending_in_context(element, chain)
    }
}
