//! Removal of "change history" sections.
//!
//! Pages often carry an editorial change log (a heading or a bold paragraph
//! followed by a table of dates, authors and tickets, or the same inside a
//! collapsed expand block). It is noise for every consumer of the extracted
//! text, so it is cut from the tree before anything else looks at it.

#![allow(clippy::unused_self)] // Unit struct methods have &self for API consistency

use crate::tree::{Document, Element, Node, TagKind};

/// Phrases marking a history section, matched as lowercase substrings.
const HISTORY_PHRASES: &[&str] = &[
    "история изменений",
    "история изменений:",
    "история изменений требований",
    "change history",
    "revision history",
];

/// Phrases matched after removing spaces, hyphens and underscores.
///
/// Covers heading anchors (`id="id-Историяизменений"`) and titles split across
/// several inline elements.
const HISTORY_COMPACT_PHRASES: &[&str] = &["историяизменений", "changehistory", "revisionhistory"];

/// Column names typical of a change log table.
const HISTORY_COLUMNS: &[&str] = &[
    "дата",
    "date",
    "описание",
    "description",
    "desc",
    "автор",
    "author",
    "задача в jira",
    "jira",
    "ticket",
    "issue",
    "версия",
    "version",
    "изменения",
    "changes",
];

/// Header cells matching [`HISTORY_COLUMNS`] needed to treat a table as a change log.
const MIN_HISTORY_COLUMNS: usize = 3;

/// Outcome of a removal pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryReport {
    /// Number of sections removed.
    pub removed: usize,
}

/// Cuts change history sections out of a document.
///
/// Four rules are applied in order, each over the whole tree:
///
/// 1. expand blocks titled with a history phrase are removed wholesale;
/// 2. headings whose text or `id` matches, with the history tables right after them;
/// 3. paragraphs whose text matches, with the history tables right after them;
/// 4. any table whose header row names at least three change log columns,
///    together with its `table-wrap` container.
///
/// Running the pass on its own output removes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryRemover;

impl HistoryRemover {
    /// Create a new remover.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Remove history sections in place.
    pub fn remove(&self, document: &mut Document) -> HistoryReport {
        let mut report = HistoryReport::default();

        report.removed += self.remove_expand_blocks(&mut document.nodes);
        report.removed +=
            self.remove_marked_sections(&mut document.nodes, &|e| self.is_history_heading(e));
        report.removed +=
            self.remove_marked_sections(&mut document.nodes, &|e| self.is_history_paragraph(e));
        report.removed += self.remove_history_tables(&mut document.nodes);

        tracing::debug!(removed = report.removed, "Removed history sections");
        report
    }

    fn remove_expand_blocks(&self, nodes: &mut Vec<Node>) -> usize {
        let mut removed = 0;
        nodes.retain(|node| {
            let matched = node.as_element().is_some_and(|e| self.is_history_expand(e));
            if matched {
                removed += 1;
            }
            !matched
        });
        for node in nodes.iter_mut() {
            if let Node::Element(element) = node {
                removed += self.remove_expand_blocks(&mut element.children);
            }
        }
        removed
    }

    fn remove_marked_sections(
        &self,
        nodes: &mut Vec<Node>,
        is_marker: &dyn Fn(&Element) -> bool,
    ) -> usize {
        let mut removed = 0;
        let mut index = 0;
        while index < nodes.len() {
            let is_match = nodes[index].as_element().is_some_and(is_marker);
            if is_match {
                let end = self.following_history_end(nodes, index);
                nodes.drain(index..end);
                removed += 1;
                continue;
            }
            if let Node::Element(element) = &mut nodes[index] {
                removed += self.remove_marked_sections(&mut element.children, is_marker);
            }
            index += 1;
        }
        removed
    }

    /// Exclusive end of the run made of the marker at `start` and the
    /// history-related siblings that follow it.
    fn following_history_end(&self, nodes: &[Node], start: usize) -> usize {
        let mut end = start + 1;
        for (offset, node) in nodes.iter().enumerate().skip(start + 1) {
            match node {
                Node::Text(text) if text.trim().is_empty() => {}
                Node::Element(element) if self.is_history_related(element) => end = offset + 1,
                _ => break,
            }
        }
        end
    }

    fn remove_history_tables(&self, nodes: &mut Vec<Node>) -> usize {
        let mut removed = 0;
        nodes.retain(|node| {
            let matched = node.as_element().is_some_and(|e| {
                if e.kind == TagKind::Table {
                    self.is_history_table(e)
                } else {
                    e.has_class("table-wrap") && self.contains_history_table(e)
                }
            });
            if matched {
                removed += 1;
            }
            !matched
        });
        for node in nodes.iter_mut() {
            if let Node::Element(element) = node {
                removed += self.remove_history_tables(&mut element.children);
            }
        }
        removed
    }

    fn is_history_expand(&self, element: &Element) -> bool {
        if element.is_expand_macro() {
            return element
                .find_child(|child| {
                    child.kind == TagKind::MacroParameter && child.macro_name() == Some("title")
                })
                .is_some_and(|title| is_history_text(&title.stripped_text()));
        }
        if element.kind == TagKind::Div && element.has_class("expand-container") {
            return element
                .find_descendant(&|e| e.kind == TagKind::Div && e.has_class("expand-control"))
                .is_some_and(|control| is_history_text(&control.stripped_text()));
        }
        false
    }

    fn is_history_heading(&self, element: &Element) -> bool {
        matches!(element.kind, TagKind::Heading(_))
            && (is_history_text(&element.stripped_text())
                || element.attr("id").is_some_and(is_history_text))
    }

    fn is_history_paragraph(&self, element: &Element) -> bool {
        element.kind == TagKind::Paragraph && is_history_text(&element.stripped_text())
    }

    /// Siblings swept away together with a history heading or paragraph.
    fn is_history_related(&self, element: &Element) -> bool {
        (element.kind == TagKind::Div && element.has_class("table-wrap"))
            || element.kind == TagKind::Table
            || self.contains_history_table(element)
    }

    fn contains_history_table(&self, element: &Element) -> bool {
        element.has_descendant(&|e| e.kind == TagKind::Table && self.is_history_table(e))
    }

    fn is_history_table(&self, table: &Element) -> bool {
        let headers = header_cells(table);
        let matches = headers
            .iter()
            .filter(|cell| {
                let text = cell.stripped_text().to_lowercase();
                HISTORY_COLUMNS.iter().any(|column| text.contains(column))
            })
            .count();
        matches >= MIN_HISTORY_COLUMNS
    }
}

/// Whether a title, paragraph or anchor id names a history section.
#[must_use]
pub fn is_history_text(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return false;
    }
    if HISTORY_PHRASES.iter().any(|phrase| text.contains(phrase)) {
        return true;
    }
    let compact: String = text
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .collect();
    HISTORY_COMPACT_PHRASES
        .iter()
        .any(|phrase| compact.contains(phrase))
}

/// Cells of a table's header row: all `thead` cells, else the first row of
/// `tbody`, else the first direct row.
fn header_cells(table: &Element) -> Vec<&Element> {
    if let Some(thead) = table.find_child(|e| e.name == "thead") {
        let cells: Vec<&Element> = thead
            .child_elements()
            .filter(|row| row.kind == TagKind::TableRow)
            .flat_map(row_cells)
            .collect();
        if !cells.is_empty() {
            return cells;
        }
    }

    table
        .find_child(|e| e.name == "tbody")
        .and_then(first_row)
        .or_else(|| first_row(table))
        .map(row_cells)
        .unwrap_or_default()
}

fn first_row(container: &Element) -> Option<&Element> {
    container.find_child(|e| e.kind == TagKind::TableRow)
}

fn row_cells(row: &Element) -> Vec<&Element> {
    row.child_elements()
        .filter(|cell| matches!(cell.kind, TagKind::TableCell { .. }))
        .collect()
}
