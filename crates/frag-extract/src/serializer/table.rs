//! Tables: Markdown pipe rows at the top level, literal markup when nested.

use crate::color::AncestorChain;
use crate::tree::{Element, TagKind};

use super::{Context, Serializer};

/// Label put in front of every rendered table.
pub const TABLE_LABEL: &str = "**Таблица:**";

/// Cell attributes carried over when greater than one.
const SPAN_ATTRIBUTES: [&str; 2] = ["rowspan", "colspan"];

/// A row with the section (`thead`, `tbody`, `tfoot`) it belongs to, if any.
type Row<'a> = (Option<&'a Element>, &'a Element);

impl Serializer<'_> {
    /// Render a table. Inside a cell the table becomes literal markup.
    pub(super) fn render_table<'a>(
        &self,
        table: &'a Element,
        context: Context,
        chain: &mut AncestorChain<'a>,
    ) -> String {
        if context.is_cell() {
            let literal = self.render_literal_table(table, chain);
            if literal.is_empty() {
                return String::new();
            }
            return format!("{TABLE_LABEL} {literal}");
        }

        let mut lines = Vec::new();
        let mut header_emitted = false;

        chain.push(table);
        for row in table_rows(table) {
            let cells = row_cells(row.1);
            if cells.is_empty() {
                continue;
            }
            let contents = self.render_row(row, &cells, Context::TableCell, chain);
            if self.drops_empty_row(&contents) {
                continue;
            }

            let formatted: Vec<String> = cells
                .iter()
                .zip(contents)
                .map(|(cell, content)| wrap_spanned_cell(cell, content))
                .collect();
            lines.push(format!("| {} |", formatted.join(" | ")));

            if !header_emitted && cells.iter().all(|cell| is_header_cell(cell)) {
                lines.push(format!("|{}", " --- |".repeat(cells.len())));
                header_emitted = true;
            }
        }
        chain.pop();

        if lines.is_empty() {
            return String::new();
        }
        format!("{TABLE_LABEL}\n{}", lines.join("\n"))
    }

    /// Render a table as `<table><tr><td>..</td></tr></table>` text.
    fn render_literal_table<'a>(
        &self,
        table: &'a Element,
        chain: &mut AncestorChain<'a>,
    ) -> String {
        let mut rows = String::new();

        chain.push(table);
        for row in table_rows(table) {
            let cells = row_cells(row.1);
            if cells.is_empty() {
                continue;
            }
            let contents = self.render_row(row, &cells, Context::NestedTableCell, chain);
            if self.drops_empty_row(&contents) {
                continue;
            }

            rows.push_str("<tr>");
            for (cell, content) in cells.iter().zip(contents) {
                let tag = if is_header_cell(cell) { "th" } else { "td" };
                let attrs = span_attributes(cell);
                if attrs.is_empty() {
                    rows.push_str(&format!("<{tag}>{content}</{tag}>"));
                } else {
                    rows.push_str(&format!("<{tag} {attrs}>{content}</{tag}>"));
                }
            }
            rows.push_str("</tr>");
        }
        chain.pop();

        if rows.is_empty() {
            return String::new();
        }
        format!("<table>{rows}</table>")
    }

    /// Render the cells of one row.
    fn render_row<'a>(
        &self,
        (section, row): Row<'a>,
        cells: &[&'a Element],
        context: Context,
        chain: &mut AncestorChain<'a>,
    ) -> Vec<String> {
        if let Some(section) = section {
            chain.push(section);
        }
        chain.push(row);

        let contents = cells
            .iter()
            .map(|&cell| self.render_cell(cell, context, chain))
            .collect();

        chain.pop();
        if section.is_some() {
            chain.pop();
        }
        contents
    }

    /// Render a cell as a block container, trimmed.
    ///
    /// A cell holding a nested table keeps the text around the table and the
    /// table's literal markup on one line, so the enclosing row is not split.
    fn render_cell<'a>(
        &self,
        cell: &'a Element,
        context: Context,
        chain: &mut AncestorChain<'a>,
    ) -> String {
        let scope = self.enter_override_scope(cell, chain);
        let content = if self.gate.should_descend(cell, chain) {
            let separator = if cell.has_descendant(&|e| e.kind == TagKind::Table) {
                " "
            } else {
                context.block_separator()
            };
            chain.push(cell);
            let content = self.render_blocks_joined(&cell.children, context, chain, separator);
            chain.pop();
            content
        } else {
            self.recover(cell, context, chain, |_| true)
        };
        if let Some(previous) = scope {
            chain.restore_scope(previous);
        }
        content.trim().to_owned()
    }

    /// In the approved view, rows left without any content are dropped.
    fn drops_empty_row(&self, contents: &[String]) -> bool {
        !self.policy.include_colored && contents.iter().all(String::is_empty)
    }
}

/// Rows in document order, from sections and direct `tr` children.
fn table_rows(table: &Element) -> Vec<Row<'_>> {
    let mut rows = Vec::new();
    for child in table.child_elements() {
        match child.kind {
            TagKind::TableRow => rows.push((None, child)),
            TagKind::TableSection => rows.extend(
                child
                    .child_elements()
                    .filter(|row| row.kind == TagKind::TableRow)
                    .map(|row| (Some(child), row)),
            ),
            _ => {}
        }
    }
    rows
}

fn row_cells(row: &Element) -> Vec<&Element> {
    row.child_elements()
        .filter(|cell| matches!(cell.kind, TagKind::TableCell { .. }))
        .collect()
}

fn is_header_cell(cell: &Element) -> bool {
    cell.kind == TagKind::TableCell { header: true }
}

/// `rowspan="N" colspan="M"` for spans greater than one, space separated.
fn span_attributes(cell: &Element) -> String {
    SPAN_ATTRIBUTES
        .iter()
        .filter_map(|name| {
            let value = cell.attr(name)?.trim();
            let span = value.parse::<u32>().ok().filter(|span| *span > 1)?;
            Some(format!(r#"{name}="{span}""#))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep merged-cell structure visible inside a Markdown cell.
fn wrap_spanned_cell(cell: &Element, content: String) -> String {
    let attrs = span_attributes(cell);
    if attrs.is_empty() {
        content
    } else {
        format!("<td {attrs}>{content}</td>")
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{render_all, render_approved, render_with};
    use crate::policy::ExtractionPolicy;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_simple_table_with_header_row() {
        let markup = "<table><tbody><tr><th>Поле</th><th>Значение</th></tr><tr><td>test</td><td>value</td></tr></tbody></table>";
        assert_eq!(
            render_all(markup),
            "**Таблица:**\n| Поле | Значение |\n| --- | --- |\n| test | value |"
        );
    }

    #[test]
    fn test_thead_rows_come_first_and_colgroup_is_ignored() {
        let markup = "<table><colgroup><col /><col /></colgroup><thead><tr><th><p>Шаг №</p></th><th><p>Название</p></th></tr></thead>\
                      <tbody><tr><td>1.1</td><td><p><strong>название 1</strong></p></td></tr></tbody></table>";
        assert_eq!(
            render_all(markup),
            "**Таблица:**\n| Шаг № | Название |\n| --- | --- |\n| 1.1 | название 1 |"
        );
    }

    #[test]
    fn test_separator_only_after_first_header_row() {
        let markup = "<table><tr><th>A</th></tr><tr><th>B</th></tr><tr><td>c</td></tr></table>";
        assert_eq!(
            render_all(markup),
            "**Таблица:**\n| A |\n| --- |\n| B |\n| c |"
        );
    }

    #[test]
    fn test_spanned_cells_keep_attributes() {
        let markup = r#"<table><tr><td rowspan="2">Merged</td><td colspan="1">x</td></tr><tr><td>y</td></tr></table>"#;
        assert_eq!(
            render_all(markup),
            "**Таблица:**\n| <td rowspan=\"2\">Merged</td> | x |\n| y |"
        );
    }

    #[test]
    fn test_cell_blocks_are_separated_by_newlines() {
        let markup = "<table><tr><td><h2>Требования</h2><p>Описание</p><ul><li>a</li></ul></td></tr></table>";
        assert_eq!(
            render_all(markup),
            "**Таблица:**\n| ## Требования\nОписание\n- a |"
        );
    }

    #[test]
    fn test_nested_table_renders_as_literal_markup() {
        let markup = r#"<table><tr><td>Основная таблица</td><td><div class="table-wrap"><table><tr><th>№</th><th rowspan="2">Вл</th></tr><tr><td>1</td><td><ul><li>вл_строка2.2.1</li><li>вл_строка2.2.2</li></ul></td></tr></table></div></td></tr></table>"#;
        assert_eq!(
            render_all(markup),
            "**Таблица:**\n| Основная таблица | **Таблица:** <table><tr><th>№</th><th rowspan=\"2\">Вл</th></tr><tr><td>1</td><td>- вл_строка2.2.1\n- вл_строка2.2.2</td></tr></table> |"
        );
    }

    #[test]
    fn test_text_around_nested_table() {
        let markup = "<table><tr><td>Основная таблица:<table><tr><td><h2>Вложенный</h2><p>Текст</p></td></tr></table></td></tr></table>";
        assert_eq!(
            render_all(markup),
            "**Таблица:**\n| Основная таблица: **Таблица:** <table><tr><td>## Вложенный\nТекст</td></tr></table> |"
        );
    }

    #[test]
    fn test_nested_table_stays_on_the_row_line() {
        let markup = "<table><tr><td>Before<table><tr><td>x</td></tr></table>after</td><td>y</td></tr></table>";
        assert_eq!(
            render_all(markup),
            "**Таблица:**\n| Before **Таблица:** <table><tr><td>x</td></tr></table> after | y |"
        );
    }

    #[test]
    fn test_empty_rows_dropped_in_approved_view_only() {
        let markup = r#"<table><tr><th>H</th></tr><tr><td><span style="color: red;">draft</span></td></tr><tr><td>ok</td></tr></table>"#;
        assert_eq!(
            render_approved(markup),
            "**Таблица:**\n| H |\n| --- |\n| ok |"
        );
        assert_eq!(
            render_all(markup),
            "**Таблица:**\n| H |\n| --- |\n| draft |\n| ok |"
        );
    }

    #[test]
    fn test_colored_row_inherits_pending() {
        let markup = r#"<table><tr style="color: red;"><td>draft</td></tr><tr><td>ok</td></tr></table>"#;
        assert_eq!(render_approved(markup), "**Таблица:**\n| ok |");
    }

    #[test]
    fn test_table_after_text_in_block_container() {
        assert_eq!(
            render_all("<p>Intro</p><table><tr><td>x</td></tr></table>"),
            "Intro\n\n**Таблица:**\n| x |"
        );
    }

    #[test]
    fn test_disabled_table_format() {
        let policy = ExtractionPolicy::all().with_tables(false);
        assert_eq!(
            render_with("<table><tr><td>a</td><td>b</td></tr></table>", &policy),
            "ab"
        );
    }
}
