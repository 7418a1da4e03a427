//! Output formatting for CLI display
//!
//! This module turns records, tables and trees into printable lines. In quiet
//! mode only the plain values are produced so output can be piped.

use crate::data::{DataContainer, TableData, TreeNode};
use crate::model::Record;
use colored::Colorize;

/// Format a section heading
#[must_use]
pub fn heading(text: &str, quiet: bool) -> String {
    if quiet {
        text.to_string()
    } else {
        text.bold().to_string()
    }
}

/// Format a record with its tags for display
#[must_use]
pub fn record_line(record: &Record, quiet: bool) -> String {
    let names: Vec<String> = record.tags().into_iter().map(|tag| tag.name).collect();
    if quiet || names.is_empty() {
        record.display().to_string()
    } else {
        format!("{} [{}]", record.display(), names.join(", ").cyan())
    }
}

/// Format a filter factory as `key  name: description`
#[must_use]
pub fn factory_line(key: &str, name: &str, description: &str, quiet: bool) -> String {
    if quiet {
        key.to_string()
    } else if description.is_empty() {
        format!("  {:<10} {name}", key.green())
    } else {
        format!("  {:<10} {name}: {}", key.green(), description.dimmed())
    }
}

/// Format a table as aligned columns, header first
#[must_use]
pub fn table_lines(table: &TableData, quiet: bool) -> Vec<String> {
    let columns = table.columns();
    if columns.is_empty() {
        return table
            .records()
            .iter()
            .map(|record| record_line(record, quiet))
            .collect();
    }

    let rows: Vec<Vec<&str>> = table.records().iter().map(|r| table.row(r)).collect();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let join = |cells: Vec<String>| cells.join("  ").trim_end().to_string();
    let mut lines = Vec::with_capacity(rows.len() + 1);
    if !quiet {
        let header = columns
            .iter()
            .zip(&widths)
            .map(|(column, width)| format!("{column:<width$}"))
            .collect();
        lines.push(join(header).bold().to_string());
    }
    for row in rows {
        let cells = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        lines.push(join(cells));
    }
    lines
}

/// Format a tree as an indented outline, root included
#[must_use]
pub fn tree_lines(root: &TreeNode, quiet: bool) -> Vec<String> {
    let mut lines = Vec::new();
    root.walk(&mut |node: &TreeNode, depth: usize| {
        lines.push(format!("{}{}", "  ".repeat(depth), record_line(node.record(), quiet)));
    });
    lines
}

/// Format any container
#[must_use]
pub fn container_lines(container: &DataContainer, quiet: bool) -> Vec<String> {
    match container {
        DataContainer::List(list) => list
            .records()
            .iter()
            .map(|record| record_line(record, quiet))
            .collect(),
        DataContainer::Table(table) => table_lines(table, quiet),
        DataContainer::Tree(tree) => tree_lines(tree.root(), quiet),
    }
}
