// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use std::borrow::Cow;
use std::collections::HashSet;

use comfy_table::{Table, presets::ASCII_BORDERS_ONLY_CONDENSED};

use super::TableView;

/// Maximum width for JSON and free-text columns
const MAX_WIDE_COLUMN_WIDTH: usize = 60;

/// Columns that get width limits in table mode
const WIDE_COLUMNS: &[&str] = &[
    "spec",
    "status",
    "labels",
    "annotations",
    "message",
    "value",
];

/// Truncate a string to max_len chars, adding "..." if truncated
fn truncate_value(s: &str, max_len: usize) -> Cow<'_, str> {
    if s.chars().count() <= max_len {
        Cow::Borrowed(s)
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        Cow::Owned(format!("{}...", truncated))
    }
}

pub struct TableFormatter;

impl TableFormatter {
    pub fn format(view: &TableView, no_headers: bool) -> String {
        let mut output = if view.rows.is_empty() {
            "(0 rows)".to_string()
        } else {
            Self::format_rows(view, no_headers)
        };

        if let Some(trailer) = view.trailer.as_deref().filter(|t| !t.is_empty()) {
            output.push_str("\n\n");
            output.push_str(trailer);
        }
        output
    }

    fn format_rows(view: &TableView, no_headers: bool) -> String {
        let mut table = Table::new();
        table.load_preset(ASCII_BORDERS_ONLY_CONDENSED);

        let truncate_cols: HashSet<usize> = view
            .columns
            .iter()
            .enumerate()
            .filter(|(_, col)| WIDE_COLUMNS.contains(&col.as_str()))
            .map(|(idx, _)| idx)
            .collect();

        if !no_headers {
            table.set_header(&view.columns);
        }

        for row in &view.rows {
            let cells: Vec<Cow<'_, str>> = row
                .iter()
                .enumerate()
                .map(|(idx, val)| {
                    if truncate_cols.contains(&idx) {
                        truncate_value(val, MAX_WIDE_COLUMN_WIDTH)
                    } else {
                        Cow::Borrowed(val.as_str())
                    }
                })
                .collect();
            table.add_row(cells);
        }

        format!("{}\n({} rows)", table, view.rows.len())
    }
}
