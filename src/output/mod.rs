// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

mod json;
mod table;
mod views;
mod yaml;

pub use json::JsonFormatter;
pub use table::TableFormatter;
pub use views::Tabular;
pub use yaml::YamlFormatter;

use anyhow::Result;
use serde::Serialize;

use crate::cli::OutputFormat;

/// Rows and columns for table rendering, with optional free text after the table
#[derive(Debug, Clone, Default)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub trailer: Option<String>,
}

impl TableView {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }
}

/// Render an operation result in the requested format
pub fn render<T: Serialize + Tabular>(
    value: &T,
    format: &OutputFormat,
    no_headers: bool,
) -> Result<String> {
    match format {
        OutputFormat::Json => JsonFormatter::format(value),
        OutputFormat::Yaml => YamlFormatter::format(value),
        OutputFormat::Table => Ok(TableFormatter::format(&value.to_table(), no_headers)),
    }
}
