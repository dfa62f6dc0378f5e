//! Renderer module
//!
//! Renders ResultSet to different output formats: jsonl, json, md, table

use colored::Colorize;
use std::io::Write;

use crate::core::model::{Kind, ResultItem, ResultSet};
use crate::core::util::short_id;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Json,
    Markdown,
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" => Ok(OutputFormat::Jsonl),
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            "table" => Ok(OutputFormat::Table),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl RenderConfig {
    #[cfg(test)]
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            pretty: false,
        }
    }

    pub fn with_pretty(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }
}

/// Renderer for result sets
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    #[cfg(test)]
    pub fn new(format: OutputFormat) -> Self {
        Self {
            config: RenderConfig::new(format),
        }
    }

    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render a result set to a string
    pub fn render(&self, result_set: &ResultSet) -> String {
        match self.config.format {
            OutputFormat::Jsonl => self.render_jsonl(result_set),
            OutputFormat::Json => self.render_json(result_set),
            OutputFormat::Markdown => self.render_markdown(result_set),
            OutputFormat::Table => self.render_table(result_set),
        }
    }

    /// Render to a writer, newline-terminated unless empty
    pub fn render_to<W: Write>(&self, result_set: &ResultSet, mut writer: W) -> std::io::Result<()> {
        let output = self.render(result_set);
        if output.is_empty() {
            return Ok(());
        }
        writer.write_all(output.as_bytes())?;
        if !output.ends_with('\n') {
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }

    /// Render as JSON Lines (one JSON object per line)
    fn render_jsonl(&self, result_set: &ResultSet) -> String {
        result_set
            .items
            .iter()
            .filter_map(|item| {
                if self.config.pretty {
                    serde_json::to_string_pretty(item).ok()
                } else {
                    serde_json::to_string(item).ok()
                }
            })
            .collect::<Vec<_>>()
            .join(if self.config.pretty { "\n\n" } else { "\n" })
    }

    /// Render as a single JSON array
    fn render_json(&self, result_set: &ResultSet) -> String {
        if self.config.pretty {
            serde_json::to_string_pretty(&result_set.items).unwrap_or_else(|_| "[]".to_string())
        } else {
            serde_json::to_string(&result_set.items).unwrap_or_else(|_| "[]".to_string())
        }
    }

    /// Render as Markdown, one section per kind
    fn render_markdown(&self, result_set: &ResultSet) -> String {
        let mut output = String::new();

        let sections = [
            (Kind::Error, "Errors"),
            (Kind::Item, "Items"),
            (Kind::Resolved, "Resolved"),
            (Kind::Orphan, "Orphans"),
            (Kind::Status, "Status"),
        ];

        for (kind, title) in sections {
            let items: Vec<_> = result_set.items.iter().filter(|i| i.kind == kind).collect();
            if items.is_empty() {
                continue;
            }
            output.push_str(&format!("## {}\n\n", title));
            for item in items {
                render_item_md(&mut output, item);
            }
            output.push('\n');
        }

        output
    }

    /// Render as an aligned table for terminals
    fn render_table(&self, result_set: &ResultSet) -> String {
        let headers = ["ID", "TYPE", "LAST CHECKED", "TARGET"];
        let rows: Vec<[String; 4]> = result_set.items.iter().map(table_row).collect();
        if rows.is_empty() {
            return String::new();
        }

        let mut widths = headers.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut output = String::new();
        let header = pad_row(&headers.map(String::from), &widths);
        output.push_str(&header.bold().to_string());
        output.push('\n');

        for (item, row) in result_set.items.iter().zip(rows.iter()) {
            let line = pad_row(row, &widths);
            let line = if item.kind == Kind::Error || !item.errors.is_empty() {
                line.red().to_string()
            } else {
                line
            };
            output.push_str(&line);
            output.push('\n');
        }
        output
    }
}

fn render_item_md(output: &mut String, item: &ResultItem) {
    output.push('-');
    if let Some(id) = &item.id {
        output.push_str(&format!(" `{}`", id));
    }
    if let Some(kind) = item.resource_type {
        output.push_str(&format!(" **{}**", kind));
    }
    if let Some(signature) = &item.signature {
        output.push_str(&format!(" {}", signature));
    }
    if let Some(message) = &item.message {
        output.push_str(&format!(" {}", message));
    }
    output.push('\n');

    if let Some(checked) = &item.last_checked {
        output.push_str(&format!("  - last checked: {}\n", checked));
    }
    if let Some(path) = &item.path {
        output.push_str(&format!("  - path: `{}`\n", path));
    }
    if let Some(data) = &item.data {
        if let Ok(json) = serde_json::to_string_pretty(data) {
            output.push_str("\n```json\n");
            output.push_str(&json);
            output.push_str("\n```\n");
        }
    }
    for error in &item.errors {
        output.push_str(&format!("  - **{}**: {}\n", error.code, error.message));
    }
}

fn table_row(item: &ResultItem) -> [String; 4] {
    let id = item.id.as_deref().map(short_id).unwrap_or("-").to_string();
    let kind = item
        .resource_type
        .map(|k| k.to_string())
        .unwrap_or_else(|| "-".to_string());
    let checked = item.last_checked.clone().unwrap_or_else(|| "-".to_string());

    let mut target = item
        .signature
        .clone()
        .or_else(|| item.message.clone())
        .or_else(|| item.path.clone())
        .unwrap_or_default();
    for error in &item.errors {
        if !target.is_empty() {
            target.push_str("; ");
        }
        target.push_str(&format!("{}: {}", error.code, error.message));
    }

    [id, kind, checked, target]
}

fn pad_row(cells: &[String; 4], widths: &[usize; 4]) -> String {
    let mut line = String::new();
    for (i, (cell, width)) in cells.iter().zip(widths.iter()).enumerate() {
        if i + 1 == cells.len() {
            line.push_str(cell);
        } else {
            line.push_str(&format!("{:<width$}  ", cell, width = width));
        }
    }
    line.trim_end().to_string()
}
