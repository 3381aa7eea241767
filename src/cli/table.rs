//! Table output shared by the query commands
//!
//! Every command prints rows keyed by an entity reference followed by a few
//! text columns. The formatter renders them as an aligned terminal table,
//! CSV, markdown, JSON, YAML or bare ids.

use console::style;
use serde_json::{Map, Value};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{escape_csv, truncate_str};
use crate::cli::OutputFormat;
use crate::core::identity::EntityRef;

/// Widest a text column may grow in terminal output
const MAX_COLUMN_WIDTH: usize = 48;

/// One output row: an entity plus its column values
#[derive(Debug, Clone)]
pub struct TableRow {
    pub entity: EntityRef,
    pub cells: Vec<String>,
}

impl TableRow {
    pub fn new(entity: EntityRef) -> Self {
        Self {
            entity,
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, value: impl Into<String>) -> Self {
        self.cells.push(value.into());
        self
    }
}

/// Renders rows under a fixed set of column headers
pub struct TableFormatter<'a> {
    headers: &'a [&'static str],
    noun: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    /// `headers` name the columns after the leading KIND and ID columns
    pub fn new(headers: &'a [&'static str], noun: &'static str) -> Self {
        Self {
            headers,
            noun,
            show_summary: true,
        }
    }

    /// Skip the trailing "N found" line
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.show_summary = !quiet;
        self
    }

    /// Render `rows` as a string
    pub fn render(&self, rows: &[TableRow], format: OutputFormat) -> String {
        match format {
            OutputFormat::Csv => self.render_csv(rows),
            OutputFormat::Md => self.render_md(rows),
            OutputFormat::Json => {
                serde_json::to_string_pretty(&self.records(rows)).unwrap_or_default()
            }
            OutputFormat::Yaml => serde_yml::to_string(&self.records(rows)).unwrap_or_default(),
            OutputFormat::Id => rows
                .iter()
                .map(|r| format!("{}\n", r.entity))
                .collect(),
            OutputFormat::Tsv | OutputFormat::Auto => self.render_tsv(rows),
        }
    }

    /// Print `rows` to stdout
    pub fn output(&self, rows: &[TableRow], format: OutputFormat) {
        print!("{}", self.render(rows, format));
    }

    fn keys(&self) -> impl Iterator<Item = String> + '_ {
        self.headers.iter().map(|h| h.to_lowercase().replace(' ', "_"))
    }

    fn records(&self, rows: &[TableRow]) -> Vec<Value> {
        rows.iter()
            .map(|row| {
                let mut record = Map::new();
                record.insert("kind".into(), Value::from(row.entity.kind().as_str()));
                record.insert("id".into(), Value::from(row.entity.raw_id()));
                for (key, cell) in self.keys().zip(&row.cells) {
                    record.insert(key, Value::from(cell.as_str()));
                }
                Value::Object(record)
            })
            .collect()
    }

    fn render_csv(&self, rows: &[TableRow]) -> String {
        let mut out = String::from("kind,id");
        for key in self.keys() {
            out.push(',');
            out.push_str(&key);
        }
        out.push('\n');
        for row in rows {
            out.push_str(&format!("{},{}", row.entity.kind(), row.entity.raw_id()));
            for cell in &row.cells {
                out.push(',');
                out.push_str(&escape_csv(cell));
            }
            out.push('\n');
        }
        out
    }

    fn render_md(&self, rows: &[TableRow]) -> String {
        let mut builder = Builder::default();
        let mut header = vec!["Kind".to_string(), "Id".to_string()];
        header.extend(self.headers.iter().map(|h| h.to_string()));
        builder.push_record(header);
        for row in rows {
            let mut record = vec![row.entity.kind().to_string(), row.entity.raw_id().to_string()];
            record.extend(row.cells.iter().cloned());
            builder.push_record(record);
        }
        format!("{}\n", builder.build().with(Style::markdown()))
    }

    fn render_tsv(&self, rows: &[TableRow]) -> String {
        let mut widths = vec![
            rows.iter()
                .map(|r| r.entity.kind().as_str().len())
                .max()
                .unwrap_or(0)
                .max(4),
            rows.iter()
                .map(|r| r.entity.raw_id().to_string().len())
                .max()
                .unwrap_or(0)
                .max(2),
        ];
        for (i, header) in self.headers.iter().enumerate() {
            let content = rows
                .iter()
                .filter_map(|r| r.cells.get(i))
                .map(|c| c.chars().count())
                .max()
                .unwrap_or(0);
            widths.push(content.max(header.len()).min(MAX_COLUMN_WIDTH));
        }

        let mut out = String::new();
        let mut header = vec![
            format!("{:<w$}", style("KIND").bold(), w = widths[0]),
            format!("{:<w$}", style("ID").bold(), w = widths[1]),
        ];
        for (i, h) in self.headers.iter().enumerate() {
            header.push(format!("{:<w$}", style(h.to_uppercase()).bold(), w = widths[i + 2]));
        }
        out.push_str(header.join(" ").trim_end());
        out.push('\n');
        let total: usize = widths.iter().sum::<usize>() + widths.len() - 1;
        out.push_str(&"-".repeat(total));
        out.push('\n');

        for row in rows {
            let mut parts = vec![
                format!("{:<w$}", row.entity.kind().as_str(), w = widths[0]),
                format!("{:<w$}", style(row.entity.raw_id()).cyan(), w = widths[1]),
            ];
            for (i, cell) in row.cells.iter().enumerate() {
                let w = widths.get(i + 2).copied().unwrap_or(MAX_COLUMN_WIDTH);
                parts.push(format!("{:<w$}", truncate_str(cell, w), w = w));
            }
            out.push_str(parts.join(" ").trim_end());
            out.push('\n');
        }

        if self.show_summary {
            out.push('\n');
            out.push_str(&format!("{} {}(s) found.\n", style(rows.len()).cyan(), self.noun));
        }
        out
    }
}
