//! Delimited text rendering of report rows.
//!
//! Output is comma-separated with LF line endings. Text fields are always
//! quoted with embedded quotes doubled; counts and sizes are written bare.
//! An unmeasured size renders as an empty field.

use std::fmt::Write as FmtWrite;

use serde::{Deserialize, Serialize};

use super::metric::format_megabytes;

/// A single cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field<'a> {
    Text(&'a str),
    Count(u64),
    /// Byte count rendered in megabytes; `None` renders empty.
    Megabytes(Option<u64>),
}

impl Field<'_> {
    fn write_to(&self, out: &mut String) {
        match self {
            Field::Text(text) => push_quoted(out, text),
            Field::Count(n) => {
                let _ = write!(out, "{n}");
            }
            Field::Megabytes(Some(bytes)) => out.push_str(&format_megabytes(*bytes)),
            Field::Megabytes(None) => {}
        }
    }
}

/// Appends `text` as a quoted field, doubling embedded quotes.
pub fn push_quoted(out: &mut String, text: &str) {
    out.push('"');
    for ch in text.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
}

/// Column definition: literal header text and a cell extractor.
pub struct Column<R> {
    pub header: &'static str,
    pub value: fn(&R) -> Field<'_>,
}

impl<R> Column<R> {
    pub const fn new(header: &'static str, value: fn(&R) -> Field<'_>) -> Self {
        Self { header, value }
    }
}

impl<R> Clone for Column<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Column<R> {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Rows plus the columns used to render them.
pub struct Table<R> {
    title: Option<String>,
    columns: Vec<Column<R>>,
    rows: Vec<R>,
}

impl<R> Table<R> {
    pub fn new(columns: Vec<Column<R>>, rows: Vec<R>) -> Self {
        Self {
            title: None,
            columns,
            rows,
        }
    }

    /// Adds a free-text line above the header.
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    /// Stable sort of the rows; equal keys keep their current order.
    pub fn sorted_by<K, F>(mut self, key: F, order: SortOrder) -> Self
    where
        K: Ord,
        F: Fn(&R) -> K,
    {
        self.rows.sort_by(|a, b| {
            let ordering = key(a).cmp(&key(b));
            match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });
        self
    }

    /// Drops rows failing `keep`, preserving order.
    pub fn retain<F>(mut self, keep: F) -> Self
    where
        F: FnMut(&R) -> bool,
    {
        self.rows.retain(keep);
        self
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        if let Some(title) = &self.title {
            out.push_str(title);
            out.push('\n');
        }

        let header: Vec<&str> = self.columns.iter().map(|c| c.header).collect();
        out.push_str(&header.join(","));
        out.push('\n');

        for row in &self.rows {
            for (i, column) in self.columns.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                (column.value)(row).write_to(&mut out);
            }
            out.push('\n');
        }

        out
    }
}

/// Several rendered tables in one text, separated by a single blank line.
#[derive(Debug, Default, Clone)]
pub struct Document {
    sections: Vec<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, section: String) {
        self.sections.push(section);
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(section);
            if !section.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }
}
