//! Text and LaTeX rendering of tables.
//!
//! Two renderers share one column selection and row cap:
//!
//! - [`render_text`] lines columns up at fixed widths. Each cell is
//!   right-aligned and, when too long, cut to its rightmost characters.
//! - [`render_latex`] writes a `tabular` environment body, without the
//!   surrounding `table` or centering.
//!
//! `Display` for [`Table`] draws a bordered grid of the first
//! [`DISPLAY_ROWS`] rows.

use crate::error::{Result, TableError};
use crate::table::Table;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

/// Rows shown by `Display` before the remainder is summarized.
pub const DISPLAY_ROWS: usize = 20;

/// Width rule for one column of the text layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColumnWidth {
    /// The column name's length.
    #[default]
    Header,
    /// A fixed number of characters.
    Fixed(usize),
    /// The longest rendered value in the column.
    Longest,
}

/// Width rules for the selected columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Widths {
    /// The same rule for every column.
    Uniform(ColumnWidth),
    /// One rule per selected column, in selection order.
    PerColumn(Vec<ColumnWidth>),
    /// Rules by column name. Unnamed columns use [`ColumnWidth::Header`].
    ByName(IndexMap<String, ColumnWidth>),
}

impl Default for Widths {
    fn default() -> Self {
        Self::Uniform(ColumnWidth::Header)
    }
}

/// Options for [`render_text`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextOptions {
    /// Columns to print, in order. Empty prints every column.
    pub columns: Vec<String>,
    /// Column width rules.
    pub widths: Widths,
    /// Row cap. `None` prints every row.
    pub max_rows: Option<usize>,
}

/// Horizontal alignment of a LaTeX column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    /// `l`
    Left,
    /// `c`
    #[default]
    Center,
    /// `r`
    Right,
}

impl Alignment {
    fn spec(self) -> char {
        match self {
            Self::Left => 'l',
            Self::Center => 'c',
            Self::Right => 'r',
        }
    }
}

/// Options for [`render_latex`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatexOptions {
    /// Columns to print, in order. Empty prints every column.
    pub columns: Vec<String>,
    /// Alignment by column name. Unnamed columns are centered.
    pub alignments: IndexMap<String, Alignment>,
    /// Row cap. `None` prints every row.
    pub max_rows: Option<usize>,
}

/// Renders the table as aligned text: a header line, a dashed divider and
/// one line per row, columns separated by one space.
///
/// # Errors
///
/// Returns `UnknownColumn` for a selected column the table lacks, and
/// `LengthMismatch` if [`Widths::PerColumn`] does not give one rule per
/// selected column.
pub fn render_text(table: &Table, options: &TextOptions) -> Result<String> {
    let columns = selected_columns(table, &options.columns)?;
    let widths = resolve_widths(table, &columns, &options.widths)?;
    let rows = row_count(table, options.max_rows);

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(name, &width)| fit(name, width))
        .collect();
    let divider: Vec<String> = widths.iter().map(|&width| "-".repeat(width)).collect();

    let mut lines = vec![header.join(" "), divider.join(" ")];
    for row in 0..rows {
        let mut cells = Vec::with_capacity(columns.len());
        for (name, &width) in columns.iter().zip(&widths) {
            cells.push(fit(&cell_text(table.get_cell(row, name)?), width));
        }
        lines.push(cells.join(" "));
    }
    Ok(lines.join("\n") + "\n")
}

/// Text layout for a statistics table: every column as wide as its longest
/// value.
///
/// # Errors
///
/// See [`render_text`].
pub fn render_stats_text(table: &Table, max_rows: Option<usize>) -> Result<String> {
    render_text(
        table,
        &TextOptions {
            columns: Vec::new(),
            widths: Widths::Uniform(ColumnWidth::Longest),
            max_rows,
        },
    )
}

/// Renders a LaTeX `tabular` environment.
///
/// Underscores in names and values become spaces. Every row but the last
/// ends with `\\`.
///
/// # Errors
///
/// Returns `UnknownColumn` for a selected column or alignment key the table
/// lacks.
pub fn render_latex(table: &Table, options: &LatexOptions) -> Result<String> {
    let columns = selected_columns(table, &options.columns)?;
    if let Some(name) = options
        .alignments
        .keys()
        .find(|name| !table.contains_column(name))
    {
        return Err(TableError::UnknownColumn(name.clone()));
    }
    let rows = row_count(table, options.max_rows);

    let column_spec: Vec<String> = columns
        .iter()
        .map(|name| {
            let alignment = options.alignments.get(*name).copied().unwrap_or_default();
            alignment.spec().to_string()
        })
        .collect();
    let header: Vec<String> = columns.iter().map(|name| latex_text(name)).collect();

    let mut lines = vec![
        format!("\\begin{{tabular}}{{ {} }}", column_spec.join(" ")),
        format!("  {} \\\\", header.join(" & ")),
        "  \\hline".to_string(),
    ];
    for row in 0..rows {
        let mut cells = Vec::with_capacity(columns.len());
        for name in &columns {
            cells.push(latex_text(&cell_text(table.get_cell(row, name)?)));
        }
        let mut line = format!("  {}", cells.join(" & "));
        if row + 1 < rows {
            line.push_str(" \\\\");
        }
        lines.push(line);
    }
    lines.push("\\end{tabular}".to_string());
    Ok(lines.join("\n") + "\n")
}

impl Table {
    /// Aligned text rendering. See [`render_text`].
    ///
    /// # Errors
    ///
    /// See [`render_text`].
    pub fn to_text(&self, options: &TextOptions) -> Result<String> {
        render_text(self, options)
    }

    /// LaTeX `tabular` rendering. See [`render_latex`].
    ///
    /// # Errors
    ///
    /// See [`render_latex`].
    pub fn to_latex(&self, options: &LatexOptions) -> Result<String> {
        render_latex(self, options)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.column_names();
        let mut grid = comfy_table::Table::new();
        grid.load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        grid.set_header(names.iter().map(Cell::new).collect::<Vec<Cell>>());

        for row in self.rows().take(DISPLAY_ROWS) {
            let cells: Vec<Cell> = names
                .iter()
                .map(|name| Cell::new(row.get(*name).map(cell_text).unwrap_or_default()))
                .collect();
            grid.add_row(cells);
        }
        write!(f, "{grid}")?;

        let hidden = self.len().saturating_sub(DISPLAY_ROWS);
        if hidden > 0 {
            write!(f, "\n... {hidden} more rows")?;
        }
        Ok(())
    }
}

/// Cell rendering: strings without quotes, everything else as JSON.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn selected_columns<'t>(table: &'t Table, requested: &'t [String]) -> Result<Vec<&'t str>> {
    if requested.is_empty() {
        return Ok(table.column_names());
    }
    requested
        .iter()
        .map(|name| {
            if table.contains_column(name) {
                Ok(name.as_str())
            } else {
                Err(TableError::UnknownColumn(name.clone()))
            }
        })
        .collect()
}

fn resolve_widths(table: &Table, columns: &[&str], widths: &Widths) -> Result<Vec<usize>> {
    match widths {
        Widths::Uniform(rule) => columns
            .iter()
            .map(|name| column_width(table, name, *rule))
            .collect(),
        Widths::PerColumn(rules) => {
            if rules.len() != columns.len() {
                return Err(TableError::LengthMismatch {
                    column: "widths".to_string(),
                    expected: columns.len(),
                    actual: rules.len(),
                });
            }
            columns
                .iter()
                .zip(rules)
                .map(|(name, rule)| column_width(table, name, *rule))
                .collect()
        }
        Widths::ByName(rules) => columns
            .iter()
            .map(|name| column_width(table, name, rules.get(*name).copied().unwrap_or_default()))
            .collect(),
    }
}

fn column_width(table: &Table, name: &str, rule: ColumnWidth) -> Result<usize> {
    Ok(match rule {
        ColumnWidth::Header => name.chars().count(),
        ColumnWidth::Fixed(width) => width,
        ColumnWidth::Longest => {
            if let Some(value) = table.constant(name) {
                cell_text(value).chars().count()
            } else {
                table
                    .column_values(name)?
                    .map(|value| cell_text(value).chars().count())
                    .max()
                    .unwrap_or_else(|| name.chars().count())
            }
        }
    })
}

fn row_count(table: &Table, max_rows: Option<usize>) -> usize {
    max_rows.map_or(table.len(), |cap| cap.min(table.len()))
}

/// Right-aligns `text` in `width` characters, keeping the rightmost ones.
fn fit(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.chars().skip(len - width).collect()
    } else {
        format!("{text:>width$}")
    }
}

fn latex_text(text: &str) -> String {
    text.replace('_', " ")
}
