//! Index resolution: row and column selectors mapped onto one of four
//! result shapes.
//!
//! | rows            | columns        | result                 |
//! |-----------------|----------------|------------------------|
//! | `Single`        | `Single`       | [`Selection::Cell`]    |
//! | `Single`        | `List` / `All` | [`Selection::Row`]     |
//! | `Range` / `List` / `All` | `Single` | [`Selection::Values`] |
//! | `Range` / `List` / `All` | `List` / `All` | [`Selection::Table`] |
//!
//! The shape follows the selector variant, never the number of positions:
//! a one-element list still selects "multiple" rows.

#![allow(clippy::cast_sign_loss)]

use super::{Column, Row, Table};
use crate::error::{Result, TableError};
use indexmap::IndexMap;
use serde_json::Value;
use std::ops::{Range, RangeFull};

/// Start/stop/step row range with slice semantics.
///
/// Negative positions count from the end, out-of-range bounds are clamped
/// and a negative step walks backwards. Missing bounds default to the ends
/// appropriate for the step's direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    /// First position, inclusive.
    pub start: Option<isize>,
    /// Last position, exclusive.
    pub stop: Option<isize>,
    /// Distance between positions; never zero.
    pub step: isize,
}

impl RowRange {
    /// Creates a range.
    #[must_use]
    pub const fn new(start: Option<isize>, stop: Option<isize>, step: isize) -> Self {
        Self { start, stop, step }
    }

    /// Resolves the range against a table length.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if `step` is zero.
    pub fn resolve(&self, len: usize) -> Result<Vec<usize>> {
        if self.step == 0 {
            return Err(TableError::InvalidRange("step cannot be zero".to_string()));
        }
        let len = isize::try_from(len)
            .map_err(|_| TableError::InvalidRange(format!("length {len} exceeds isize")))?;
        let backwards = self.step < 0;
        let (lower, upper) = if backwards { (-1, len - 1) } else { (0, len) };
        let clamp = |bound: Option<isize>, default: isize| match bound {
            None => default,
            Some(b) if b < 0 => (b + len).max(lower),
            Some(b) => b.min(upper),
        };
        let (start, stop) = if backwards {
            (clamp(self.start, upper), clamp(self.stop, lower))
        } else {
            (clamp(self.start, lower), clamp(self.stop, upper))
        };

        let mut positions = Vec::new();
        let mut position = start;
        while (!backwards && position < stop) || (backwards && position > stop) {
            positions.push(position as usize);
            position += self.step;
        }
        Ok(positions)
    }
}

impl From<Range<usize>> for RowRange {
    fn from(range: Range<usize>) -> Self {
        let to_isize = |n: usize| isize::try_from(n).unwrap_or(isize::MAX);
        Self::new(Some(to_isize(range.start)), Some(to_isize(range.end)), 1)
    }
}

/// Which rows to select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowSelector {
    /// One row; yields cells or a row map.
    Single(usize),
    /// A range of rows.
    Range(RowRange),
    /// Explicit positions, in the given order.
    List(Vec<usize>),
    /// Every row.
    All,
}

impl From<usize> for RowSelector {
    fn from(row: usize) -> Self {
        Self::Single(row)
    }
}

impl From<RowRange> for RowSelector {
    fn from(range: RowRange) -> Self {
        Self::Range(range)
    }
}

impl From<Range<usize>> for RowSelector {
    fn from(range: Range<usize>) -> Self {
        Self::Range(range.into())
    }
}

impl From<RangeFull> for RowSelector {
    fn from(_: RangeFull) -> Self {
        Self::All
    }
}

impl From<Vec<usize>> for RowSelector {
    fn from(rows: Vec<usize>) -> Self {
        Self::List(rows)
    }
}

impl From<&[usize]> for RowSelector {
    fn from(rows: &[usize]) -> Self {
        Self::List(rows.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for RowSelector {
    fn from(rows: [usize; N]) -> Self {
        Self::List(rows.to_vec())
    }
}

/// Which columns to select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    /// One column; yields cells or a value list.
    Single(String),
    /// Explicit names, in the given order.
    List(Vec<String>),
    /// Every column.
    All,
}

impl From<&str> for ColumnSelector {
    fn from(name: &str) -> Self {
        Self::Single(name.to_string())
    }
}

impl From<String> for ColumnSelector {
    fn from(name: String) -> Self {
        Self::Single(name)
    }
}

impl From<RangeFull> for ColumnSelector {
    fn from(_: RangeFull) -> Self {
        Self::All
    }
}

impl From<Vec<String>> for ColumnSelector {
    fn from(names: Vec<String>) -> Self {
        Self::List(names)
    }
}

impl From<Vec<&str>> for ColumnSelector {
    fn from(names: Vec<&str>) -> Self {
        Self::List(names.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for ColumnSelector {
    fn from(names: &[&str]) -> Self {
        Self::List(names.iter().map(|n| (*n).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ColumnSelector {
    fn from(names: [&str; N]) -> Self {
        Self::List(names.iter().map(|n| (*n).to_string()).collect())
    }
}

/// Result of [`Table::select`].
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// One cell.
    Cell(Value),
    /// One row, restricted to the selected columns.
    Row(Row),
    /// One column's values over the selected rows.
    Values(Vec<Value>),
    /// A sub-table.
    Table(Table),
}

impl Selection {
    /// The cell, if this is a cell selection.
    #[must_use]
    pub fn into_cell(self) -> Option<Value> {
        match self {
            Self::Cell(value) => Some(value),
            _ => None,
        }
    }

    /// The row, if this is a row selection.
    #[must_use]
    pub fn into_row(self) -> Option<Row> {
        match self {
            Self::Row(row) => Some(row),
            _ => None,
        }
    }

    /// The values, if this is a column selection.
    #[must_use]
    pub fn into_values(self) -> Option<Vec<Value>> {
        match self {
            Self::Values(values) => Some(values),
            _ => None,
        }
    }

    /// The sub-table, if this is a table selection.
    #[must_use]
    pub fn into_table(self) -> Option<Table> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }
}

impl Table {
    /// Resolves a row selector and a column selector into one result shape.
    ///
    /// # Errors
    ///
    /// - `UnknownColumn` if a selected column is absent
    /// - `RowOutOfRange` if a selected row is out of range
    /// - `EmptySelection` for an empty row list, an empty range or an empty
    ///   column list
    /// - `InvalidRange` for a zero step
    /// - `ConstantColumn` when a constant column is selected as values
    pub fn select(
        &self,
        rows: impl Into<RowSelector>,
        columns: impl Into<ColumnSelector>,
    ) -> Result<Selection> {
        let columns = columns.into();
        let names = self.resolve_columns(&columns)?;
        match rows.into() {
            RowSelector::Single(row) => {
                if let ColumnSelector::Single(name) = &columns {
                    return self.get_cell(row, name).cloned().map(Selection::Cell);
                }
                self.check_row(row)?;
                let mut out = Row::with_capacity(names.len());
                for name in names {
                    out.insert(name.to_string(), self.get_cell(row, name)?.clone());
                }
                Ok(Selection::Row(out))
            }
            multiple => {
                let positions = self.resolve_rows(&multiple)?;
                if let ColumnSelector::Single(name) = &columns {
                    let column = self.per_row_column(name)?;
                    return Ok(Selection::Values(column.gather(&positions).into_values()));
                }
                Ok(Selection::Table(self.sub_table(&positions, &names)))
            }
        }
    }

    /// Selects rows across all columns.
    ///
    /// # Errors
    ///
    /// See [`Table::select`].
    pub fn select_rows(&self, rows: impl Into<RowSelector>) -> Result<Selection> {
        self.select(rows, ColumnSelector::All)
    }

    /// Selects columns across all rows.
    ///
    /// # Errors
    ///
    /// See [`Table::select`].
    pub fn select_columns(&self, columns: impl Into<ColumnSelector>) -> Result<Selection> {
        self.select(RowSelector::All, columns)
    }

    fn resolve_columns<'a>(&'a self, columns: &'a ColumnSelector) -> Result<Vec<&'a str>> {
        let names = match columns {
            ColumnSelector::Single(name) => vec![name.as_str()],
            ColumnSelector::List(names) => {
                if names.is_empty() {
                    return Err(TableError::EmptySelection("column list is empty".into()));
                }
                names.iter().map(String::as_str).collect()
            }
            ColumnSelector::All => self.column_names(),
        };
        if let Some(missing) = names.iter().find(|name| !self.contains_column(name)) {
            return Err(TableError::UnknownColumn((*missing).to_string()));
        }
        Ok(names)
    }

    fn resolve_rows(&self, rows: &RowSelector) -> Result<Vec<usize>> {
        let positions = match rows {
            RowSelector::Single(row) => vec![*row],
            RowSelector::All => return Ok((0..self.len).collect()),
            RowSelector::Range(range) => {
                let positions = range.resolve(self.len)?;
                if positions.is_empty() {
                    return Err(TableError::EmptySelection(format!(
                        "range {range:?} selects no rows of {}",
                        self.len
                    )));
                }
                positions
            }
            RowSelector::List(positions) => {
                if positions.is_empty() {
                    return Err(TableError::EmptySelection("row list is empty".into()));
                }
                positions.clone()
            }
        };
        if let Some(&row) = positions.iter().find(|&&row| row >= self.len) {
            return Err(TableError::RowOutOfRange { row, len: self.len });
        }
        Ok(positions)
    }

    /// Copies the given rows and columns into a new table.
    ///
    /// Encoded columns keep their full dictionaries.
    fn sub_table(&self, positions: &[usize], names: &[&str]) -> Table {
        let mut constants = IndexMap::new();
        let mut columns: IndexMap<String, Column> = IndexMap::new();
        for &name in names {
            if let Some(value) = self.constants.get(name) {
                constants.insert(name.to_string(), value.clone());
            } else if let Some(column) = self.columns.get(name) {
                columns.insert(name.to_string(), column.gather(positions));
            }
        }
        let schema = self
            .schema
            .iter()
            .filter(|(name, _)| names.contains(&name.as_str()))
            .map(|(name, tag)| (name.clone(), tag.clone()))
            .collect();
        Table {
            constants,
            columns,
            schema,
            meta: self.meta.clone(),
            len: positions.len(),
        }
    }
}
