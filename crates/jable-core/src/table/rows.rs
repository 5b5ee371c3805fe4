//! Row and column iteration.

use super::{Column, Row, Table};
use crate::error::{Result, TableError};
use indexmap::IndexMap;
use serde_json::Value;
use std::iter::FusedIterator;

/// Iterator over materialized rows in position order.
///
/// Borrows the table, so the row count cannot change mid-iteration. Call
/// [`Table::rows`] again to traverse from the start.
#[derive(Debug, Clone)]
pub struct Rows<'a> {
    table: &'a Table,
    front: usize,
    back: usize,
}

impl Iterator for Rows<'_> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        if self.front >= self.back {
            return None;
        }
        let row = self.table.row_at(self.front);
        self.front += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Row> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl DoubleEndedIterator for Rows<'_> {
    fn next_back(&mut self) -> Option<Row> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.table.row_at(self.back))
    }
}

impl ExactSizeIterator for Rows<'_> {}
impl FusedIterator for Rows<'_> {}

impl<'a> IntoIterator for &'a Table {
    type Item = Row;
    type IntoIter = Rows<'a>;

    fn into_iter(self) -> Rows<'a> {
        self.rows()
    }
}

/// Decoded values of one column, `len()` items long.
///
/// A constant column yields its value once per row.
#[derive(Debug, Clone)]
pub enum ColumnValues<'a> {
    /// Repeats a constant.
    Constant {
        /// The shared value.
        value: &'a Value,
        /// Items left.
        remaining: usize,
    },
    /// Walks a raw or encoded column.
    PerRow {
        /// Source column.
        column: &'a Column,
        /// Next position from the front.
        front: usize,
        /// One past the next position from the back.
        back: usize,
    },
}

impl<'a> Iterator for ColumnValues<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        match self {
            Self::Constant { value, remaining } => {
                if *remaining == 0 {
                    return None;
                }
                *remaining -= 1;
                Some(*value)
            }
            Self::PerRow {
                column,
                front,
                back,
            } => {
                if *front >= *back {
                    return None;
                }
                let column: &'a Column = *column;
                let value = column.get(*front);
                *front += 1;
                value
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self {
            Self::Constant { remaining, .. } => *remaining,
            Self::PerRow { front, back, .. } => back - front,
        };
        (remaining, Some(remaining))
    }
}

impl<'a> DoubleEndedIterator for ColumnValues<'a> {
    fn next_back(&mut self) -> Option<&'a Value> {
        match self {
            Self::Constant { .. } => self.next(),
            Self::PerRow {
                column,
                front,
                back,
            } => {
                if *front >= *back {
                    return None;
                }
                *back -= 1;
                let column: &'a Column = *column;
                column.get(*back)
            }
        }
    }
}

impl ExactSizeIterator for ColumnValues<'_> {}
impl FusedIterator for ColumnValues<'_> {}

/// Everything an external columnar library needs to build its own frame.
#[derive(Debug, Clone)]
pub struct FrameSource<'a> {
    /// Row count.
    pub len: usize,
    /// One value sequence per column, in [`Table::column_names`] order.
    pub columns: Vec<(&'a str, ColumnValues<'a>)>,
    /// Advisory type tags.
    pub schema: &'a IndexMap<String, String>,
}

impl Table {
    /// Fresh iterator over all rows, from position 0.
    #[must_use]
    pub fn rows(&self) -> Rows<'_> {
        Rows {
            table: self,
            front: 0,
            back: self.len,
        }
    }

    /// Decoded values of any column, `len()` items long.
    ///
    /// # Errors
    ///
    /// Returns `UnknownColumn` if the column is absent.
    pub fn column_values(&self, name: &str) -> Result<ColumnValues<'_>> {
        if let Some(value) = self.constants.get(name) {
            return Ok(ColumnValues::Constant {
                value,
                remaining: self.len,
            });
        }
        let column = self
            .columns
            .get(name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))?;
        Ok(ColumnValues::PerRow {
            column,
            front: 0,
            back: self.len,
        })
    }

    /// Per-column value sequences plus schema, for handing the table to an
    /// external analytics library.
    #[must_use]
    pub fn frame_source(&self) -> FrameSource<'_> {
        let constants = self.constants.iter().map(|(name, value)| {
            (
                name.as_str(),
                ColumnValues::Constant {
                    value,
                    remaining: self.len,
                },
            )
        });
        let per_row = self.columns.iter().map(|(name, column)| {
            (
                name.as_str(),
                ColumnValues::PerRow {
                    column,
                    front: 0,
                    back: self.len,
                },
            )
        });
        FrameSource {
            len: self.len,
            columns: constants.chain(per_row).collect(),
            schema: &self.schema,
        }
    }
}
