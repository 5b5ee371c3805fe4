//! In-place mutations.
//!
//! Multi-key and multi-row operations validate every argument before the
//! first write, so a failing call leaves the table unchanged.

use super::{Column, Row, Table};
use crate::error::{Result, TableError};
use serde_json::Value;
use tracing::{debug, trace};

impl Table {
    /// Sets one cell.
    ///
    /// On a constant column this rewrites the value for every row. On a
    /// per-row column, `row == len()` appends a row whose other per-row cells
    /// are null.
    ///
    /// # Errors
    ///
    /// Returns `UnknownColumn` if the column is absent and `RowOutOfRange` for
    /// any other out-of-range row, including `row == len()` on a constant
    /// column.
    pub fn set_cell(&mut self, row: usize, column: &str, value: Value) -> Result<()> {
        if let Some(constant) = self.constants.get_mut(column) {
            if row >= self.len {
                return Err(TableError::RowOutOfRange { row, len: self.len });
            }
            *constant = value;
            return Ok(());
        }
        if !self.columns.contains_key(column) {
            return Err(TableError::UnknownColumn(column.to_string()));
        }
        if row > self.len {
            return Err(TableError::RowOutOfRange { row, len: self.len });
        }
        if row == self.len {
            self.push_null_row();
        }
        if let Some(data) = self.columns.get_mut(column) {
            data.set(row, &value);
        }
        trace!(row, column, "cell set");
        Ok(())
    }

    /// Sets several cells of one row.
    ///
    /// `row == len()` appends a row when `updates` names at least one
    /// per-row column; omitted per-row cells of the new row are null.
    ///
    /// # Errors
    ///
    /// Returns `UnknownColumn` for an absent column and `RowOutOfRange` for an
    /// out-of-range row. Nothing is written on error.
    pub fn set_row(&mut self, row: usize, updates: &Row) -> Result<()> {
        self.check_known(updates)?;
        let grows = row == self.len && updates.keys().any(|k| self.columns.contains_key(k));
        if row >= self.len && !grows {
            return Err(TableError::RowOutOfRange { row, len: self.len });
        }
        if grows {
            self.push_null_row();
        }
        self.write_row(row, updates);
        trace!(row, keys = updates.len(), "row set");
        Ok(())
    }

    /// Appends a row.
    ///
    /// In strict mode every key must name a column, every per-row column must
    /// be present, and a value for a constant column must equal that
    /// constant. Otherwise unknown keys are ignored, missing per-row cells
    /// become null and constant values are overwritten.
    ///
    /// # Errors
    ///
    /// Strict mode only: `UnknownColumn`, `MissingColumn` or
    /// `FixedValueConflict`. Nothing is written on error.
    pub fn append_row(&mut self, row: &Row, strict: bool) -> Result<()> {
        if strict {
            self.check_strict_row(row)?;
        }
        for (name, value) in row {
            if let Some(constant) = self.constants.get_mut(name) {
                *constant = value.clone();
            }
        }
        for (name, column) in &mut self.columns {
            column.push(row.get(name).unwrap_or(&Value::Null));
        }
        self.len += 1;
        trace!(len = self.len, strict, "row appended");
        Ok(())
    }

    /// Appends rows one by one and returns how many were appended.
    ///
    /// Each row is appended atomically; on error, rows before the failing
    /// one stay appended.
    ///
    /// # Errors
    ///
    /// See [`Table::append_row`].
    pub fn extend<I>(&mut self, rows: I, strict: bool) -> Result<usize>
    where
        I: IntoIterator<Item = Row>,
    {
        let mut appended = 0;
        for row in rows {
            self.append_row(&row, strict)?;
            appended += 1;
        }
        debug!(appended, len = self.len, "table extended");
        Ok(appended)
    }

    /// Inserts a row at `index`, shifting later rows down by one.
    ///
    /// Per-row cells not named by `row` are null.
    ///
    /// # Errors
    ///
    /// Returns `RowOutOfRange` if `index > len()` and `UnknownColumn` for an
    /// absent column. Nothing is written on error.
    pub fn insert_row(&mut self, index: usize, row: &Row) -> Result<()> {
        if index > self.len {
            return Err(TableError::RowOutOfRange {
                row: index,
                len: self.len,
            });
        }
        self.check_known(row)?;
        for column in self.columns.values_mut() {
            column.insert(index, &Value::Null);
        }
        self.len += 1;
        self.write_row(index, row);
        trace!(index, len = self.len, "row inserted");
        Ok(())
    }

    /// Deletes one row.
    ///
    /// # Errors
    ///
    /// Returns `RowOutOfRange` if `index >= len()`.
    pub fn delete_row(&mut self, index: usize) -> Result<()> {
        self.delete_rows(&[index])
    }

    /// Deletes rows by their positions before the call.
    ///
    /// Positions may come in any order; duplicates are deleted once. The
    /// surviving rows keep their relative order.
    ///
    /// # Errors
    ///
    /// Returns `RowOutOfRange` naming the largest invalid position. Nothing is
    /// deleted on error.
    pub fn delete_rows(&mut self, indices: &[usize]) -> Result<()> {
        let mut targets = indices.to_vec();
        targets.sort_unstable();
        targets.dedup();
        if let Some(&last) = targets.last() {
            if last >= self.len {
                return Err(TableError::RowOutOfRange {
                    row: last,
                    len: self.len,
                });
            }
        } else {
            return Ok(());
        }

        let mut remove = vec![false; self.len];
        for &row in &targets {
            remove[row] = true;
        }
        for column in self.columns.values_mut() {
            column.remove_flagged(&remove);
        }
        self.len -= targets.len();
        debug!(deleted = targets.len(), len = self.len, "rows deleted");
        Ok(())
    }

    // =========================================================================
    // Column-level operations
    // =========================================================================

    /// Replaces all values of a column.
    ///
    /// Raw columns stay raw; encoded columns are re-encoded with a fresh
    /// dictionary. A constant column becomes a raw column.
    ///
    /// # Errors
    ///
    /// Returns `UnknownColumn` if absent and `LengthMismatch` if
    /// `values.len() != len()`.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) -> Result<()> {
        if !self.contains_column(name) {
            return Err(TableError::UnknownColumn(name.to_string()));
        }
        self.check_length(name, values.len())?;
        if self.constants.shift_remove(name).is_some() {
            self.columns.insert(name.to_string(), Column::Raw(values));
            return Ok(());
        }
        if let Some(column) = self.columns.get_mut(name) {
            *column = match column {
                Column::Raw(_) => Column::Raw(values),
                Column::Encoded { .. } => Column::encode(&values),
            };
        }
        Ok(())
    }

    /// Sets selected cells of one per-row column.
    ///
    /// # Errors
    ///
    /// Returns `ConstantColumn` for a constant column, `UnknownColumn` if
    /// absent, and `RowOutOfRange` if any row is out of range. Nothing is
    /// written on error.
    pub fn set_cells(&mut self, name: &str, updates: &[(usize, Value)]) -> Result<()> {
        self.per_row_column(name)?;
        if let Some((row, _)) = updates.iter().find(|(row, _)| *row >= self.len) {
            return Err(TableError::RowOutOfRange {
                row: *row,
                len: self.len,
            });
        }
        if let Some(column) = self.columns.get_mut(name) {
            for (row, value) in updates {
                column.set(*row, value);
            }
        }
        Ok(())
    }

    /// Adds a raw column, optionally recording its type tag.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateColumn` if the name is taken and `LengthMismatch` if
    /// `values.len() != len()`.
    pub fn add_column(
        &mut self,
        name: &str,
        values: Vec<Value>,
        type_tag: Option<&str>,
    ) -> Result<()> {
        if self.contains_column(name) {
            return Err(TableError::DuplicateColumn(name.to_string()));
        }
        self.check_length(name, values.len())?;
        self.columns.insert(name.to_string(), Column::Raw(values));
        if let Some(tag) = type_tag {
            self.set_type(name, tag);
        }
        Ok(())
    }

    /// Sets or adds a constant column.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateColumn` if the name belongs to a per-row column.
    pub fn set_constant(&mut self, name: &str, value: Value) -> Result<()> {
        if self.columns.contains_key(name) {
            return Err(TableError::DuplicateColumn(name.to_string()));
        }
        self.constants.insert(name.to_string(), value);
        Ok(())
    }

    /// Converts a constant column into a raw column repeating its value.
    ///
    /// Per-row columns are left as they are.
    ///
    /// # Errors
    ///
    /// Returns `UnknownColumn` if absent.
    pub fn make_column_raw(&mut self, name: &str) -> Result<()> {
        if self.columns.contains_key(name) {
            return Ok(());
        }
        let value = self
            .constants
            .shift_remove(name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))?;
        self.columns
            .insert(name.to_string(), Column::Raw(vec![value; self.len]));
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn check_length(&self, name: &str, actual: usize) -> Result<()> {
        if actual != self.len {
            return Err(TableError::LengthMismatch {
                column: name.to_string(),
                expected: self.len,
                actual,
            });
        }
        Ok(())
    }

    pub(super) fn check_known(&self, row: &Row) -> Result<()> {
        match row.keys().find(|name| !self.contains_column(name)) {
            Some(name) => Err(TableError::UnknownColumn(name.clone())),
            None => Ok(()),
        }
    }

    fn check_strict_row(&self, row: &Row) -> Result<()> {
        self.check_known(row)?;
        for (name, value) in row {
            if let Some(fixed) = self.constants.get(name) {
                if fixed != value {
                    return Err(TableError::FixedValueConflict {
                        column: name.clone(),
                        expected: fixed.clone(),
                        actual: value.clone(),
                    });
                }
            }
        }
        match self.columns.keys().find(|name| !row.contains_key(*name)) {
            Some(name) => Err(TableError::MissingColumn(name.clone())),
            None => Ok(()),
        }
    }

    fn push_null_row(&mut self) {
        for column in self.columns.values_mut() {
            column.push(&Value::Null);
        }
        self.len += 1;
    }

    /// Writes known keys into an existing row.
    pub(super) fn write_row(&mut self, row: usize, updates: &Row) {
        for (name, value) in updates {
            if let Some(constant) = self.constants.get_mut(name) {
                *constant = value.clone();
            } else if let Some(column) = self.columns.get_mut(name) {
                column.set(row, value);
            }
        }
    }
}
