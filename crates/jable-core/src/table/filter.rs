//! Predicate-driven queries and transforms.

use super::{Row, Table};
use crate::error::{Result, TableError};
use crate::predicate::{matches, Predicate};
use crate::value::{compare_values, values_equal, NULL};
use roaring::RoaringBitmap;
use std::cmp::Ordering;
use tracing::debug;

/// Outcome of a predicate scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchReport {
    /// Matching row positions, ascending.
    pub indices: Vec<usize>,
    /// Rows examined. Zero when a constant column already ruled out every
    /// row.
    pub rows_scanned: usize,
}

impl Table {
    /// Finds matching rows and reports how many rows were examined.
    ///
    /// An equality predicate whose constant-column keys disagree with the
    /// table's constants matches nothing and skips the scan.
    ///
    /// # Errors
    ///
    /// Returns `UnknownColumn` if an equality key names no column.
    pub fn find_matching(&self, predicate: &Predicate<'_>) -> Result<MatchReport> {
        self.scan(predicate, usize::MAX)
    }

    /// Positions of matching rows, ascending.
    ///
    /// # Errors
    ///
    /// See [`Table::find_matching`].
    pub fn find_matching_indices(&self, predicate: &Predicate<'_>) -> Result<Vec<usize>> {
        Ok(self.scan(predicate, usize::MAX)?.indices)
    }

    /// Matching positions as a bitmap.
    ///
    /// # Errors
    ///
    /// See [`Table::find_matching`]. Also returns `InvalidRange` if a
    /// matching position does not fit in `u32`, the bitmap's key space.
    pub fn matching_bitmap(&self, predicate: &Predicate<'_>) -> Result<RoaringBitmap> {
        let report = self.scan(predicate, usize::MAX)?;
        positions_to_bitmap(&report.indices)
    }

    /// Returns true if at least one row matches. Stops at the first match.
    ///
    /// # Errors
    ///
    /// See [`Table::find_matching`].
    pub fn any_matching(&self, predicate: &Predicate<'_>) -> Result<bool> {
        Ok(!self.scan(predicate, 1)?.indices.is_empty())
    }

    /// First matching row, if any.
    ///
    /// # Errors
    ///
    /// See [`Table::find_matching`].
    pub fn first_match(&self, predicate: &Predicate<'_>) -> Result<Option<Row>> {
        let report = self.scan(predicate, 1)?;
        Ok(report.indices.first().map(|&row| self.row_at(row)))
    }

    /// The only matching row.
    ///
    /// # Errors
    ///
    /// Returns `NoMatch` if nothing matches and `AmbiguousMatch` with the full
    /// match count if several rows do.
    pub fn expect_one(&self, predicate: &Predicate<'_>) -> Result<Row> {
        let report = self.scan(predicate, usize::MAX)?;
        match report.indices.as_slice() {
            [] => Err(TableError::NoMatch),
            [row] => Ok(self.row_at(*row)),
            many => Err(TableError::AmbiguousMatch(many.len())),
        }
    }

    /// New table with the matching rows, same header.
    ///
    /// # Errors
    ///
    /// See [`Table::find_matching`].
    pub fn filter(&self, predicate: &Predicate<'_>) -> Result<Table> {
        let report = self.scan(predicate, usize::MAX)?;
        let filtered = self.rebuild(report.indices.iter().copied())?;
        debug!(
            kept = filtered.len(),
            scanned = report.rows_scanned,
            "table filtered"
        );
        Ok(filtered)
    }

    /// Applies `updates` to matching rows, at most `limit` of them, and
    /// returns how many rows were updated.
    ///
    /// A constant column named in `updates` is rewritten for the whole table.
    ///
    /// # Errors
    ///
    /// Returns `UnknownColumn` if a predicate or update key names no column.
    /// Nothing is written on error.
    pub fn set_where(
        &mut self,
        predicate: &Predicate<'_>,
        updates: &Row,
        limit: Option<usize>,
    ) -> Result<usize> {
        self.check_known(updates)?;
        let report = self.scan(predicate, limit.unwrap_or(usize::MAX))?;
        for &row in &report.indices {
            self.write_row(row, updates);
        }
        debug!(updated = report.indices.len(), "rows updated by predicate");
        Ok(report.indices.len())
    }

    /// Deletes matching rows and returns how many were deleted.
    ///
    /// # Errors
    ///
    /// See [`Table::find_matching`].
    pub fn remove_where(&mut self, predicate: &Predicate<'_>) -> Result<usize> {
        let indices = self.find_matching_indices(predicate)?;
        self.delete_rows(&indices)?;
        Ok(indices.len())
    }

    /// New table with rows stably sorted by the given columns.
    ///
    /// Ties on every column keep their original relative order.
    ///
    /// # Errors
    ///
    /// Returns `UnknownColumn` if a sort column is absent.
    pub fn sorted_by(&self, columns: &[&str]) -> Result<Table> {
        if let Some(missing) = columns.iter().find(|name| !self.contains_column(name)) {
            return Err(TableError::UnknownColumn((*missing).to_string()));
        }
        let mut positions: Vec<usize> = (0..self.len).collect();
        positions.sort_by(|&a, &b| {
            columns
                .iter()
                .map(|name| compare_values(self.cell_or_null(a, name), self.cell_or_null(b, name)))
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        let sorted = self.rebuild(positions)?;
        debug!(rows = sorted.len(), by = ?columns, "table sorted");
        Ok(sorted)
    }

    fn cell_or_null(&self, row: usize, name: &str) -> &serde_json::Value {
        self.get_cell(row, name).unwrap_or(&NULL)
    }

    /// Re-appends the given rows to an empty copy of the header, so encoded
    /// columns get dense dictionaries in first-seen order.
    fn rebuild(&self, positions: impl IntoIterator<Item = usize>) -> Result<Table> {
        let mut out = self.empty_like();
        for row in positions {
            out.append_row(&self.row_at(row), true)?;
        }
        Ok(out)
    }

    fn scan(&self, predicate: &Predicate<'_>, limit: usize) -> Result<MatchReport> {
        let mut report = MatchReport::default();
        match predicate {
            Predicate::Equality(expected) => {
                if let Some(missing) = expected.keys().find(|name| !self.contains_column(name)) {
                    return Err(TableError::UnknownColumn(missing.clone()));
                }
                let mut per_row = Vec::with_capacity(expected.len());
                for (name, value) in expected {
                    match self.constants.get(name) {
                        Some(fixed) if !values_equal(fixed, value) => return Ok(report),
                        Some(_) => {}
                        None => {
                            if let Some(column) = self.columns.get(name) {
                                per_row.push((column, value));
                            }
                        }
                    }
                }
                for row in 0..self.len {
                    if report.indices.len() >= limit {
                        break;
                    }
                    report.rows_scanned += 1;
                    let hit = per_row.iter().all(|(column, value)| {
                        column.get(row).is_some_and(|actual| values_equal(actual, value))
                    });
                    if hit {
                        report.indices.push(row);
                    }
                }
            }
            Predicate::Function(_) => {
                for (position, row) in self.rows().enumerate() {
                    if report.indices.len() >= limit {
                        break;
                    }
                    report.rows_scanned += 1;
                    if matches(&row, predicate)? {
                        report.indices.push(position);
                    }
                }
            }
        }
        Ok(report)
    }
}

/// Collects row positions into a bitmap.
pub(crate) fn positions_to_bitmap(positions: &[usize]) -> Result<RoaringBitmap> {
    positions
        .iter()
        .map(|&row| {
            u32::try_from(row).map_err(|_| {
                TableError::InvalidRange(format!(
                    "row {row} exceeds the bitmap limit of {}",
                    u32::MAX
                ))
            })
        })
        .collect()
}
