//! Consolidation: rewrite each column's storage mode from its cardinality,
//! leaving every decoded row unchanged.
//!
//! With `T` the resolved threshold:
//!
//! | input column | condition                                   | output    |
//! |--------------|---------------------------------------------|-----------|
//! | constant     | always                                      | constant  |
//! | encoded      | `unindex` and dictionary size `>= T`        | raw       |
//! | encoded      | otherwise                                   | encoded   |
//! | raw          | one distinct value and `make_fixed`         | constant  |
//! | raw          | distinct values `< T`                       | encoded   |
//! | raw          | otherwise                                   | raw       |
//!
//! `null` counts as a distinct value when deciding, but is never a
//! dictionary entry.

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use crate::compression::Dictionary;
use crate::error::{Result, TableError};
use crate::table::{Column, StorageMode, Table};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Cardinality bound below which a raw column is dictionary-encoded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Threshold {
    /// Absolute number of distinct values.
    Count(usize),
    /// Fraction of the row count, rounded up.
    Fraction(f64),
}

impl Default for Threshold {
    fn default() -> Self {
        Self::Fraction(0.5)
    }
}

impl Threshold {
    /// Resolves the bound for a table of `len` rows.
    ///
    /// # Errors
    ///
    /// Returns `InvalidThreshold` for a negative or non-finite fraction.
    pub fn resolve(&self, len: usize) -> Result<usize> {
        match *self {
            Self::Count(count) => Ok(count),
            Self::Fraction(fraction) => {
                if !fraction.is_finite() || fraction < 0.0 {
                    return Err(TableError::InvalidThreshold(format!(
                        "fraction must be finite and non-negative, got {fraction}"
                    )));
                }
                Ok((fraction * len as f64).ceil() as usize)
            }
        }
    }
}

/// Options for [`consolidate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsolidateOptions {
    /// Cardinality threshold.
    pub threshold: Threshold,
    /// Turn single-valued raw columns into constants.
    pub make_fixed: bool,
    /// Decode encoded columns whose dictionary reached the threshold.
    pub unindex: bool,
}

impl Default for ConsolidateOptions {
    fn default() -> Self {
        Self {
            threshold: Threshold::default(),
            make_fixed: true,
            unindex: true,
        }
    }
}

/// Storage mode change of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnChange {
    /// Column name.
    pub column: String,
    /// Mode before consolidation.
    pub before: StorageMode,
    /// Mode after consolidation.
    pub after: StorageMode,
}

/// Summary of a consolidation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidationReport {
    /// Resolved threshold.
    pub threshold: usize,
    /// Columns whose mode changed, in column order.
    pub changes: Vec<ColumnChange>,
}

/// Returns a copy of `table` with storage modes rewritten.
///
/// # Errors
///
/// Returns `InvalidThreshold` if the threshold cannot be resolved.
pub fn consolidate(table: &Table, options: &ConsolidateOptions) -> Result<Table> {
    consolidate_with_report(table, options).map(|(out, _)| out)
}

/// Like [`consolidate`], also reporting which columns changed mode.
///
/// # Errors
///
/// Returns `InvalidThreshold` if the threshold cannot be resolved.
pub fn consolidate_with_report(
    table: &Table,
    options: &ConsolidateOptions,
) -> Result<(Table, ConsolidationReport)> {
    let threshold = options.threshold.resolve(table.len)?;
    let mut constants = table.constants.clone();
    let mut columns: IndexMap<String, Column> = IndexMap::with_capacity(table.columns.len());
    let mut report = ConsolidationReport {
        threshold,
        changes: Vec::new(),
    };

    for (name, column) in &table.columns {
        let before = column.storage_mode();
        let after = match column {
            Column::Encoded { dictionary, .. } => {
                if options.unindex && dictionary.len() >= threshold {
                    columns.insert(name.clone(), Column::Raw(column.to_values()));
                    StorageMode::Raw
                } else {
                    columns.insert(name.clone(), column.clone());
                    StorageMode::Encoded
                }
            }
            Column::Raw(values) => {
                let (dictionary, codes) = Dictionary::encode_column(values);
                let has_null = codes.iter().any(Option::is_none);
                let distinct = dictionary.len() + usize::from(has_null);
                if options.make_fixed && distinct == 1 {
                    let value = dictionary.decode(0).cloned().unwrap_or(Value::Null);
                    constants.insert(name.clone(), value);
                    StorageMode::Constant
                } else if distinct < threshold {
                    columns.insert(name.clone(), Column::Encoded { codes, dictionary });
                    StorageMode::Encoded
                } else {
                    columns.insert(name.clone(), Column::Raw(values.clone()));
                    StorageMode::Raw
                }
            }
        };
        if before != after {
            report.changes.push(ColumnChange {
                column: name.clone(),
                before,
                after,
            });
        }
    }

    let mut out = Table::from_parts(
        constants,
        columns,
        table.schema.clone(),
        table.meta.clone(),
    )?;
    // A table whose per-row columns all became constants keeps its rows.
    out.len = table.len;

    debug!(
        threshold,
        changed = report.changes.len(),
        changes = ?report.changes,
        "table consolidated"
    );
    Ok((out, report))
}

impl Table {
    /// Returns a consolidated copy of this table. See [`consolidate`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidThreshold` if the threshold cannot be resolved.
    pub fn consolidate(&self, options: &ConsolidateOptions) -> Result<Table> {
        consolidate(self, options)
    }
}
