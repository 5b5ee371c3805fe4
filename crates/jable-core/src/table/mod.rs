//! Compressed, mutable, column-oriented table.
//!
//! Rows are addressed by position, columns by name. Every column is stored
//! in one of three modes:
//!
//! ```text
//! Table
//! ├── constants: IndexMap<name, Value>           one value for every row
//! ├── columns:   IndexMap<name, Column>
//! │   ├── "letter" -> Raw(Vec<Value>)               one literal per row
//! │   └── "status" -> Encoded { codes, dictionary } one code per row
//! ├── schema:    IndexMap<name, type tag>         advisory, never enforced
//! ├── meta:      JSON object                      opaque, carried through copies
//! └── len:       row count
//! ```
//!
//! # Layout invariants
//!
//! Every public operation leaves the table with:
//! - each name either constant or per-row, never both
//! - every per-row column holding exactly `len` slots
//! - every encoded code addressing its dictionary, with no duplicate entries
//! - `null` stored as a literal (raw) or absent code (encoded), never as a
//!   dictionary entry

mod filter;
mod mutation;
mod rows;
mod select;
mod types;

use crate::compression::Dictionary;
use crate::error::{Result, TableError};
use indexmap::IndexMap;
use serde_json::{Map, Value};

pub(crate) use filter::positions_to_bitmap;
pub use filter::MatchReport;
pub use rows::{ColumnValues, FrameSource, Rows};
pub use select::{ColumnSelector, RowRange, RowSelector, Selection};
pub use types::{Column, Row, StorageMode};

/// Column-oriented table with constant, raw and dictionary-encoded columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Constant columns: one value shared by every row.
    pub(crate) constants: IndexMap<String, Value>,
    /// Raw and encoded columns, one slot per row.
    pub(crate) columns: IndexMap<String, Column>,
    /// Advisory type tags.
    pub(crate) schema: IndexMap<String, String>,
    /// Caller-owned metadata.
    pub(crate) meta: Map<String, Value>,
    /// Number of rows.
    pub(crate) len: usize,
}

impl Table {
    /// Creates a new empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with no rows and the given header.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateColumn` if a name appears twice across the three
    /// header lists.
    pub fn with_headers(constants: Row, raw: &[&str], encoded: &[&str]) -> Result<Self> {
        let mut table = Self {
            constants,
            ..Self::default()
        };
        for &name in raw {
            table.claim_name(name)?;
            table.columns.insert(name.to_string(), Column::Raw(Vec::new()));
        }
        for &name in encoded {
            table.claim_name(name)?;
            table.columns.insert(name.to_string(), Column::encode(&[]));
        }
        Ok(table)
    }

    /// Creates a table of raw columns.
    ///
    /// # Errors
    ///
    /// Returns `LengthMismatch` if the columns differ in length.
    pub fn from_raw_columns(columns: IndexMap<String, Vec<Value>>) -> Result<Self> {
        Self::from_columns(Row::new(), columns, &[])
    }

    /// Creates a table from data, dictionary-encoding the named columns.
    ///
    /// # Errors
    ///
    /// Returns `UnknownColumn` if an encoded name has no data,
    /// `LengthMismatch` if the columns differ in length, and
    /// `DuplicateColumn` if a name is both constant and per-row.
    pub fn from_columns(
        constants: Row,
        columns: IndexMap<String, Vec<Value>>,
        encoded: &[&str],
    ) -> Result<Self> {
        if let Some(missing) = encoded.iter().find(|name| !columns.contains_key(**name)) {
            return Err(TableError::UnknownColumn((*missing).to_string()));
        }
        let mut table = Self {
            constants,
            ..Self::default()
        };
        let mut expected_len = None;
        for (name, values) in columns {
            table.claim_name(&name)?;
            let len = *expected_len.get_or_insert(values.len());
            if values.len() != len {
                return Err(TableError::LengthMismatch {
                    column: name,
                    expected: len,
                    actual: values.len(),
                });
            }
            let column = if encoded.contains(&name.as_str()) {
                Column::encode(&values)
            } else {
                Column::Raw(values)
            };
            table.columns.insert(name, column);
        }
        table.len = expected_len.unwrap_or(0);
        Ok(table)
    }

    /// Assembles a table from already-built storage, validating the layout.
    ///
    /// The row count is taken from the per-row columns (zero if there are
    /// none).
    ///
    /// # Errors
    ///
    /// Returns `InvalidLayout` if a name is both constant and per-row or a
    /// code falls outside its dictionary, and `LengthMismatch` if per-row
    /// columns differ in length.
    pub fn from_parts(
        constants: Row,
        columns: IndexMap<String, Column>,
        schema: IndexMap<String, String>,
        meta: Map<String, Value>,
    ) -> Result<Self> {
        let len = columns.values().next().map_or(0, Column::len);
        for (name, column) in &columns {
            if constants.contains_key(name) {
                return Err(TableError::InvalidLayout(format!(
                    "column '{name}' is both constant and per-row"
                )));
            }
            if column.len() != len {
                return Err(TableError::LengthMismatch {
                    column: name.clone(),
                    expected: len,
                    actual: column.len(),
                });
            }
            if let Column::Encoded { codes, dictionary } = column {
                dictionary.validate_codes(codes)?;
            }
        }
        Ok(Self {
            constants,
            columns,
            schema,
            meta,
            len,
        })
    }

    /// Returns an empty table with the same header, schema and meta.
    ///
    /// Encoded columns stay encoded, with fresh empty dictionaries.
    #[must_use]
    pub fn empty_like(&self) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|(name, column)| {
                let empty = match column {
                    Column::Raw(_) => Column::Raw(Vec::new()),
                    Column::Encoded { .. } => Column::Encoded {
                        codes: Vec::new(),
                        dictionary: Dictionary::new(),
                    },
                };
                (name.clone(), empty)
            })
            .collect();
        Self {
            constants: self.constants.clone(),
            columns,
            schema: self.schema.clone(),
            meta: self.meta.clone(),
            len: 0,
        }
    }

    /// Sets the advisory schema.
    #[must_use]
    pub fn with_schema(mut self, schema: IndexMap<String, String>) -> Self {
        self.schema = schema;
        self
    }

    /// Sets the caller-owned metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = meta;
        self
    }

    fn claim_name(&self, name: &str) -> Result<()> {
        if self.contains_column(name) {
            return Err(TableError::DuplicateColumn(name.to_string()));
        }
        Ok(())
    }

    // =========================================================================
    // Shape and header
    // =========================================================================

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of columns of every mode.
    #[must_use]
    pub fn width(&self) -> usize {
        self.constants.len() + self.columns.len()
    }

    /// Returns `(rows, columns)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.len, self.width())
    }

    /// Column names: constant columns first, then per-row columns, each in
    /// insertion order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.constant_names()
            .chain(self.per_row_names())
            .collect()
    }

    /// Names of constant columns.
    pub fn constant_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.constants.keys().map(String::as_str)
    }

    /// Names of raw and encoded columns.
    pub fn per_row_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    /// Returns true if a column of any mode has this name.
    #[must_use]
    pub fn contains_column(&self, name: &str) -> bool {
        self.constants.contains_key(name) || self.columns.contains_key(name)
    }

    /// Storage mode of a column.
    ///
    /// # Errors
    ///
    /// Returns `UnknownColumn` if the column is absent.
    pub fn storage_mode(&self, name: &str) -> Result<StorageMode> {
        if self.constants.contains_key(name) {
            return Ok(StorageMode::Constant);
        }
        self.columns
            .get(name)
            .map(Column::storage_mode)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    /// Returns true if the column is dictionary-encoded.
    #[must_use]
    pub fn is_encoded(&self, name: &str) -> bool {
        matches!(self.columns.get(name), Some(Column::Encoded { .. }))
    }

    /// Dictionary of an encoded column.
    #[must_use]
    pub fn dictionary(&self, name: &str) -> Option<&Dictionary> {
        self.columns.get(name).and_then(Column::dictionary)
    }

    /// Storage of a raw or encoded column.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Constant columns.
    #[must_use]
    pub fn constants(&self) -> &IndexMap<String, Value> {
        &self.constants
    }

    /// Advisory schema.
    #[must_use]
    pub fn schema(&self) -> &IndexMap<String, String> {
        &self.schema
    }

    /// Records an advisory type tag for a column.
    pub fn set_type(&mut self, name: &str, tag: impl Into<String>) {
        self.schema.insert(name.to_string(), tag.into());
    }

    /// Caller-owned metadata.
    #[must_use]
    pub fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }

    /// Mutable caller-owned metadata.
    pub fn meta_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.meta
    }

    // =========================================================================
    // Reads
    // =========================================================================

    fn check_row(&self, row: usize) -> Result<()> {
        if row >= self.len {
            return Err(TableError::RowOutOfRange { row, len: self.len });
        }
        Ok(())
    }

    /// Value at `(row, column)`, decoding encoded columns.
    ///
    /// # Errors
    ///
    /// Returns `UnknownColumn` if the column is absent and `RowOutOfRange` if
    /// `row >= len()`.
    pub fn get_cell(&self, row: usize, column: &str) -> Result<&Value> {
        if let Some(value) = self.constants.get(column) {
            self.check_row(row)?;
            return Ok(value);
        }
        let data = self
            .columns
            .get(column)
            .ok_or_else(|| TableError::UnknownColumn(column.to_string()))?;
        data.get(row)
            .ok_or(TableError::RowOutOfRange { row, len: self.len })
    }

    /// One row as a name-to-value map, constant columns first.
    ///
    /// # Errors
    ///
    /// Returns `RowOutOfRange` if `row >= len()`.
    pub fn get_row(&self, row: usize) -> Result<Row> {
        self.check_row(row)?;
        Ok(self.row_at(row))
    }

    /// Builds row `row`. Callers guarantee `row < len()`.
    pub(crate) fn row_at(&self, row: usize) -> Row {
        let mut out = Row::with_capacity(self.width());
        for (name, value) in &self.constants {
            out.insert(name.clone(), value.clone());
        }
        for (name, column) in &self.columns {
            out.insert(name.clone(), column.get(row).cloned().unwrap_or(Value::Null));
        }
        out
    }

    /// Fully decoded values of a raw or encoded column.
    ///
    /// # Errors
    ///
    /// Returns `ConstantColumn` for a constant column (it has no per-row
    /// values; see [`Table::column_values`]) and `UnknownColumn` if absent.
    pub fn get_column(&self, column: &str) -> Result<Vec<Value>> {
        self.per_row_column(column).map(Column::to_values)
    }

    pub(crate) fn per_row_column(&self, column: &str) -> Result<&Column> {
        if self.constants.contains_key(column) {
            return Err(TableError::ConstantColumn(column.to_string()));
        }
        self.columns
            .get(column)
            .ok_or_else(|| TableError::UnknownColumn(column.to_string()))
    }

    /// Value of a constant column.
    #[must_use]
    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }

    /// Value of a constant column, or `default` if there is no such constant.
    #[must_use]
    pub fn constant_or(&self, name: &str, default: Value) -> Value {
        self.constants.get(name).cloned().unwrap_or(default)
    }

    /// Constant values for every key of `defaults`, falling back to the
    /// supplied default where the table has no such constant.
    #[must_use]
    pub fn constants_with_defaults(&self, defaults: &Row) -> Row {
        defaults
            .iter()
            .map(|(name, default)| {
                let value = self.constants.get(name).unwrap_or(default);
                (name.clone(), value.clone())
            })
            .collect()
    }
}
