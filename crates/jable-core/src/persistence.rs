//! JSON persistence.
//!
//! A table is stored as one JSON object with five sections:
//!
//! ```json
//! {
//!   "fixed":      { "source": "survey" },
//!   "shift":      { "id": [1, 2, 3], "status": [0, 1, null] },
//!   "shiftIndex": { "status": ["open", "closed"] },
//!   "schema":     { "id": "int" },
//!   "meta":       {}
//! }
//! ```
//!
//! `shift` holds raw values, or codes for columns that also appear in
//! `shiftIndex`. Older files spell the sections with a leading underscore
//! and may call the schema `keyTypes`; both spellings are read.

use crate::compression::Dictionary;
use crate::error::{Result, TableError};
use crate::table::{Column, Table};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::debug;

const SECTIONS: [(&str, &[&str]); 5] = [
    ("fixed", &["fixed", "_fixed"]),
    ("shift", &["shift", "_shift"]),
    ("shiftIndex", &["shiftIndex", "_shiftIndex"]),
    ("schema", &["schema", "_schema", "keyTypes", "_keyTypes"]),
    ("meta", &["meta", "_meta"]),
];

/// Serde model of the persisted layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableParts {
    /// Constant columns.
    #[serde(default, alias = "_fixed")]
    pub fixed: IndexMap<String, Value>,
    /// Raw values or codes, one array per per-row column.
    #[serde(default, alias = "_shift")]
    pub shift: IndexMap<String, Vec<Value>>,
    /// Dictionaries of encoded columns.
    #[serde(default, rename = "shiftIndex", alias = "_shiftIndex")]
    pub shift_index: IndexMap<String, Vec<Value>>,
    /// Advisory type tags.
    #[serde(default, alias = "_schema", alias = "keyTypes", alias = "_keyTypes")]
    pub schema: IndexMap<String, String>,
    /// Caller-owned metadata.
    #[serde(default, alias = "_meta")]
    pub meta: Map<String, Value>,
}

impl TableParts {
    /// Splits a table into its persisted sections.
    #[must_use]
    pub fn from_table(table: &Table) -> Self {
        let mut parts = Self {
            fixed: table.constants().clone(),
            schema: table.schema().clone(),
            meta: table.meta().clone(),
            ..Self::default()
        };
        for name in table.per_row_names() {
            match table.column(name) {
                Some(Column::Raw(values)) => {
                    parts.shift.insert(name.to_string(), values.clone());
                }
                Some(Column::Encoded { codes, dictionary }) => {
                    let codes = codes
                        .iter()
                        .map(|code| code.map_or(Value::Null, Value::from))
                        .collect();
                    parts.shift.insert(name.to_string(), codes);
                    parts.shift_index.insert(name.to_string(), dictionary.to_vec());
                }
                None => {}
            }
        }
        parts
    }

    /// Rebuilds the table, validating the layout.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPersistedData` if a dictionary has no code array or a
    /// code is not a non-negative integer, and the layout errors of
    /// [`Table::from_parts`] otherwise.
    pub fn into_table(self) -> Result<Table> {
        let Self {
            fixed,
            shift,
            mut shift_index,
            schema,
            meta,
        } = self;
        if let Some(orphan) = shift_index.keys().find(|name| !shift.contains_key(*name)) {
            return Err(TableError::MalformedPersistedData(format!(
                "dictionary for '{orphan}' has no column in shift"
            )));
        }
        let mut columns = IndexMap::with_capacity(shift.len());
        for (name, values) in shift {
            let column = match shift_index.swap_remove(&name) {
                Some(entries) => Column::Encoded {
                    codes: parse_codes(&name, &values)?,
                    dictionary: Dictionary::from_values(entries)?,
                },
                None => Column::Raw(values),
            };
            columns.insert(name, column);
        }
        Table::from_parts(fixed, columns, schema, meta)
    }
}

fn parse_codes(column: &str, values: &[Value]) -> Result<Vec<Option<u32>>> {
    values
        .iter()
        .map(|value| match value {
            Value::Null => Ok(None),
            other => other
                .as_u64()
                .and_then(|code| u32::try_from(code).ok())
                .map(Some)
                .ok_or_else(|| {
                    TableError::MalformedPersistedData(format!(
                        "column '{column}' holds {other} where a dictionary code was expected"
                    ))
                }),
        })
        .collect()
}

/// How to treat incomplete or unexpected persisted data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Fail on missing or unrecognized top-level keys instead of filling
    /// defaults.
    pub strict: bool,
    /// When a non-strict file load had to fill defaults, write the completed
    /// layout back to the file.
    pub update: bool,
}

impl LoadOptions {
    /// Strict loading.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            strict: true,
            update: false,
        }
    }
}

/// Missing section names and unrecognized keys of a persisted object.
fn audit_sections(object: &Map<String, Value>) -> (Vec<&'static str>, Vec<String>) {
    let missing = SECTIONS
        .iter()
        .filter(|(_, spellings)| !spellings.iter().any(|s| object.contains_key(*s)))
        .map(|(name, _)| *name)
        .collect();
    let unknown = object
        .keys()
        .filter(|key| {
            !SECTIONS
                .iter()
                .any(|(_, spellings)| spellings.contains(&key.as_str()))
        })
        .cloned()
        .collect();
    (missing, unknown)
}

/// Serializes a table to a JSON value.
///
/// # Errors
///
/// Returns `Serialization` if encoding fails.
pub fn to_json_value(table: &Table) -> Result<Value> {
    Ok(serde_json::to_value(TableParts::from_table(table))?)
}

/// Serializes a table to a JSON string.
///
/// # Errors
///
/// Returns `Serialization` if encoding fails.
pub fn to_json_string(table: &Table, pretty: bool) -> Result<String> {
    let parts = TableParts::from_table(table);
    let text = if pretty {
        serde_json::to_string_pretty(&parts)?
    } else {
        serde_json::to_string(&parts)?
    };
    Ok(text)
}

/// Rebuilds a table from a JSON value.
///
/// # Errors
///
/// Returns `MalformedPersistedData` if the value is not an object, or in
/// strict mode if a section is missing or an unrecognized key is present.
/// Layout errors are returned as by [`TableParts::into_table`].
pub fn from_json_value(value: Value, options: &LoadOptions) -> Result<Table> {
    load_value(value, options).map(|(table, _)| table)
}

/// Rebuilds a table from a JSON string.
///
/// # Errors
///
/// As [`from_json_value`], plus `Serialization` for invalid JSON.
pub fn from_json_str(text: &str, options: &LoadOptions) -> Result<Table> {
    from_json_value(serde_json::from_str(text)?, options)
}

/// Loads and returns the table along with whether any section was missing.
fn load_value(value: Value, options: &LoadOptions) -> Result<(Table, bool)> {
    let Value::Object(object) = value else {
        return Err(TableError::MalformedPersistedData(
            "top level must be an object".to_string(),
        ));
    };
    let (missing, unknown) = audit_sections(&object);
    if options.strict && (!missing.is_empty() || !unknown.is_empty()) {
        return Err(TableError::MalformedPersistedData(format!(
            "missing sections {missing:?}, unrecognized keys {unknown:?}"
        )));
    }
    let parts: TableParts = serde_json::from_value(Value::Object(object))
        .map_err(|e| TableError::MalformedPersistedData(e.to_string()))?;
    Ok((parts.into_table()?, !missing.is_empty()))
}

/// Writes a table to a JSON file.
///
/// # Errors
///
/// Returns `Io` if the file cannot be written.
pub fn write_file<P: AsRef<Path>>(table: &Table, path: P, pretty: bool) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, to_json_string(table, pretty)?)?;
    debug!(path = %path.display(), rows = table.len(), "table written");
    Ok(())
}

/// Reads a table from a JSON file.
///
/// # Errors
///
/// Returns `Io` if the file cannot be read and the errors of
/// [`from_json_value`] otherwise.
pub fn read_file<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Table> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let (table, incomplete) = load_value(serde_json::from_str(&text)?, options)?;
    if incomplete && options.update {
        write_file(&table, path, true)?;
        debug!(path = %path.display(), "completed missing sections on disk");
    }
    debug!(path = %path.display(), rows = table.len(), "table read");
    Ok(table)
}

/// Reads a file holding one JSON object of column name to value array, as a
/// table of raw columns.
///
/// # Errors
///
/// Returns `Io` if the file cannot be read, `MalformedPersistedData` if the
/// content is not an object of arrays, and `LengthMismatch` if the arrays
/// differ in length.
pub fn read_columns_file<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let columns: IndexMap<String, Vec<Value>> = serde_json::from_str(&text)
        .map_err(|e| TableError::MalformedPersistedData(e.to_string()))?;
    let table = Table::from_raw_columns(columns)?;
    debug!(path = %path.display(), rows = table.len(), "columns read");
    Ok(table)
}

impl Table {
    /// Serializes this table to a JSON string. See [`to_json_string`].
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if encoding fails.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        to_json_string(self, pretty)
    }

    /// Writes this table to a JSON file. See [`write_file`].
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be written.
    pub fn write_file<P: AsRef<Path>>(&self, path: P, pretty: bool) -> Result<()> {
        write_file(self, path, pretty)
    }

    /// Reads a table from a JSON file. See [`read_file`].
    ///
    /// # Errors
    ///
    /// See [`read_file`].
    pub fn read_file<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Table> {
        read_file(path, options)
    }
}
