//! Column storage types.

use crate::compression::Dictionary;
use crate::value::NULL;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A materialized row: column name to value, constant columns first.
pub type Row = IndexMap<String, Value>;

/// Physical storage mode of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    /// One value shared by every row.
    Constant,
    /// One literal value per row.
    Raw,
    /// One dictionary code per row.
    Encoded,
}

/// Per-row column data.
///
/// Both variants hold exactly one slot per table row. A null cell is a
/// literal `Value::Null` in a raw column and a `None` code in an encoded one.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Literal values.
    Raw(Vec<Value>),
    /// Codes into a per-column dictionary.
    Encoded {
        /// One code per row, `None` for null.
        codes: Vec<Option<u32>>,
        /// Decode table.
        dictionary: Dictionary,
    },
}

impl Column {
    /// Dictionary-encode a sequence of values in first-seen order.
    #[must_use]
    pub fn encode(values: &[Value]) -> Self {
        let (dictionary, codes) = Dictionary::encode_column(values);
        Self::Encoded { codes, dictionary }
    }

    /// Number of rows held.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Raw(values) => values.len(),
            Self::Encoded { codes, .. } => codes.len(),
        }
    }

    /// Check if the column holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Storage mode of this column.
    #[must_use]
    pub fn storage_mode(&self) -> StorageMode {
        match self {
            Self::Raw(_) => StorageMode::Raw,
            Self::Encoded { .. } => StorageMode::Encoded,
        }
    }

    /// Dictionary of an encoded column.
    #[must_use]
    pub fn dictionary(&self) -> Option<&Dictionary> {
        match self {
            Self::Raw(_) => None,
            Self::Encoded { dictionary, .. } => Some(dictionary),
        }
    }

    /// Decoded value at `row`, or `None` past the end.
    #[must_use]
    pub fn get(&self, row: usize) -> Option<&Value> {
        match self {
            Self::Raw(values) => values.get(row),
            Self::Encoded { codes, dictionary } => codes
                .get(row)
                .map(|code| code.and_then(|c| dictionary.decode(c)).unwrap_or(&NULL)),
        }
    }

    /// Decoded values in row order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Value> + DoubleEndedIterator + '_ {
        (0..self.len()).map(move |row| self.get(row).unwrap_or(&NULL))
    }

    /// Owned decoded values.
    #[must_use]
    pub fn to_values(&self) -> Vec<Value> {
        self.iter().cloned().collect()
    }

    /// Consume the column into its decoded values.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Self::Raw(values) => values,
            encoded @ Self::Encoded { .. } => encoded.to_values(),
        }
    }

    /// Overwrite an existing slot. Callers guarantee `row < len()`.
    pub(crate) fn set(&mut self, row: usize, value: &Value) {
        match self {
            Self::Raw(values) => values[row] = value.clone(),
            Self::Encoded { codes, dictionary } => codes[row] = dictionary.encode(value),
        }
    }

    pub(crate) fn push(&mut self, value: &Value) {
        match self {
            Self::Raw(values) => values.push(value.clone()),
            Self::Encoded { codes, dictionary } => codes.push(dictionary.encode(value)),
        }
    }

    pub(crate) fn insert(&mut self, index: usize, value: &Value) {
        match self {
            Self::Raw(values) => values.insert(index, value.clone()),
            Self::Encoded { codes, dictionary } => {
                let code = dictionary.encode(value);
                codes.insert(index, code);
            }
        }
    }

    /// Drop every slot whose position is flagged in `remove`.
    pub(crate) fn remove_flagged(&mut self, remove: &[bool]) {
        fn compact<T>(items: &mut Vec<T>, remove: &[bool]) {
            let mut position = 0;
            items.retain(|_| {
                let keep = !remove.get(position).copied().unwrap_or(false);
                position += 1;
                keep
            });
        }
        match self {
            Self::Raw(values) => compact(values, remove),
            Self::Encoded { codes, .. } => compact(codes, remove),
        }
    }

    /// New column holding the given rows, in the given order.
    ///
    /// Encoded columns keep their whole dictionary, so codes keep their
    /// meaning even when some entries are no longer referenced.
    pub(crate) fn gather(&self, rows: &[usize]) -> Self {
        match self {
            Self::Raw(values) => Self::Raw(rows.iter().map(|&r| values[r].clone()).collect()),
            Self::Encoded { codes, dictionary } => Self::Encoded {
                codes: rows.iter().map(|&r| codes[r]).collect(),
                dictionary: dictionary.clone(),
            },
        }
    }
}
