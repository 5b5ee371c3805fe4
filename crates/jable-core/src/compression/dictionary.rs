//! Dictionary encoding for per-row columns.
//!
//! Replaces repeated values with compact integer codes. `null` is never an
//! entry: a null cell is stored as an absent code (`None`) regardless of
//! encoding.

#![allow(clippy::cast_possible_truncation)]

use crate::error::{Result, TableError};
use crate::value::{ValueKey, ValueRef};
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use serde_json::Value;

/// Deduplicated, insertion-ordered decode table for one column.
///
/// Codes are positions in insertion order. Lookup by value is hashed, so
/// reuse of an existing entry is O(1).
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: IndexSet<ValueKey, FxBuildHasher>,
}

impl Dictionary {
    /// Create an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary from an explicit decode table.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLayout` if the list contains `null` or a duplicate.
    pub fn from_values<I: IntoIterator<Item = Value>>(values: I) -> Result<Self> {
        let mut dictionary = Self::new();
        for value in values {
            if value.is_null() {
                return Err(TableError::InvalidLayout(
                    "null cannot be a dictionary entry".to_string(),
                ));
            }
            let (code, inserted) = dictionary.entries.insert_full(ValueKey(value));
            if !inserted {
                return Err(TableError::InvalidLayout(format!(
                    "duplicate dictionary entry, first seen at code {code}"
                )));
            }
        }
        Ok(dictionary)
    }

    /// Encode a whole column in first-seen order.
    ///
    /// Returns the dictionary and one code per value (`None` for `null`).
    #[must_use]
    pub fn encode_column(values: &[Value]) -> (Self, Vec<Option<u32>>) {
        let mut dictionary = Self::new();
        let codes = values.iter().map(|v| dictionary.encode(v)).collect();
        (dictionary, codes)
    }

    /// Number of distinct entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the dictionary is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Code of an existing entry, without inserting.
    #[must_use]
    pub fn code_of(&self, value: &Value) -> Option<u32> {
        self.entries
            .get_index_of(&ValueRef(value))
            .map(|code| code as u32)
    }

    /// Encode a single value, returning its code.
    ///
    /// An existing entry is reused; a new value is appended. `null` yields
    /// `None` and leaves the dictionary untouched.
    pub fn encode(&mut self, value: &Value) -> Option<u32> {
        if value.is_null() {
            return None;
        }
        if let Some(code) = self.code_of(value) {
            return Some(code);
        }
        let (code, _) = self.entries.insert_full(ValueKey(value.clone()));
        Some(code as u32)
    }

    /// Decode a code back to its value.
    #[must_use]
    pub fn decode(&self, code: u32) -> Option<&Value> {
        self.entries.get_index(code as usize).map(|key| &key.0)
    }

    /// Decode a code array, mapping absent codes to `null`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLayout` on a code outside the dictionary.
    pub fn decode_codes(&self, codes: &[Option<u32>]) -> Result<Vec<Value>> {
        codes
            .iter()
            .map(|code| match code {
                None => Ok(Value::Null),
                Some(c) => self.decode(*c).cloned().ok_or_else(|| {
                    TableError::InvalidLayout(format!(
                        "code {c} outside dictionary of {} entries",
                        self.len()
                    ))
                }),
            })
            .collect()
    }

    /// Check that every code addresses an entry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLayout` naming the first bad code.
    pub fn validate_codes(&self, codes: &[Option<u32>]) -> Result<()> {
        match codes.iter().flatten().find(|&&c| c as usize >= self.len()) {
            Some(c) => Err(TableError::InvalidLayout(format!(
                "code {c} outside dictionary of {} entries",
                self.len()
            ))),
            None => Ok(()),
        }
    }

    /// Entries in code order.
    pub fn values(&self) -> impl ExactSizeIterator<Item = &Value> + '_ {
        self.entries.iter().map(|key| &key.0)
    }

    /// Owned copy of the decode table.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.values().cloned().collect()
    }
}

// Code order matters: the same entries in another order decode differently.
impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.values().eq(other.values())
    }
}
