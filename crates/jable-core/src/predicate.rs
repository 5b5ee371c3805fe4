//! Row predicates.
//!
//! A predicate is either an equality map (every named column must equal the
//! expected value) or an arbitrary function of the row.

use crate::error::{Result, TableError};
use crate::table::Row;
use crate::value::values_equal;
use serde_json::Value;
use std::fmt;

/// Row-testing predicate.
pub enum Predicate<'a> {
    /// Matches rows whose named columns all equal the expected values.
    Equality(Row),
    /// Matches rows for which the function returns true.
    Function(Box<dyn Fn(&Row) -> bool + 'a>),
}

impl<'a> Predicate<'a> {
    /// Single-column equality.
    #[must_use]
    pub fn equal(column: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut expected = Row::new();
        expected.insert(column.into(), value.into());
        Self::Equality(expected)
    }

    /// Multi-column equality.
    #[must_use]
    pub fn equals(expected: Row) -> Self {
        Self::Equality(expected)
    }

    /// Adds one more required equality. Turns a function predicate into
    /// the conjunction of the function and the equality.
    #[must_use]
    pub fn and_eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        let column = column.into();
        let value = value.into();
        match self {
            Self::Equality(mut expected) => {
                expected.insert(column, value);
                Self::Equality(expected)
            }
            Self::Function(f) => Self::Function(Box::new(move |row: &Row| {
                f(row) && row.get(&column).is_some_and(|v| values_equal(v, &value))
            })),
        }
    }

    /// Function predicate.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Row) -> bool + 'a,
    {
        Self::Function(Box::new(f))
    }

    /// Equality predicate from a JSON object of column to expected value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPredicate` for anything but an object.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::Equality(
                map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            )),
            other => Err(TableError::InvalidPredicate(format!(
                "expected an object of column to value, got {other}"
            ))),
        }
    }
}

impl fmt::Debug for Predicate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equality(expected) => f.debug_tuple("Equality").field(expected).finish(),
            Self::Function(_) => f.write_str("Function(<fn>)"),
        }
    }
}

/// Tests one row against a predicate.
///
/// # Errors
///
/// Returns `UnknownColumn` if an equality key is not in the row.
pub fn matches(row: &Row, predicate: &Predicate<'_>) -> Result<bool> {
    match predicate {
        Predicate::Equality(expected) => {
            for (column, value) in expected {
                let actual = row
                    .get(column)
                    .ok_or_else(|| TableError::UnknownColumn(column.clone()))?;
                if !values_equal(actual, value) {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Predicate::Function(f) => Ok(f(row)),
    }
}
