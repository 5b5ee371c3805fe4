//! Cell value helpers.
//!
//! Every cell holds a `serde_json::Value`. This module supplies the three
//! relations the table needs on top of it:
//!
//! - **identity** ([`ValueKey`]): hashing consistent with `Value`'s own
//!   structural equality, used to deduplicate dictionary entries
//! - **matching** ([`values_equal`]): predicate equality, numbers compared
//!   by exact numeric value with no tolerance
//! - **ordering** ([`compare_values`]): a total order used by sorting

use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Shared `null` returned by reference for empty cells.
pub(crate) static NULL: Value = Value::Null;

/// Owned, hashable wrapper around a cell value.
///
/// Two keys are equal exactly when the wrapped values are equal under
/// `serde_json::Value`'s `PartialEq`: `1` and `1.0` are distinct, object key
/// order is irrelevant, `0.0` and `-0.0` are the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueKey(pub Value);

impl Hash for ValueKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_value(&self.0, state);
    }
}

/// Borrowed lookup key, hashed the same way as [`ValueKey`].
///
/// Lets dictionary lookups run without cloning the looked-up value.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ValueRef<'a>(pub &'a Value);

impl Hash for ValueRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_value(self.0, state);
    }
}

impl indexmap::Equivalent<ValueKey> for ValueRef<'_> {
    fn equivalent(&self, key: &ValueKey) -> bool {
        *self.0 == key.0
    }
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => state.write_u8(0),
        Value::Bool(b) => {
            state.write_u8(1);
            b.hash(state);
        }
        Value::Number(n) => {
            state.write_u8(2);
            hash_number(n, state);
        }
        Value::String(s) => {
            state.write_u8(3);
            s.hash(state);
        }
        Value::Array(items) => {
            state.write_u8(4);
            state.write_usize(items.len());
            for item in items {
                hash_value(item, state);
            }
        }
        Value::Object(map) => {
            state.write_u8(5);
            state.write_usize(map.len());
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            for (key, item) in entries {
                key.hash(state);
                hash_value(item, state);
            }
        }
    }
}

fn hash_number<H: Hasher>(n: &Number, state: &mut H) {
    if let Some(u) = n.as_u64() {
        state.write_u8(0);
        u.hash(state);
    } else if let Some(i) = n.as_i64() {
        state.write_u8(1);
        i.hash(state);
    } else if let Some(f) = n.as_f64() {
        state.write_u8(2);
        // -0.0 == 0.0
        let f = if f == 0.0 { 0.0 } else { f };
        f.to_bits().hash(state);
    }
}

/// Predicate equality between two cell values.
///
/// Numbers compare by exact numeric value (`1 == 1.0`, but `2^53 != 2^53 + 1`);
/// everything else compares structurally.
#[must_use]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        _ => a == b,
    }
}

#[allow(clippy::float_cmp)]
fn numbers_equal(x: &Number, y: &Number) -> bool {
    match (integer_value(x), integer_value(y)) {
        (Some(i), Some(j)) => i == j,
        (Some(i), None) => y.as_f64().is_some_and(|f| float_equals_integer(f, i)),
        (None, Some(j)) => x.as_f64().is_some_and(|f| float_equals_integer(f, j)),
        (None, None) => x.as_f64() == y.as_f64(),
    }
}

fn integer_value(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

#[allow(clippy::float_cmp)]
fn float_equals_integer(f: f64, i: i128) -> bool {
    // `as` saturates, and every JSON integer fits well inside i128
    f.fract() == 0.0 && f as i128 == i
}

/// Total order over cell values.
///
/// `null < bool < number < string < array < object`. Numbers use
/// `f64::total_cmp`, arrays compare element-wise, objects compare their
/// entries sorted by key.
#[must_use]
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y) {
                let ord = compare_values(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => {
            let mut left: Vec<(&String, &Value)> = x.iter().collect();
            let mut right: Vec<(&String, &Value)> = y.iter().collect();
            left.sort_unstable_by(|p, q| p.0.cmp(q.0));
            right.sort_unstable_by(|p, q| p.0.cmp(q.0));
            for ((lk, lv), (rk, rv)) in left.iter().zip(&right) {
                let ord = lk.cmp(rk).then_with(|| compare_values(lv, rv));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            left.len().cmp(&right.len())
        }
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

fn compare_numbers(x: &Number, y: &Number) -> Ordering {
    // Exact integer comparison first: large i64/u64 lose precision as f64.
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a.cmp(&b);
    }
    let a = x.as_f64().unwrap_or(f64::NAN);
    let b = y.as_f64().unwrap_or(f64::NAN);
    a.total_cmp(&b)
}

const fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Short type tag for a value, as recorded in the advisory schema.
#[must_use]
pub fn type_tag(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
