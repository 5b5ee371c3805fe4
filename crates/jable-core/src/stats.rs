//! Grouped second-order statistics.
//!
//! Rows are grouped by the tuple of their group-column values and each
//! numeric column accumulates count, sum and sum of squares, enough for mean
//! and variance by the method of moments.

#![allow(clippy::cast_precision_loss)]

use crate::error::{Result, TableError};
use crate::table::{Row, Table};
use crate::value::ValueKey;
use indexmap::IndexMap;
use serde_json::Value;

/// Running power sums of one numeric column within one group.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Moments {
    /// Number of values.
    pub count: u64,
    /// Sum of values.
    pub sum: f64,
    /// Sum of squared values.
    pub sum_sq: f64,
}

impl Moments {
    /// Adds one observation.
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        self.sum += x;
        self.sum_sq += x * x;
    }

    /// Mean, or NaN with no observations.
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }

    /// Population variance, clamped at zero against rounding.
    #[must_use]
    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        (self.sum_sq / self.count as f64 - mean * mean).max(0.0)
    }

    /// Population standard deviation.
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Standard error of the mean.
    #[must_use]
    pub fn std_error(&self) -> f64 {
        (self.variance() / self.count as f64).sqrt()
    }

    /// `"mean (error)"` rounded to `digits` places.
    #[must_use]
    pub fn format(&self, format: &StatsFormat) -> String {
        let error = if format.standard_error {
            self.std_error()
        } else {
            self.std_dev()
        };
        let digits = format.digits;
        format!("{:.digits$} ({error:.digits$})", self.mean())
    }
}

/// Rendering of [`Moments`] in [`stats_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsFormat {
    /// Report the standard error of the mean instead of the standard
    /// deviation.
    pub standard_error: bool,
    /// Decimal places.
    pub digits: usize,
}

impl Default for StatsFormat {
    fn default() -> Self {
        Self {
            standard_error: true,
            digits: 3,
        }
    }
}

/// Per-group moments, in first-seen group order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecondOrderStats {
    groups: Vec<String>,
    numerics: Vec<String>,
    entries: IndexMap<Vec<ValueKey>, Vec<Moments>>,
}

impl SecondOrderStats {
    /// Group column names.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Numeric column names.
    #[must_use]
    pub fn numerics(&self) -> &[String] {
        &self.numerics
    }

    /// Number of distinct groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no rows were aggregated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Moments of `numeric` in the group with the given values.
    #[must_use]
    pub fn get(&self, group: &[Value], numeric: &str) -> Option<&Moments> {
        let key: Vec<ValueKey> = group.iter().cloned().map(ValueKey).collect();
        let position = self.numerics.iter().position(|n| n == numeric)?;
        self.entries.get(&key).and_then(|m| m.get(position))
    }

    /// Groups in first-seen order, with one [`Moments`] per numeric column.
    pub fn iter(&self) -> impl Iterator<Item = (Vec<&Value>, &[Moments])> + '_ {
        self.entries.iter().map(|(key, moments)| {
            (key.iter().map(|k| &k.0).collect(), moments.as_slice())
        })
    }
}

/// Aggregates `numerics` per distinct tuple of `groups` values.
///
/// # Errors
///
/// Returns `UnknownColumn` for an absent column and `NotNumeric` for a cell
/// of a numeric column that is not a number.
pub fn second_order_stats(
    table: &Table,
    groups: &[&str],
    numerics: &[&str],
) -> Result<SecondOrderStats> {
    if let Some(missing) = groups
        .iter()
        .chain(numerics)
        .find(|name| !table.contains_column(name))
    {
        return Err(TableError::UnknownColumn((*missing).to_string()));
    }

    let mut stats = SecondOrderStats {
        groups: groups.iter().map(|g| (*g).to_string()).collect(),
        numerics: numerics.iter().map(|n| (*n).to_string()).collect(),
        entries: IndexMap::new(),
    };
    for (position, row) in table.rows().enumerate() {
        let key = groups
            .iter()
            .map(|g| ValueKey(row.get(*g).cloned().unwrap_or(Value::Null)))
            .collect();
        let moments = stats
            .entries
            .entry(key)
            .or_insert_with(|| vec![Moments::default(); numerics.len()]);
        for (slot, name) in moments.iter_mut().zip(numerics) {
            let x = row
                .get(*name)
                .and_then(Value::as_f64)
                .ok_or_else(|| TableError::NotNumeric {
                    column: (*name).to_string(),
                    row: position,
                })?;
            slot.push(x);
        }
    }
    Ok(stats)
}

/// Builds a table of formatted statistics: one row per group, group columns
/// dictionary-encoded, numeric columns holding `"mean (error)"` strings.
///
/// # Errors
///
/// Returns `DuplicateColumn` if a name is both a group and a numeric column.
pub fn stats_table(stats: &SecondOrderStats, format: &StatsFormat) -> Result<Table> {
    if stats.is_empty() {
        return Ok(Table::new());
    }
    let numerics: Vec<&str> = stats.numerics.iter().map(String::as_str).collect();
    let groups: Vec<&str> = stats.groups.iter().map(String::as_str).collect();
    let mut table = Table::with_headers(Row::new(), &numerics, &groups)?;
    for (key, moments) in stats.iter() {
        let mut row = Row::with_capacity(groups.len() + numerics.len());
        for (name, value) in groups.iter().zip(key) {
            row.insert((*name).to_string(), value.clone());
        }
        for (name, m) in numerics.iter().zip(moments) {
            row.insert((*name).to_string(), Value::String(m.format(format)));
        }
        table.append_row(&row, true)?;
    }
    Ok(table)
}
