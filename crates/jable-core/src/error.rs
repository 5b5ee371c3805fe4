//! Error types for `Jable`.
//!
//! One error enum covers every table operation. Each variant carries a stable
//! code of the form `JABLE-XXX` for easy matching in logs and bindings.

use serde_json::Value;
use thiserror::Error;

/// Result type alias for table operations.
pub type Result<T> = std::result::Result<T, TableError>;

/// Errors that can occur in table operations.
///
/// Every failure is returned to the caller; the table never retries or logs
/// an error on its own.
#[derive(Error, Debug)]
pub enum TableError {
    /// Column name is not present in the table (JABLE-001).
    #[error("[JABLE-001] Unknown column '{0}'")]
    UnknownColumn(String),

    /// Row position outside the valid range (JABLE-002).
    #[error("[JABLE-002] Row {row} out of range for table of length {len}")]
    RowOutOfRange {
        /// Requested row position.
        row: usize,
        /// Table length at the time of the call.
        len: usize,
    },

    /// A multi-row or multi-column selection resolved to nothing (JABLE-003).
    #[error("[JABLE-003] Empty selection: {0}")]
    EmptySelection(String),

    /// Predicate could not be interpreted (JABLE-004).
    #[error("[JABLE-004] Invalid predicate: {0}")]
    InvalidPredicate(String),

    /// A row disagrees with a constant column's fixed value (JABLE-005).
    #[error("[JABLE-005] Constant column '{column}' is fixed to {expected}, got {actual}")]
    FixedValueConflict {
        /// Constant column name.
        column: String,
        /// The column's fixed value.
        expected: Value,
        /// The value supplied by the caller.
        actual: Value,
    },

    /// Bulk column data does not match the table length (JABLE-006).
    #[error("[JABLE-006] Column '{column}' has length {actual}, expected {expected}")]
    LengthMismatch {
        /// Column name.
        column: String,
        /// Table length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// Persisted data does not follow the table layout (JABLE-007).
    #[error("[JABLE-007] Malformed persisted data: {0}")]
    MalformedPersistedData(String),

    /// Strict append without a value for a per-row column (JABLE-008).
    #[error("[JABLE-008] Missing value for column '{0}'")]
    MissingColumn(String),

    /// Per-row access attempted on a constant column (JABLE-009).
    #[error("[JABLE-009] Column '{0}' is constant and has no per-row values")]
    ConstantColumn(String),

    /// Column name already taken (JABLE-010).
    #[error("[JABLE-010] Column '{0}' already exists")]
    DuplicateColumn(String),

    /// Column maps violate the table layout (JABLE-011).
    #[error("[JABLE-011] Invalid table layout: {0}")]
    InvalidLayout(String),

    /// Consolidation threshold cannot be resolved (JABLE-012).
    #[error("[JABLE-012] Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// Row range cannot be resolved (JABLE-013).
    #[error("[JABLE-013] Invalid row range: {0}")]
    InvalidRange(String),

    /// No row matched where exactly one was expected (JABLE-014).
    #[error("[JABLE-014] No row matches the predicate")]
    NoMatch,

    /// Several rows matched where exactly one was expected (JABLE-015).
    #[error("[JABLE-015] Expected one matching row, found {0}")]
    AmbiguousMatch(usize),

    /// A numeric aggregate met a non-numeric cell (JABLE-016).
    #[error("[JABLE-016] Column '{column}' holds a non-numeric value at row {row}")]
    NotNumeric {
        /// Column name.
        column: String,
        /// Row position.
        row: usize,
    },

    /// IO error (JABLE-017).
    #[error("[JABLE-017] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (JABLE-018).
    #[error("[JABLE-018] Serialization error: {0}")]
    Serialization(String),
}

impl TableError {
    /// Returns the error code (e.g., "JABLE-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnknownColumn(_) => "JABLE-001",
            Self::RowOutOfRange { .. } => "JABLE-002",
            Self::EmptySelection(_) => "JABLE-003",
            Self::InvalidPredicate(_) => "JABLE-004",
            Self::FixedValueConflict { .. } => "JABLE-005",
            Self::LengthMismatch { .. } => "JABLE-006",
            Self::MalformedPersistedData(_) => "JABLE-007",
            Self::MissingColumn(_) => "JABLE-008",
            Self::ConstantColumn(_) => "JABLE-009",
            Self::DuplicateColumn(_) => "JABLE-010",
            Self::InvalidLayout(_) => "JABLE-011",
            Self::InvalidThreshold(_) => "JABLE-012",
            Self::InvalidRange(_) => "JABLE-013",
            Self::NoMatch => "JABLE-014",
            Self::AmbiguousMatch(_) => "JABLE-015",
            Self::NotNumeric { .. } => "JABLE-016",
            Self::Io(_) => "JABLE-017",
            Self::Serialization(_) => "JABLE-018",
        }
    }

    /// Returns true if this error is recoverable.
    ///
    /// Non-recoverable errors point at corrupt input data rather than a bad
    /// argument: malformed files and layouts that break the table invariants.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::MalformedPersistedData(_) | Self::InvalidLayout(_)
        )
    }
}

impl From<serde_json::Error> for TableError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
