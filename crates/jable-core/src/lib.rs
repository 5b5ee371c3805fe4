//! # `Jable` Core
//!
//! Compressed, mutable, column-oriented table.
//!
//! Rows are addressed by position and columns by name. Each column is stored
//! in one of three modes, chosen per column and rewritten by consolidation:
//!
//! - **Constant**: one value shared by every row
//! - **Raw**: one literal value per row
//! - **Encoded**: one code per row into a deduplicated dictionary
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jable_core::{ConsolidateOptions, Predicate, Row, Table};
//! use serde_json::json;
//!
//! let mut table = Table::with_headers(Row::new(), &["id", "status"], &[])?;
//! for (id, status) in [(1, "open"), (2, "closed"), (3, "open")] {
//!     let row: Row = [("id".into(), json!(id)), ("status".into(), json!(status))]
//!         .into_iter()
//!         .collect();
//!     table.append_row(&row, true)?;
//! }
//!
//! // Rewrite storage modes from cardinality
//! let compact = table.consolidate(&ConsolidateOptions::default())?;
//!
//! // Query
//! let open = compact.filter(&Predicate::equal("status", "open"))?;
//! assert_eq!(open.len(), 2);
//!
//! // Persist
//! compact.write_file("table.json", true)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]

pub mod compression;
pub mod config;
pub mod consolidate;
pub mod error;
pub mod persistence;
pub mod predicate;
pub mod print;
pub mod stats;
pub mod table;
#[cfg(test)]
mod table_tests;
pub mod value;

pub use compression::Dictionary;
pub use config::{AppendConfig, ConfigError, ConsolidateConfig, JableConfig, PersistenceConfig};
pub use consolidate::{
    consolidate, consolidate_with_report, ColumnChange, ConsolidateOptions, ConsolidationReport,
    Threshold,
};
pub use error::{Result, TableError};
pub use persistence::{LoadOptions, TableParts};
pub use predicate::{matches, Predicate};
pub use print::{
    render_latex, render_stats_text, render_text, Alignment, ColumnWidth, LatexOptions,
    TextOptions, Widths,
};
pub use stats::{second_order_stats, stats_table, Moments, SecondOrderStats, StatsFormat};
pub use table::{
    Column, ColumnSelector, ColumnValues, FrameSource, MatchReport, Row, RowRange, RowSelector,
    Rows, Selection, StorageMode, Table,
};
pub use value::{compare_values, type_tag, values_equal, ValueKey};
