//! Column compression for `Jable`.
//!
//! Per-row columns with few distinct values are stored as a deduplicated
//! value list (the dictionary) plus one integer code per row.

mod dictionary;

pub use dictionary::Dictionary;
