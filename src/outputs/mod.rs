//! Output generation.
//!
//! - [`json`]: writes the harmonized dataset as a JSON array
//!
//! Tabular export (CSV and friends) is left to downstream tools reading
//! that file.

pub mod json;
