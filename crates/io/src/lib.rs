//! `funclib-io`: sheet export I/O.
//!
//! Fetches one spreadsheet tab at a time from the public CSV export
//! endpoint and turns the body into a [`TabularData`]. Everything past
//! this crate is string-based: cells are never typed.

pub mod csv;
pub mod error;
pub mod fetch;
pub mod table;

pub use error::FetchError;
pub use fetch::{CsvFetcher, SheetSource};
pub use table::TabularData;
