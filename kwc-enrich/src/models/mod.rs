//! Data models for workbook processing

pub mod columns;
pub mod processing_result;

pub use processing_result::{ProcessingResult, RowError};
