//! Spreadsheet table model and `.xlsx` reading/writing

pub mod codec;
pub mod table;

pub use codec::{find_latest_workbook, output_path_for, read_workbook, write_workbook};
pub use table::{Cell, Table};

use thiserror::Error;

/// Workbook read/write errors
#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("Unable to open workbook: {0}")]
    Open(#[from] calamine::Error),

    #[error("Workbook has no worksheets")]
    NoWorksheet,

    #[error("Unable to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error("Workbook too large to write: {0}")]
    TooLarge(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
