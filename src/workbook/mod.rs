//! Spreadsheet output boundary.

mod xlsx;

pub use xlsx::XlsxWriter;

use crate::error::Result;
use std::io::{Seek, Write};
use std::path::Path;

/// A named worksheet of string cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    /// Worksheet name, already unique and valid
    pub name: String,
    /// Rows written verbatim
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Create a sheet.
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

/// Serializes worksheets into a spreadsheet artifact.
pub trait WorkbookWriter {
    /// Write `sheets` to `out`, in order.
    ///
    /// An empty slice still produces a valid workbook with one blank sheet.
    fn write<W: Write + Seek>(&self, sheets: &[Sheet], out: W) -> Result<()>;

    /// Write `sheets` to a file at `path`.
    fn write_to_path(&self, sheets: &[Sheet], path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write(sheets, std::io::BufWriter::new(file))
    }
}
