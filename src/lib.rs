// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::type_complexity)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # pdf_tables
//!
//! Batch extraction of tables from PDF documents into a spreadsheet workbook.
//!
//! ## Core Features
//!
//! - **Native extraction first**: tables are grouped from the positioned words
//!   of a page's text layer by vertical and horizontal alignment
//! - **OCR fallback**: pages without usable native tables are rendered and
//!   recognized, and rows and cells are rebuilt from the recognized text
//! - **Normalization**: ragged tables are padded into rectangular ones
//! - **Aggregation**: tables keep document, page and in-page order; worksheet
//!   names stay unique and within the 31 character limit
//! - **Failure isolation**: a broken page or document is recorded and skipped,
//!   the batch always completes
//! - **XLSX output**: one worksheet per table, or all tables in one worksheet
//!
//! ## Architecture
//!
//! External work is behind traits ([`extractors::DocumentInspector`],
//! [`extractors::TextLayerSource`], [`rendering::RasterRenderer`],
//! [`ocr::TextRecognizer`], [`workbook::WorkbookWriter`]). The bundled
//! implementations shell out to poppler and tesseract.
//!
//! ## Quick Start
//!
//! ```ignore
//! use pdf_tables::{Document, ExtractionConfig, TableExtractionPipeline};
//! use pdf_tables::workbook::{WorkbookWriter, XlsxWriter};
//!
//! # fn main() -> pdf_tables::Result<()> {
//! let config = ExtractionConfig::new();
//! let pipeline = TableExtractionPipeline::from_config(&config)?;
//!
//! let documents = vec![Document::from_path("invoice.pdf")?];
//! let result = pipeline.run(&documents);
//!
//! for error in result.errors() {
//!     eprintln!("{}", error);
//! }
//! XlsxWriter::new().write_to_path(&result.sheets(&config.aggregation), "tables.xlsx".as_ref())?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Core types
pub mod document;
pub mod geometry;
pub mod table;

// Collaborator boundaries
pub mod extractors;
pub mod ocr;
pub mod rendering;
pub mod workbook;

// Bundled collaborators
pub mod poppler;
mod process;

// Batch pipeline
pub mod pipeline;

// Re-exports
pub use config::{AggregationMode, ExtractionConfig, LayoutConfig, ToolPaths};
pub use document::{Document, DocumentHandle};
pub use error::{Error, Result};
pub use pipeline::{BatchError, BatchResult, ErrorScope, TableExtractionPipeline};
pub use table::{ExtractionMethod, NormalizedTable, RawTable, TableOrigin};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
