//! Error types for the table extraction pipeline.
//!
//! This module defines all error types that can occur while opening documents,
//! extracting tables from their pages and writing the output workbook.

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during table extraction.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The whole document could not be opened (unreadable, encrypted, corrupt)
    #[error("Failed to open document '{document}': {reason}")]
    DocumentOpen {
        /// Identifier of the document
        document: String,
        /// Reason for the failure
        reason: String,
    },

    /// A page could not be rasterized
    #[error("Failed to render page {page}: {reason}")]
    Render {
        /// 1-based page number
        page: usize,
        /// Reason for the failure
        reason: String,
    },

    /// The text recognizer is unavailable or crashed on its input
    #[error("Text recognition failed: {0}")]
    Recognition(String),

    /// The native text layer of a page could not be read
    #[error("Failed to read text layer of page {page}: {reason}")]
    Parse {
        /// 1-based page number
        page: usize,
        /// Reason for the failure
        reason: String,
    },

    /// The output workbook could not be assembled
    #[error("Workbook error: {0}")]
    Workbook(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Zip container error while writing the workbook
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a document-open error.
    pub fn document_open(document: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DocumentOpen {
            document: document.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error invalidates the whole document rather than one page.
    ///
    /// Every other variant raised while working on a page is recovered by the
    /// page state machine.
    pub fn is_document_fatal(&self) -> bool {
        matches!(self, Self::DocumentOpen { .. })
    }
}
