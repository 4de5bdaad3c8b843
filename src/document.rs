//! Batch input documents and their scoped staging handles.

use crate::error::{Error, Result};
use std::cell::OnceCell;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// How far into the file the `%PDF-` marker may appear.
///
/// Readers tolerate leading garbage before the header, so the check does too.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// One submitted PDF: an identifier unique within the batch and its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    identifier: String,
    bytes: Vec<u8>,
    load_error: Option<String>,
}

impl Document {
    /// Create a document from its identifier and raw content.
    pub fn new(identifier: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            identifier: identifier.into(),
            bytes: bytes.into(),
            load_error: None,
        }
    }

    /// A submitted document whose content could not be read.
    ///
    /// It stays in the batch so the failure is reported at its position.
    pub fn unreadable(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            bytes: Vec::new(),
            load_error: Some(reason.into()),
        }
    }

    /// Read a document from disk, using the file name as identifier.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let identifier = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = std::fs::read(path)?;
        Ok(Self::new(identifier, bytes))
    }

    /// Identifier of the document within its batch.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Raw PDF bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Why the content could not be read, for [`Document::unreadable`].
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Check that the content looks like a PDF at all.
    ///
    /// Returns a [`Error::DocumentOpen`] when the content could not be read,
    /// or when the `%PDF-` marker does not occur within the first
    /// `HEADER_SEARCH_WINDOW` (1024) bytes.
    pub fn check_header(&self) -> Result<()> {
        if let Some(reason) = &self.load_error {
            return Err(Error::document_open(&self.identifier, reason.clone()));
        }
        if self.bytes.is_empty() {
            return Err(Error::document_open(&self.identifier, "document is empty"));
        }
        let window = &self.bytes[..self.bytes.len().min(HEADER_SEARCH_WINDOW)];
        if window.windows(5).any(|w| w == b"%PDF-") {
            Ok(())
        } else {
            Err(Error::document_open(
                &self.identifier,
                "missing %PDF- header",
            ))
        }
    }
}

/// A document while it is being processed.
///
/// Collaborators that need a file on disk call [`DocumentHandle::path`]; the
/// bytes are written to a temporary file on first use and the file is removed
/// when the handle is dropped, whichever way processing of the document ends.
#[derive(Debug)]
pub struct DocumentHandle<'a> {
    document: &'a Document,
    staged: OnceCell<NamedTempFile>,
}

impl<'a> DocumentHandle<'a> {
    /// Open a handle over a document. Nothing is staged yet.
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            staged: OnceCell::new(),
        }
    }

    /// The underlying document.
    pub fn document(&self) -> &'a Document {
        self.document
    }

    /// Identifier of the underlying document.
    pub fn identifier(&self) -> &'a str {
        self.document.identifier()
    }

    /// Raw PDF bytes of the underlying document.
    pub fn bytes(&self) -> &'a [u8] {
        self.document.bytes()
    }

    /// Whether the bytes have been staged to disk.
    pub fn is_staged(&self) -> bool {
        self.staged.get().is_some()
    }

    /// Path of the staged copy of the document, staging it if needed.
    ///
    /// A staging failure is reported as [`Error::DocumentOpen`]: without the
    /// file none of the file-based collaborators can read the document.
    pub fn path(&self) -> Result<&Path> {
        if let Some(file) = self.staged.get() {
            return Ok(file.path());
        }
        let file = self.stage().map_err(|e| {
            Error::document_open(self.identifier(), format!("failed to stage document: {}", e))
        })?;
        log::debug!("Staged '{}' at {}", self.identifier(), file.path().display());
        Ok(self.staged.get_or_init(|| file).path())
    }

    fn stage(&self) -> std::io::Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("pdf_tables_")
            .suffix(".pdf")
            .tempfile()?;
        file.write_all(self.document.bytes())?;
        file.flush()?;
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_header_accepts_pdf() {
        let doc = Document::new("a.pdf", b"%PDF-1.7\n...".to_vec());
        assert!(doc.check_header().is_ok());
    }

    #[test]
    fn test_check_header_tolerates_leading_garbage() {
        let mut bytes = vec![b' '; 100];
        bytes.extend_from_slice(b"%PDF-1.4");
        assert!(Document::new("a.pdf", bytes).check_header().is_ok());
    }

    #[test]
    fn test_check_header_rejects_other_content() {
        let err = Document::new("notes.pdf", b"hello world".to_vec())
            .check_header()
            .unwrap_err();
        assert!(err.is_document_fatal());
        assert!(format!("{}", err).contains("notes.pdf"));

        assert!(Document::new("empty.pdf", Vec::new()).check_header().is_err());
    }

    #[test]
    fn test_check_header_rejects_marker_past_search_window() {
        let mut bytes = vec![b' '; HEADER_SEARCH_WINDOW];
        bytes.extend_from_slice(b"%PDF-1.4");
        assert!(Document::new("late.pdf", bytes).check_header().is_err());
    }

    #[test]
    fn test_unreadable_document_fails_header_check_with_reason() {
        let doc = Document::unreadable("gone.pdf", "No such file or directory");
        assert_eq!(doc.load_error(), Some("No such file or directory"));

        let err = doc.check_header().unwrap_err();
        assert!(err.is_document_fatal());
        let message = format!("{}", err);
        assert!(message.contains("gone.pdf"));
        assert!(message.contains("No such file or directory"));
    }

    #[test]
    fn test_handle_stages_once_and_cleans_up() {
        let doc = Document::new("a.pdf", b"%PDF-1.7 body".to_vec());
        let staged_path;
        {
            let handle = DocumentHandle::new(&doc);
            assert!(!handle.is_staged());
            let first = handle.path().unwrap().to_path_buf();
            let second = handle.path().unwrap().to_path_buf();
            assert_eq!(first, second);
            assert_eq!(std::fs::read(&first).unwrap(), doc.bytes());
            staged_path = first;
        }
        assert!(!staged_path.exists());
    }

    #[test]
    fn test_from_path_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.pdf");
        std::fs::write(&path, b"%PDF-1.5").unwrap();

        let doc = Document::from_path(&path).unwrap();
        assert_eq!(doc.identifier(), "invoice.pdf");
        assert_eq!(doc.bytes(), b"%PDF-1.5");
    }
}
