//! Table extractors and the document-level collaborator contracts they use.
//!
//! Two extraction strategies exist for a page:
//!
//! - [`NativeTableExtractor`]: reads tables from the page's embedded text
//!   layer. Cheap, tried first. [`LayoutTableExtractor`] implements it on top
//!   of any [`TextLayerSource`].
//! - [`OcrTableReconstructor`]: renders the page, recognizes its text and
//!   rebuilds rows and cells from whitespace. Used only as a fallback.

mod native;
mod ocr;

pub use native::{detect_tables, LayoutTableExtractor};
pub use ocr::{tables_from_text, OcrTableReconstructor};

use crate::document::DocumentHandle;
use crate::error::Result;
use crate::geometry::Rect;
use crate::table::RawTable;

/// Opens documents and reports their page count.
pub trait DocumentInspector: Send + Sync {
    /// Number of pages of `document`.
    ///
    /// Fails with [`crate::Error::DocumentOpen`] when the document cannot be
    /// opened at all.
    fn page_count(&self, document: &DocumentHandle<'_>) -> Result<usize>;
}

/// A word of the native text layer with its bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextWord {
    /// Word text
    pub text: String,
    /// Bounding box in page space (top-left origin)
    pub bbox: Rect,
}

impl TextWord {
    /// Create a positioned word.
    pub fn new(text: impl Into<String>, bbox: Rect) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// Provides the positioned words of a page's text layer.
pub trait TextLayerSource: Send + Sync {
    /// Words of the 1-based `page`, in any order.
    ///
    /// A page without a text layer yields an empty vector. Fails with
    /// [`crate::Error::Parse`] when the layer cannot be read.
    fn words(&self, document: &DocumentHandle<'_>, page: usize) -> Result<Vec<TextWord>>;
}

/// Extracts tables directly from a page's embedded layout.
pub trait NativeTableExtractor: Send + Sync {
    /// Tables found on the 1-based `page`.
    ///
    /// An empty vector means the page is not amenable to native extraction;
    /// it is not an error.
    fn extract_tables(&self, document: &DocumentHandle<'_>, page: usize) -> Result<Vec<RawTable>>;
}
