//! Table reconstruction from recognized page text.
//!
//! Recognized text carries no column metadata, so the reconstruction is a
//! heuristic: every non-blank line is a row and every whitespace-separated
//! token a cell. A multi-word cell therefore comes out as several cells.
//! Blank lines separate tables.

use crate::document::DocumentHandle;
use crate::error::Result;
use crate::ocr::{LayoutHint, TextRecognizer};
use crate::rendering::{RasterRenderer, RenderOptions};
use crate::table::RawTable;

/// Text recognized on a page together with the tables rebuilt from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrPage {
    /// Raw recognizer output
    pub text: String,
    /// Tables reconstructed from `text`, top to bottom
    pub tables: Vec<RawTable>,
}

/// Renders a page, recognizes it and rebuilds tables from the text.
pub struct OcrTableReconstructor {
    renderer: Box<dyn RasterRenderer>,
    recognizer: Box<dyn TextRecognizer>,
    options: RenderOptions,
    layout_hint: Option<LayoutHint>,
}

impl OcrTableReconstructor {
    /// Create a reconstructor rendering at `options.dpi`.
    pub fn new(
        renderer: Box<dyn RasterRenderer>,
        recognizer: Box<dyn TextRecognizer>,
        options: RenderOptions,
    ) -> Self {
        Self {
            renderer,
            recognizer,
            options,
            layout_hint: None,
        }
    }

    /// Pass an explicit layout hint with every recognition call.
    pub fn with_layout_hint(mut self, hint: Option<LayoutHint>) -> Self {
        self.layout_hint = hint;
        self
    }

    /// Rendering options used for every page.
    pub fn render_options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render and recognize the 1-based `page`, then rebuild its tables.
    pub fn reconstruct(&self, document: &DocumentHandle<'_>, page: usize) -> Result<OcrPage> {
        let image = self.renderer.render(document, page, &self.options)?;
        log::debug!(
            "'{}' page {}: rendered {}x{} at {} dpi",
            document.identifier(),
            page,
            image.width,
            image.height,
            image.dpi
        );
        let text = self.recognizer.recognize(&image, self.layout_hint)?;
        let tables = tables_from_text(&text);
        Ok(OcrPage { text, tables })
    }
}

/// Rebuild tables from recognized text.
///
/// Lines are split on line breaks; lines that are blank after trimming end
/// the current block; each non-empty block becomes one table whose rows are
/// the whitespace-separated tokens of its lines.
///
/// # Examples
///
/// ```
/// use pdf_tables::extractors::tables_from_text;
///
/// let tables = tables_from_text("A B\nC D\n\n");
/// assert_eq!(tables.len(), 1);
/// assert_eq!(tables[0].rows, vec![vec!["A", "B"], vec!["C", "D"]]);
/// ```
pub fn tables_from_text(text: &str) -> Vec<RawTable> {
    let mut tables = vec![];
    let mut rows: Vec<Vec<String>> = vec![];

    for line in text.lines() {
        if line.trim().is_empty() {
            if !rows.is_empty() {
                tables.push(RawTable::new(std::mem::take(&mut rows)));
            }
            continue;
        }
        rows.push(line.split_whitespace().map(str::to_string).collect());
    }
    if !rows.is_empty() {
        tables.push(RawTable::new(rows));
    }

    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::error::Error;
    use crate::rendering::{ImageFormat, RasterImage};
    use std::sync::{Arc, Mutex};

    struct BlankRenderer;

    impl RasterRenderer for BlankRenderer {
        fn render(
            &self,
            _document: &DocumentHandle<'_>,
            _page: usize,
            options: &RenderOptions,
        ) -> Result<RasterImage> {
            Ok(RasterImage {
                data: vec![],
                width: 10,
                height: 10,
                format: ImageFormat::Png,
                dpi: options.dpi,
            })
        }
    }

    struct FailingRenderer;

    impl RasterRenderer for FailingRenderer {
        fn render(
            &self,
            _document: &DocumentHandle<'_>,
            page: usize,
            _options: &RenderOptions,
        ) -> Result<RasterImage> {
            Err(Error::Render {
                page,
                reason: "corrupt page".to_string(),
            })
        }
    }

    struct CannedText {
        text: &'static str,
        seen: Arc<Mutex<Vec<(u32, Option<LayoutHint>)>>>,
    }

    impl TextRecognizer for CannedText {
        fn recognize(&self, image: &RasterImage, hint: Option<LayoutHint>) -> Result<String> {
            self.seen.lock().unwrap().push((image.dpi, hint));
            Ok(self.text.to_string())
        }
    }

    fn canned(text: &'static str) -> (Box<CannedText>, Arc<Mutex<Vec<(u32, Option<LayoutHint>)>>>) {
        let seen = Arc::new(Mutex::new(vec![]));
        let recognizer = Box::new(CannedText {
            text,
            seen: Arc::clone(&seen),
        });
        (recognizer, seen)
    }

    #[test]
    fn test_trailing_blank_line_discarded() {
        let tables = tables_from_text("A B\nC D\n\n");
        assert_eq!(tables, vec![RawTable::from_rows([vec!["A", "B"], vec!["C", "D"]])]);
    }

    #[test]
    fn test_whitespace_runs_split_tokens() {
        let tables = tables_from_text("  Item\t\tQty   Price \r\nBolt 12 0.10");
        assert_eq!(
            tables[0].rows,
            vec![vec!["Item", "Qty", "Price"], vec!["Bolt", "12", "0.10"]]
        );
    }

    #[test]
    fn test_blank_lines_separate_tables_in_order() {
        let tables = tables_from_text("a b\n   \nc\nd e f\n\n\ng");
        assert_eq!(tables.len(), 3);
        assert_eq!(tables[0].rows, vec![vec!["a", "b"]]);
        assert_eq!(tables[1].rows, vec![vec!["c"], vec!["d", "e", "f"]]);
        assert_eq!(tables[2].rows, vec![vec!["g"]]);
    }

    #[test]
    fn test_blank_text_yields_no_tables() {
        assert!(tables_from_text("").is_empty());
        assert!(tables_from_text("\n  \n\t\n").is_empty());
    }

    #[test]
    fn test_reconstruct_passes_dpi_and_hint() {
        let (recognizer, seen) = canned("x y");
        let reconstructor =
            OcrTableReconstructor::new(Box::new(BlankRenderer), recognizer, RenderOptions::with_dpi(300))
                .with_layout_hint(Some(LayoutHint::UniformBlock));
        let doc = Document::new("scan.pdf", b"%PDF-1.4".to_vec());
        let handle = DocumentHandle::new(&doc);

        let page = reconstructor.reconstruct(&handle, 1).unwrap();

        assert_eq!(page.text, "x y");
        assert_eq!(page.tables, vec![RawTable::from_rows([vec!["x", "y"]])]);
        assert_eq!(*seen.lock().unwrap(), vec![(300, Some(LayoutHint::UniformBlock))]);
    }

    #[test]
    fn test_render_failure_propagates() {
        let reconstructor = OcrTableReconstructor::new(
            Box::new(FailingRenderer),
            canned("unused").0,
            RenderOptions::default(),
        );
        let doc = Document::new("scan.pdf", b"%PDF-1.4".to_vec());
        let handle = DocumentHandle::new(&doc);

        let err = reconstructor.reconstruct(&handle, 2).unwrap_err();
        assert!(matches!(err, Error::Render { page: 2, .. }));
    }
}
