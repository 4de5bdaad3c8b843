//! Per-page strategy selection.
//!
//! Every page walks the same state machine:
//!
//! ```text
//! Init -> NativeAttempted -> NativeSuccess
//!                         -> FallbackOcr -> OcrAttempted -> OcrSuccess
//!                                                        -> PageFailed
//! ```
//!
//! Native extraction is tried first. Zero tables and a recoverable native
//! error both fall back to OCR. A page that OCR cannot rescue ends in
//! `PageFailed` and contributes no tables. Only a document-open failure
//! escapes the page; it belongs to the document loop.

use super::normalizer::TableNormalizer;
use crate::document::DocumentHandle;
use crate::error::Result;
use crate::extractors::{NativeTableExtractor, OcrTableReconstructor};
use crate::table::{ExtractionMethod, NormalizedTable, RawTable, TableOrigin};

/// State of a page in the extraction state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    /// Nothing attempted yet
    Init,
    /// Native extraction has run
    NativeAttempted,
    /// Native extraction produced tables (terminal)
    NativeSuccess,
    /// Native extraction produced nothing or failed; OCR is next
    FallbackOcr,
    /// OCR reconstruction has run
    OcrAttempted,
    /// OCR produced tables (terminal)
    OcrSuccess,
    /// Neither strategy produced a table (terminal)
    PageFailed,
}

impl PageState {
    /// Whether the page is done in this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NativeSuccess | Self::OcrSuccess | Self::PageFailed)
    }
}

/// Result of one extraction attempt, and finally of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// At least one non-empty table
    Success(Vec<NormalizedTable>),
    /// The strategy ran but found no table
    Empty,
    /// The page produced no table; carries the reason
    Failed(String),
}

impl ExtractionOutcome {
    fn from_tables(tables: Vec<NormalizedTable>) -> Self {
        if tables.is_empty() {
            Self::Empty
        } else {
            Self::Success(tables)
        }
    }

    /// Tables of a successful outcome; empty otherwise.
    pub fn tables(&self) -> &[NormalizedTable] {
        match self {
            Self::Success(tables) => tables,
            _ => &[],
        }
    }

    /// Whether the outcome carries tables.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// What happened to one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    /// 1-based page number
    pub page: usize,
    /// States visited, in order, starting with [`PageState::Init`]
    pub states: Vec<PageState>,
    /// Final outcome: [`ExtractionOutcome::Success`] or [`ExtractionOutcome::Failed`]
    pub outcome: ExtractionOutcome,
    /// Native extraction failure, if native extraction raised an error
    pub native_error: Option<String>,
    /// Recognized text, if OCR ran and the recognizer returned
    pub ocr_text: Option<String>,
}

impl PageReport {
    fn new(page: usize) -> Self {
        Self {
            page,
            states: vec![PageState::Init],
            outcome: ExtractionOutcome::Empty,
            native_error: None,
            ocr_text: None,
        }
    }

    fn enter(&mut self, state: PageState) {
        log::debug!("page {}: {:?} -> {:?}", self.page, self.state(), state);
        self.states.push(state);
    }

    /// Current (after extraction: terminal) state.
    pub fn state(&self) -> PageState {
        self.states.last().copied().unwrap_or(PageState::Init)
    }

    /// Failure reason of a failed page.
    pub fn failure(&self) -> Option<&str> {
        match &self.outcome {
            ExtractionOutcome::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Drives one page through native extraction and, if needed, OCR.
pub struct PageExtractionCoordinator {
    native: Box<dyn NativeTableExtractor>,
    ocr: OcrTableReconstructor,
    normalizer: TableNormalizer,
}

impl PageExtractionCoordinator {
    /// Create a coordinator from its two strategies.
    pub fn new(native: Box<dyn NativeTableExtractor>, ocr: OcrTableReconstructor) -> Self {
        Self {
            native,
            ocr,
            normalizer: TableNormalizer,
        }
    }

    /// Extract the tables of the 1-based `page`.
    ///
    /// Page-level failures end up in the report as
    /// [`ExtractionOutcome::Failed`]. `Err` is returned only for errors that
    /// invalidate the whole document.
    pub fn extract_page(&self, document: &DocumentHandle<'_>, page: usize) -> Result<PageReport> {
        let mut report = PageReport::new(page);

        report.enter(PageState::NativeAttempted);
        match self.native.extract_tables(document, page) {
            Ok(raw) => {
                let outcome = self.normalize(document, page, raw, ExtractionMethod::Native);
                if outcome.is_success() {
                    report.enter(PageState::NativeSuccess);
                    report.outcome = outcome;
                    return Ok(report);
                }
            },
            Err(e) if e.is_document_fatal() => return Err(e),
            Err(e) => {
                log::warn!(
                    "'{}' page {}: native extraction failed, trying OCR: {}",
                    document.identifier(),
                    page,
                    e
                );
                report.native_error = Some(e.to_string());
            },
        }

        report.enter(PageState::FallbackOcr);
        report.enter(PageState::OcrAttempted);
        let ocr_result = match self.ocr.reconstruct(document, page) {
            Ok(ocr_page) => {
                log::debug!(
                    "'{}' page {}: recognized text:\n{}",
                    document.identifier(),
                    page,
                    ocr_page.text
                );
                report.ocr_text = Some(ocr_page.text);
                Ok(self.normalize(document, page, ocr_page.tables, ExtractionMethod::Ocr))
            },
            Err(e) if e.is_document_fatal() => return Err(e),
            Err(e) => Err(e.to_string()),
        };

        match ocr_result {
            Ok(outcome @ ExtractionOutcome::Success(_)) => {
                report.enter(PageState::OcrSuccess);
                report.outcome = outcome;
            },
            Ok(_) => {
                report.enter(PageState::PageFailed);
                report.outcome =
                    ExtractionOutcome::Failed(failure_reason(report.native_error.as_deref(), None));
            },
            Err(ocr_error) => {
                report.enter(PageState::PageFailed);
                report.outcome = ExtractionOutcome::Failed(failure_reason(
                    report.native_error.as_deref(),
                    Some(&ocr_error),
                ));
            },
        }
        Ok(report)
    }

    fn normalize(
        &self,
        document: &DocumentHandle<'_>,
        page: usize,
        raw: Vec<RawTable>,
        method: ExtractionMethod,
    ) -> ExtractionOutcome {
        let tables = self.normalizer.normalize_page(raw, |index_in_page| TableOrigin {
            document: document.identifier().to_string(),
            page,
            index_in_page,
            method,
        });
        ExtractionOutcome::from_tables(tables)
    }
}

fn failure_reason(native_error: Option<&str>, ocr_error: Option<&str>) -> String {
    let native = match native_error {
        Some(e) => format!("native extraction failed ({})", e),
        None => "no native tables".to_string(),
    };
    let ocr = match ocr_error {
        Some(e) => format!("OCR failed ({})", e),
        None => "OCR found no tables".to_string(),
    };
    format!("{}; {}", native, ocr)
}
