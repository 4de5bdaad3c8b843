//! Batch table extraction pipeline.
//!
//! ```text
//! Documents (submission order)
//!     ↓
//! [DocumentInspector] (open, page count)
//!     ↓
//! [PageExtractionCoordinator] per page
//!     ├─ [NativeTableExtractor]
//!     └─ [OcrTableReconstructor] (fallback)
//!     ↓
//! [TableNormalizer] (rectangular tables)
//!     ↓
//! [ResultAggregator] + [BatchErrorTracker]
//!     ↓
//! BatchResult → sheets → WorkbookWriter
//! ```
//!
//! Failures are isolated: a failed page costs that page, a document that
//! cannot be opened costs that document, and nothing aborts the batch.

pub mod aggregator;
pub mod coordinator;
pub mod errors;
pub mod normalizer;

pub use aggregator::{layout_sheets, sanitize_sheet_name, ResultAggregator, SheetNamer};
pub use coordinator::{ExtractionOutcome, PageExtractionCoordinator, PageReport, PageState};
pub use errors::{BatchError, BatchErrorTracker, ErrorScope};
pub use normalizer::TableNormalizer;

use crate::config::{AggregationMode, ExtractionConfig};
use crate::document::{Document, DocumentHandle};
use crate::error::Result;
use crate::extractors::{DocumentInspector, LayoutTableExtractor, OcrTableReconstructor};
use crate::ocr::{RecognizerConfig, TesseractRecognizer};
use crate::poppler::PopplerTools;
use crate::rendering::RenderOptions;
use crate::table::NormalizedTable;
use crate::workbook::Sheet;
use rayon::prelude::*;

/// Everything a batch run produced. Immutable once assembled.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    tables: Vec<NormalizedTable>,
    errors: Vec<BatchError>,
    documents_submitted: usize,
    documents_opened: usize,
    pages_processed: usize,
}

impl BatchResult {
    /// Extracted tables in sequence order.
    pub fn tables(&self) -> &[NormalizedTable] {
        &self.tables
    }

    /// Recorded failures in document and page order.
    pub fn errors(&self) -> &[BatchError] {
        &self.errors
    }

    /// Number of documents in the batch.
    pub fn documents_submitted(&self) -> usize {
        self.documents_submitted
    }

    /// Number of documents whose page count could be read.
    pub fn documents_opened(&self) -> usize {
        self.documents_opened
    }

    /// Number of pages that went through the coordinator.
    pub fn pages_processed(&self) -> usize {
        self.pages_processed
    }

    /// True when the batch yielded no table at all.
    pub fn nothing_extracted(&self) -> bool {
        self.tables.is_empty()
    }

    /// Lay the tables out into named worksheets.
    pub fn sheets(&self, mode: &AggregationMode) -> Vec<Sheet> {
        layout_sheets(&self.tables, mode)
    }
}

/// Outcome of one document, produced by a (possibly concurrent) worker.
#[derive(Debug, Clone)]
pub struct DocumentReport {
    /// Position of the document in the submitted batch
    pub arrival_index: usize,
    /// Document identifier
    pub identifier: String,
    /// Page count, when the document could be opened
    pub page_count: Option<usize>,
    /// Reports of the pages processed, in page order
    pub pages: Vec<PageReport>,
    /// Document-level failure, if processing of the document stopped early
    pub failure: Option<String>,
}

impl DocumentReport {
    fn new(arrival_index: usize, identifier: &str) -> Self {
        Self {
            arrival_index,
            identifier: identifier.to_string(),
            page_count: None,
            pages: Vec::new(),
            failure: None,
        }
    }
}

/// The document loop: opens documents and feeds their pages to the coordinator.
pub struct TableExtractionPipeline {
    inspector: Box<dyn DocumentInspector>,
    coordinator: PageExtractionCoordinator,
    jobs: usize,
}

impl TableExtractionPipeline {
    /// Create a sequential pipeline from its collaborators.
    pub fn new(inspector: Box<dyn DocumentInspector>, coordinator: PageExtractionCoordinator) -> Self {
        Self {
            inspector,
            coordinator,
            jobs: 1,
        }
    }

    /// Build the pipeline on the poppler tools and the tesseract engine.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        config.validate()?;
        let poppler = PopplerTools::new(config.tools.clone());
        let native = LayoutTableExtractor::new(poppler.clone(), config.native.clone());
        let recognizer = TesseractRecognizer::new(RecognizerConfig::from_extraction_config(config));
        let ocr = OcrTableReconstructor::new(
            Box::new(poppler.clone()),
            Box::new(recognizer),
            RenderOptions::with_dpi(config.dpi),
        );
        let coordinator = PageExtractionCoordinator::new(Box::new(native), ocr);
        Ok(Self::new(Box::new(poppler), coordinator).with_jobs(config.jobs))
    }

    /// Number of documents processed concurrently (at least 1).
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Process a whole batch, preserving submission order in the result.
    pub fn run(&self, documents: &[Document]) -> BatchResult {
        log::info!("Processing {} documents with {} workers", documents.len(), self.jobs);
        let reports = if self.jobs > 1 && documents.len() > 1 {
            self.run_parallel(documents)
        } else {
            self.run_sequential(documents)
        };
        let result = Self::assemble(documents.len(), reports);
        log::info!(
            "Batch done: {} tables, {} errors",
            result.tables().len(),
            result.errors().len()
        );
        result
    }

    fn run_sequential(&self, documents: &[Document]) -> Vec<DocumentReport> {
        documents
            .iter()
            .enumerate()
            .map(|(index, document)| self.process_document(index, document))
            .collect()
    }

    fn run_parallel(&self, documents: &[Document]) -> Vec<DocumentReport> {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .thread_name(|i| format!("pdf-tables-{}", i))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                log::warn!("Failed to start worker pool, processing sequentially: {}", e);
                return self.run_sequential(documents);
            },
        };
        pool.install(|| {
            documents
                .par_iter()
                .enumerate()
                .map(|(index, document)| self.process_document(index, document))
                .collect()
        })
    }

    /// Process one document; `arrival_index` is its position in the batch.
    ///
    /// Never fails: a document that cannot be opened yields a report with a
    /// `failure` and no pages.
    pub fn process_document(&self, arrival_index: usize, document: &Document) -> DocumentReport {
        let mut report = DocumentReport::new(arrival_index, document.identifier());
        if let Err(e) = document.check_header() {
            log::warn!("Skipping '{}': {}", document.identifier(), e);
            report.failure = Some(e.to_string());
            return report;
        }

        let handle = DocumentHandle::new(document);
        let page_count = match self.inspector.page_count(&handle) {
            Ok(count) => count,
            Err(e) => {
                log::warn!("Skipping '{}': {}", document.identifier(), e);
                report.failure = Some(e.to_string());
                return report;
            },
        };
        report.page_count = Some(page_count);
        log::info!("'{}': {} pages", document.identifier(), page_count);

        for page in 1..=page_count {
            match self.coordinator.extract_page(&handle, page) {
                Ok(page_report) => {
                    log::info!(
                        "'{}' page {}/{}: {:?}, {} tables",
                        document.identifier(),
                        page,
                        page_count,
                        page_report.state(),
                        page_report.outcome.tables().len()
                    );
                    report.pages.push(page_report);
                },
                Err(e) => {
                    log::warn!(
                        "'{}': stopped at page {}: {}",
                        document.identifier(),
                        page,
                        e
                    );
                    report.failure = Some(e.to_string());
                    break;
                },
            }
        }
        report
    }

    /// Replay document reports into the aggregator and error tracker.
    ///
    /// Reports are ordered by arrival index first, so the result does not
    /// depend on the order in which workers finished.
    pub fn assemble(documents_submitted: usize, mut reports: Vec<DocumentReport>) -> BatchResult {
        reports.sort_by_key(|report| report.arrival_index);

        let mut aggregator = ResultAggregator::new();
        let mut tracker = BatchErrorTracker::new();
        let mut documents_opened = 0;
        let mut pages_processed = 0;

        for report in reports {
            if report.page_count.is_some() {
                documents_opened += 1;
            }
            pages_processed += report.pages.len();
            for page in report.pages {
                match page.outcome {
                    ExtractionOutcome::Success(tables) => aggregator.extend(tables),
                    ExtractionOutcome::Failed(reason) => {
                        tracker.record_page(report.identifier.as_str(), page.page, reason)
                    },
                    ExtractionOutcome::Empty => tracker.record_page(
                        report.identifier.as_str(),
                        page.page,
                        "no tables found",
                    ),
                }
            }
            if let Some(reason) = report.failure {
                tracker.record_document(report.identifier, reason);
            }
        }

        BatchResult {
            tables: aggregator.finalize(),
            errors: tracker.into_errors(),
            documents_submitted,
            documents_opened,
            pages_processed,
        }
    }
}
