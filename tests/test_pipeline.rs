//! Integration tests for the batch pipeline.
//!
//! Drives the document loop with in-memory collaborators: page counts, native
//! tables and recognized text are fixed per test.

use pdf_tables::extractors::{DocumentInspector, NativeTableExtractor, OcrTableReconstructor};
use pdf_tables::ocr::{LayoutHint, TextRecognizer};
use pdf_tables::pipeline::{PageExtractionCoordinator, PageState};
use pdf_tables::rendering::{ImageFormat, RasterImage, RasterRenderer, RenderOptions};
use pdf_tables::{
    AggregationMode, Document, DocumentHandle, Error, ErrorScope, ExtractionMethod, RawTable,
    Result, TableExtractionPipeline,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// =============================================================================
// FAKE COLLABORATORS
// =============================================================================

struct FakeInspector {
    pages: HashMap<String, std::result::Result<usize, String>>,
}

impl DocumentInspector for FakeInspector {
    fn page_count(&self, document: &DocumentHandle<'_>) -> Result<usize> {
        match self.pages.get(document.identifier()) {
            Some(Ok(count)) => Ok(*count),
            Some(Err(reason)) => Err(Error::document_open(document.identifier(), reason.clone())),
            None => Err(Error::document_open(document.identifier(), "unknown document")),
        }
    }
}

struct FakeNative {
    tables: HashMap<(String, usize), Vec<RawTable>>,
    fatal: HashSet<(String, usize)>,
    calls: Arc<AtomicUsize>,
}

impl NativeTableExtractor for FakeNative {
    fn extract_tables(&self, document: &DocumentHandle<'_>, page: usize) -> Result<Vec<RawTable>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = (document.identifier().to_string(), page);
        if self.fatal.contains(&key) {
            return Err(Error::document_open(document.identifier(), "stream truncated"));
        }
        Ok(self
            .tables
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }
}

struct FakeRenderer {
    renders: Arc<AtomicUsize>,
}

impl RasterRenderer for FakeRenderer {
    fn render(
        &self,
        _document: &DocumentHandle<'_>,
        _page: usize,
        options: &RenderOptions,
    ) -> Result<RasterImage> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        Ok(RasterImage {
            data: vec![],
            width: 100,
            height: 100,
            format: ImageFormat::Png,
            dpi: options.dpi,
        })
    }
}

struct FakeRecognizer {
    text: String,
}

impl TextRecognizer for FakeRecognizer {
    fn recognize(&self, _image: &RasterImage, _hint: Option<LayoutHint>) -> Result<String> {
        Ok(self.text.clone())
    }
}

/// Fixed collaborator behaviour for one test.
#[derive(Default)]
struct Fixture {
    pages: HashMap<String, std::result::Result<usize, String>>,
    native: HashMap<(String, usize), Vec<RawTable>>,
    fatal: HashSet<(String, usize)>,
    ocr_text: String,
}

impl Fixture {
    fn document(mut self, identifier: &str, pages: usize) -> Self {
        self.pages.insert(identifier.to_string(), Ok(pages));
        self
    }

    fn unopenable(mut self, identifier: &str, reason: &str) -> Self {
        self.pages.insert(identifier.to_string(), Err(reason.to_string()));
        self
    }

    fn native(mut self, identifier: &str, page: usize, tables: Vec<RawTable>) -> Self {
        self.native.insert((identifier.to_string(), page), tables);
        self
    }

    /// The document becomes unreadable when `page` is reached.
    fn fails_at(mut self, identifier: &str, page: usize) -> Self {
        self.fatal.insert((identifier.to_string(), page));
        self
    }

    fn ocr_text(mut self, text: &str) -> Self {
        self.ocr_text = text.to_string();
        self
    }
}

struct Harness {
    pipeline: TableExtractionPipeline,
    native_calls: Arc<AtomicUsize>,
    renders: Arc<AtomicUsize>,
}

fn harness(fixture: Fixture) -> Harness {
    let native_calls = Arc::new(AtomicUsize::new(0));
    let renders = Arc::new(AtomicUsize::new(0));
    let ocr = OcrTableReconstructor::new(
        Box::new(FakeRenderer {
            renders: Arc::clone(&renders),
        }),
        Box::new(FakeRecognizer {
            text: fixture.ocr_text,
        }),
        RenderOptions::default(),
    );
    let native = FakeNative {
        tables: fixture.native,
        fatal: fixture.fatal,
        calls: Arc::clone(&native_calls),
    };
    let coordinator = PageExtractionCoordinator::new(Box::new(native), ocr);
    let pipeline = TableExtractionPipeline::new(
        Box::new(FakeInspector {
            pages: fixture.pages,
        }),
        coordinator,
    );
    Harness {
        pipeline,
        native_calls,
        renders,
    }
}

fn pdf(identifier: &str) -> Document {
    Document::new(identifier, b"%PDF-1.7\n%fake".to_vec())
}

fn grid(rows: &[&[&str]]) -> RawTable {
    RawTable::from_rows(rows.iter().map(|row| row.iter().copied()))
}

// =============================================================================
// SCENARIOS
// =============================================================================

mod scenario_tests {
    use super::*;

    #[test]
    fn test_native_table_becomes_one_worksheet() {
        let h = harness(Fixture::default().document("a.pdf", 1).native(
            "a.pdf",
            1,
            vec![grid(&[&["Item", "Qty"], &["Bolt", "12"], &["Nut", "40"]])],
        ));

        let result = h.pipeline.run(&[pdf("a.pdf")]);
        let sheets = result.sheets(&AggregationMode::MultiSheet);

        assert!(result.errors().is_empty());
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, "a.pdf_page_1");
        assert_eq!(sheets[0].rows.len(), 3);
        assert!(sheets[0].rows.iter().all(|row| row.len() == 2));
        assert_eq!(h.renders.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_scanned_page_reconstructed_from_ocr_text() {
        let h = harness(Fixture::default().document("scan.pdf", 1).ocr_text("A B\nC D\n\n"));

        let result = h.pipeline.run(&[pdf("scan.pdf")]);

        assert_eq!(result.tables().len(), 1);
        let table = &result.tables()[0];
        assert_eq!(table.rows(), &[vec!["A", "B"], vec!["C", "D"]]);
        assert_eq!(table.origin().method, ExtractionMethod::Ocr);
        assert!(result.errors().is_empty());
    }

    #[test]
    fn test_unopenable_document_is_isolated() {
        let h = harness(
            Fixture::default()
                .document("one.pdf", 1)
                .unopenable("two.pdf", "encrypted")
                .document("three.pdf", 1)
                .native("one.pdf", 1, vec![grid(&[&["1", "x"], &["2", "y"]])])
                .native("three.pdf", 1, vec![grid(&[&["3", "z"], &["4", "w"]])]),
        );

        let result = h.pipeline.run(&[pdf("one.pdf"), pdf("two.pdf"), pdf("three.pdf")]);

        assert_eq!(result.errors().len(), 1);
        let error = &result.errors()[0];
        assert_eq!(error.scope, ErrorScope::Document);
        assert_eq!(error.identifier, "two.pdf");
        assert!(error.reason.contains("encrypted"));

        let documents: Vec<&str> = result
            .tables()
            .iter()
            .map(|t| t.origin().document.as_str())
            .collect();
        assert_eq!(documents, ["one.pdf", "three.pdf"]);
        assert_eq!(result.documents_submitted(), 3);
        assert_eq!(result.documents_opened(), 2);
    }

    #[test]
    fn test_document_failing_mid_way_keeps_earlier_pages() {
        let h = harness(
            Fixture::default()
                .document("broken.pdf", 3)
                .document("next.pdf", 1)
                .native("broken.pdf", 1, vec![grid(&[&["p1", "x"]])])
                .native("broken.pdf", 3, vec![grid(&[&["p3", "z"]])])
                .native("next.pdf", 1, vec![grid(&[&["n1", "w"]])])
                .fails_at("broken.pdf", 2),
        );

        let result = h.pipeline.run(&[pdf("broken.pdf"), pdf("next.pdf")]);

        let pages: Vec<(&str, usize)> = result
            .tables()
            .iter()
            .map(|t| (t.origin().document.as_str(), t.origin().page))
            .collect();
        assert_eq!(pages, [("broken.pdf", 1), ("next.pdf", 1)]);

        // page 3 is never attempted
        assert_eq!(h.native_calls.load(Ordering::SeqCst), 3);
        assert_eq!(h.renders.load(Ordering::SeqCst), 0);
        assert_eq!(result.pages_processed(), 2);

        assert_eq!(result.errors().len(), 1);
        let error = &result.errors()[0];
        assert_eq!(error.scope, ErrorScope::Document);
        assert_eq!(error.identifier, "broken.pdf");
        assert!(error.reason.contains("stream truncated"));
        assert_eq!(result.documents_opened(), 2);
    }

    #[test]
    fn test_document_error_follows_its_page_errors() {
        let h = harness(
            Fixture::default()
                .document("a.pdf", 3)
                .document("b.pdf", 1)
                .native("b.pdf", 1, vec![grid(&[&["b", "1"]])])
                .fails_at("a.pdf", 2),
        );

        let result = h.pipeline.run(&[pdf("a.pdf"), pdf("b.pdf")]);

        let scopes: Vec<(&str, ErrorScope)> = result
            .errors()
            .iter()
            .map(|e| (e.identifier.as_str(), e.scope))
            .collect();
        assert_eq!(
            scopes,
            [("a.pdf", ErrorScope::Page(1)), ("a.pdf", ErrorScope::Document)]
        );
        assert_eq!(result.tables().len(), 1);
        assert_eq!(result.tables()[0].origin().document, "b.pdf");
    }

    #[test]
    fn test_single_sheet_pads_to_widest_table() {
        let h = harness(
            Fixture::default()
                .document("a.pdf", 2)
                .native("a.pdf", 1, vec![grid(&[&["a", "b"], &["c", "d"]])])
                .native("a.pdf", 2, vec![grid(&[&["e", "f", "g"]])]),
        );

        let result = h.pipeline.run(&[pdf("a.pdf")]);
        let sheets = result.sheets(&AggregationMode::single_sheet());

        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, "extracted_data");
        assert_eq!(
            sheets[0].rows,
            vec![vec!["a", "b", ""], vec!["c", "d", ""], vec!["e", "f", "g"]]
        );
    }
}

// =============================================================================
// STATE MACHINE AND ACCOUNTING
// =============================================================================

mod accounting_tests {
    use super::*;

    #[test]
    fn test_native_success_never_renders() {
        let h = harness(
            Fixture::default()
                .document("a.pdf", 2)
                .native("a.pdf", 1, vec![grid(&[&["x", "y"]])])
                .native("a.pdf", 2, vec![grid(&[&["z", "w"]])])
                .ocr_text("unused"),
        );

        let result = h.pipeline.run(&[pdf("a.pdf")]);

        assert_eq!(result.tables().len(), 2);
        assert_eq!(h.native_calls.load(Ordering::SeqCst), 2);
        assert_eq!(h.renders.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_errors_plus_productive_pages_equal_total_pages() {
        let h = harness(
            Fixture::default()
                .document("a.pdf", 3)
                .document("b.pdf", 2)
                .native("a.pdf", 1, vec![grid(&[&["1", "2"]])])
                .native("a.pdf", 3, vec![grid(&[&["5", "6"]]), grid(&[&["7"]])])
                .native("b.pdf", 2, vec![grid(&[&["8", "9"]])])
                .ocr_text("\n \n"),
        );

        let result = h.pipeline.run(&[pdf("a.pdf"), pdf("b.pdf")]);

        let productive_pages: std::collections::HashSet<(String, usize)> = result
            .tables()
            .iter()
            .map(|t| (t.origin().document.clone(), t.origin().page))
            .collect();
        assert_eq!(result.pages_processed(), 5);
        assert_eq!(result.errors().len() + productive_pages.len(), 5);
        assert!(result
            .errors()
            .iter()
            .all(|e| matches!(e.scope, ErrorScope::Page(_))));
        assert_eq!(result.errors()[0].scope, ErrorScope::Page(2));
        assert_eq!(result.errors()[1].identifier, "b.pdf");
    }

    #[test]
    fn test_sequence_numbers_follow_document_page_and_table_order() {
        let h = harness(
            Fixture::default()
                .document("a.pdf", 2)
                .document("b.pdf", 1)
                .native("a.pdf", 1, vec![grid(&[&["a1"]]), grid(&[&["a1b"]])])
                .native("a.pdf", 2, vec![grid(&[&["a2"]])])
                .native("b.pdf", 1, vec![grid(&[&["b1"]])]),
        );

        let result = h.pipeline.run(&[pdf("a.pdf"), pdf("b.pdf")]);

        let firsts: Vec<&str> = result.tables().iter().map(|t| t.rows()[0][0].as_str()).collect();
        assert_eq!(firsts, ["a1", "a1b", "a2", "b1"]);
        let sequence: Vec<Option<usize>> =
            result.tables().iter().map(|t| t.sequence_number()).collect();
        assert_eq!(sequence, [Some(0), Some(1), Some(2), Some(3)]);
        assert_eq!(result.tables()[1].origin().index_in_page, 1);
    }

    #[test]
    fn test_page_report_records_fallback_path() {
        let h = harness(Fixture::default().document("a.pdf", 1).ocr_text("x y\nz w"));
        let doc = pdf("a.pdf");

        let report = h.pipeline.process_document(0, &doc);

        assert_eq!(report.page_count, Some(1));
        assert_eq!(report.pages[0].state(), PageState::OcrSuccess);
        assert!(report.pages[0].states.contains(&PageState::FallbackOcr));
        assert_eq!(report.pages[0].ocr_text.as_deref(), Some("x y\nz w"));
    }

    #[test]
    fn test_non_pdf_bytes_rejected_before_inspection() {
        let h = harness(Fixture::default().document("notes.pdf", 1));
        let doc = Document::new("notes.pdf", b"just some text".to_vec());

        let result = h.pipeline.run(&[doc]);

        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].scope, ErrorScope::Document);
        assert_eq!(result.documents_opened(), 0);
        assert_eq!(h.native_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_nothing_extracted() {
        let h = harness(Fixture::default().document("a.pdf", 1).unopenable("b.pdf", "corrupt"));

        let result = h.pipeline.run(&[pdf("a.pdf"), pdf("b.pdf")]);

        assert!(result.nothing_extracted());
        assert_eq!(result.errors().len(), 2);
        assert!(result.sheets(&AggregationMode::MultiSheet).is_empty());
    }
}

// =============================================================================
// ORDERING UNDER CONCURRENCY
// =============================================================================

mod ordering_tests {
    use super::*;

    fn fixture() -> Fixture {
        Fixture::default()
            .document("a.pdf", 1)
            .document("b.pdf", 1)
            .document("c.pdf", 1)
            .native("a.pdf", 1, vec![grid(&[&["a", "1"]])])
            .native("b.pdf", 1, vec![grid(&[&["b", "2"]])])
            .native("c.pdf", 1, vec![grid(&[&["c", "3"]])])
    }

    #[test]
    fn test_assemble_uses_arrival_order_not_completion_order() {
        let h = harness(
            Fixture::default()
                .document("a.pdf", 2)
                .document("b.pdf", 2)
                .native("a.pdf", 1, vec![grid(&[&["a", "1"]])])
                .native("a.pdf", 2, vec![grid(&[&["a", "2"]])])
                .native("b.pdf", 1, vec![grid(&[&["b", "1"]])])
                .native("b.pdf", 2, vec![grid(&[&["b", "2"]])]),
        );
        let a = pdf("a.pdf");
        let b = pdf("b.pdf");

        // B completes before A
        let b_report = h.pipeline.process_document(1, &b);
        let a_report = h.pipeline.process_document(0, &a);
        let result = TableExtractionPipeline::assemble(2, vec![b_report, a_report]);

        let pages: Vec<(&str, usize)> = result
            .tables()
            .iter()
            .map(|t| (t.origin().document.as_str(), t.origin().page))
            .collect();
        assert_eq!(
            pages,
            [("a.pdf", 1), ("a.pdf", 2), ("b.pdf", 1), ("b.pdf", 2)]
        );
        let sequence: Vec<Option<usize>> =
            result.tables().iter().map(|t| t.sequence_number()).collect();
        assert_eq!(sequence, [Some(0), Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_parallel_run_matches_sequential_run() {
        let documents = [pdf("a.pdf"), pdf("b.pdf"), pdf("c.pdf")];

        let sequential = harness(fixture()).pipeline.run(&documents);
        let parallel = {
            let h = harness(fixture());
            h.pipeline.with_jobs(3).run(&documents)
        };

        assert_eq!(sequential.tables(), parallel.tables());
        assert_eq!(sequential.errors(), parallel.errors());
    }
}
