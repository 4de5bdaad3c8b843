//! Extract tables from a batch of PDFs into one XLSX workbook.
//!
//! Usage:
//!   extract_tables invoices/ scan.pdf -o tables.xlsx
//!   extract_tables --single-sheet --header-row -j 4 reports/
//!   RUST_LOG=pdf_tables=debug extract_tables scan.pdf

use anyhow::{Context, Result};
use clap::Parser;
use pdf_tables::ocr::LayoutHint;
use pdf_tables::workbook::{WorkbookWriter, XlsxWriter};
use pdf_tables::{
    AggregationMode, BatchError, BatchResult, Document, ExtractionConfig, TableExtractionPipeline,
};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(
    name = "extract_tables",
    about = "Extract tables from PDF documents into an XLSX workbook",
    long_about = "Extract tables from PDF documents into an XLSX workbook.\n\
                  \n\
                  Each page is read from its text layer first; pages without native tables\n\
                  are rendered and recognized with tesseract. Requires poppler-utils and\n\
                  tesseract on PATH (or configured with --config).",
    version
)]
struct Args {
    /// PDF files or directories containing PDF files
    #[arg(value_name = "INPUTS", required = true)]
    inputs: Vec<PathBuf>,

    /// Output workbook
    #[arg(short, long, value_name = "OUTPUT", default_value = "extracted_data.xlsx")]
    output: PathBuf,

    /// Put all tables into one worksheet
    #[arg(long)]
    single_sheet: bool,

    /// Worksheet name in single-sheet mode (implies --single-sheet)
    #[arg(long, value_name = "NAME")]
    sheet_name: Option<String>,

    /// OCR rendering resolution
    #[arg(long, value_name = "DPI")]
    dpi: Option<u32>,

    /// Tesseract page segmentation mode
    #[arg(long, value_name = "MODE")]
    psm: Option<u8>,

    /// Tesseract language(s), e.g. eng or eng+deu
    #[arg(long, value_name = "LANG")]
    lang: Option<String>,

    /// Render the first row of each worksheet in bold
    #[arg(long)]
    header_row: bool,

    /// Number of documents processed concurrently
    #[arg(short = 'j', long, value_name = "N")]
    jobs: Option<usize>,

    /// JSON configuration file; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the error report as JSON
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Show detailed processing information
    #[arg(short, long)]
    verbose: bool,
}

/// JSON error report.
#[derive(Serialize)]
struct Report<'a> {
    generated_at: String,
    output: String,
    documents_submitted: usize,
    documents_opened: usize,
    pages_processed: usize,
    tables: usize,
    nothing_extracted: bool,
    errors: &'a [BatchError],
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = build_config(&args)?;
    let documents = load_documents(&args.inputs);
    if documents.is_empty() {
        log::warn!("No PDF documents found in the given inputs");
    }

    let start = Instant::now();
    let pipeline = TableExtractionPipeline::from_config(&config)?;
    let result = pipeline.run(&documents);

    let sheets = result.sheets(&config.aggregation);
    XlsxWriter::new()
        .with_header_row(config.header_row)
        .write_to_path(&sheets, &args.output)
        .with_context(|| format!("Failed to write workbook {}", args.output.display()))?;

    print_summary(&result, sheets.len(), &args.output, start.elapsed().as_secs_f64());

    if let Some(report_path) = &args.report {
        write_report(&result, &args.output, report_path)?;
    }

    Ok(())
}

fn build_config(args: &Args) -> Result<ExtractionConfig> {
    let mut config = match &args.config {
        Some(path) => ExtractionConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ExtractionConfig::new(),
    };

    if let Some(dpi) = args.dpi {
        config = config.with_dpi(dpi);
    }
    if let Some(psm) = args.psm {
        config = config.with_layout_hint(Some(LayoutHint::try_from(psm)?));
    }
    if let Some(lang) = &args.lang {
        config = config.with_language(lang.clone());
    }
    if let Some(name) = &args.sheet_name {
        config = config.with_aggregation(AggregationMode::SingleSheet {
            sheet_name: name.clone(),
        });
    } else if args.single_sheet && config.aggregation == AggregationMode::MultiSheet {
        config = config.with_aggregation(AggregationMode::single_sheet());
    }
    if args.header_row {
        config = config.with_header_row(true);
    }
    if let Some(jobs) = args.jobs {
        config = config.with_jobs(jobs);
    }

    config.validate()?;
    Ok(config)
}

/// Read every input in order; directories contribute their PDFs by name.
///
/// An input that cannot be read stays in the batch as an unreadable
/// document, so the pipeline reports it at its position and carries on.
fn load_documents(inputs: &[PathBuf]) -> Vec<Document> {
    // Err holds an input that could not be listed, with the reason.
    let mut paths: Vec<std::result::Result<PathBuf, (PathBuf, String)>> = Vec::new();
    for input in inputs {
        if input.is_dir() {
            match std::fs::read_dir(input) {
                Ok(entries) => {
                    let mut found: Vec<PathBuf> = entries
                        .filter_map(|entry| entry.ok().map(|e| e.path()))
                        .filter(|path| path.is_file() && is_pdf(path))
                        .collect();
                    found.sort();
                    paths.extend(found.into_iter().map(Ok));
                },
                Err(e) => {
                    log::warn!("Failed to read directory {}: {}", input.display(), e);
                    paths.push(Err((input.clone(), format!("failed to read directory: {}", e))));
                },
            }
        } else {
            paths.push(Ok(input.clone()));
        }
    }

    let mut seen = HashSet::new();
    let mut documents = Vec::with_capacity(paths.len());
    for entry in paths {
        let (path, document) = match entry {
            Ok(path) => {
                let document = Document::from_path(&path).unwrap_or_else(|e| {
                    log::warn!("Failed to read {}: {}", path.display(), e);
                    Document::unreadable(file_identifier(&path), e.to_string())
                });
                (path, document)
            },
            Err((path, reason)) => {
                let document = Document::unreadable(path.display().to_string(), reason);
                (path, document)
            },
        };
        // Identifiers must be unique within the batch; fall back to the full path.
        let document = if seen.insert(document.identifier().to_string()) {
            document
        } else {
            let identifier = path.display().to_string();
            seen.insert(identifier.clone());
            match document.load_error() {
                Some(reason) => Document::unreadable(identifier, reason),
                None => Document::new(identifier, document.bytes().to_vec()),
            }
        };
        documents.push(document);
    }
    documents
}

fn file_identifier(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn print_summary(result: &BatchResult, sheet_count: usize, output: &Path, elapsed: f64) {
    println!();
    println!("Documents: {} submitted, {} opened", result.documents_submitted(), result.documents_opened());
    println!("Pages:     {}", result.pages_processed());
    println!("Tables:    {}", result.tables().len());
    if result.nothing_extracted() {
        println!("Nothing extracted; wrote an empty workbook to {}", output.display());
    } else {
        println!("Wrote {} worksheets to {}", sheet_count, output.display());
    }
    println!("Time:      {:.2}s", elapsed);

    if !result.errors().is_empty() {
        println!();
        println!("Errors ({}):", result.errors().len());
        for error in result.errors() {
            println!("  - {}", error);
        }
    }
}

fn write_report(result: &BatchResult, output: &Path, report_path: &Path) -> Result<()> {
    let report = Report {
        generated_at: chrono::Local::now().to_rfc3339(),
        output: output.display().to_string(),
        documents_submitted: result.documents_submitted(),
        documents_opened: result.documents_opened(),
        pages_processed: result.pages_processed(),
        tables: result.tables().len(),
        nothing_extracted: result.nothing_extracted(),
        errors: result.errors(),
    };
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(report_path, json)
        .with_context(|| format!("Failed to write report {}", report_path.display()))?;
    log::info!("Wrote error report to {}", report_path.display());
    Ok(())
}
