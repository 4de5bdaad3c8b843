//! Configuration for batch table extraction.
//!
//! [`ExtractionConfig`] gathers every tunable of the pipeline: rendering
//! resolution, recognizer options, native layout tolerances, aggregation mode
//! and the locations of the external tools. It can be built in code with the
//! `with_*` methods or loaded from a JSON file; missing fields take defaults.

use crate::error::{Error, Result};
use crate::ocr::LayoutHint;
use crate::pipeline::aggregator::MAX_SHEET_NAME_CHARS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default rendering resolution for OCR, in dots per inch.
pub const DEFAULT_DPI: u32 = 300;

/// Default name of the worksheet in single-sheet mode.
pub const DEFAULT_SINGLE_SHEET_NAME: &str = "extracted_data";

/// Tolerances for grouping positioned words into table rows and columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Maximum vertical distance (points) between word centres on one row
    pub row_tolerance: f32,
    /// Maximum horizontal distance (points) between left edges of one column
    pub column_tolerance: f32,
    /// Largest gap (points) between words that still belong to one cell
    pub word_gap: f32,
    /// Minimum number of consecutive rows forming a table
    pub min_rows: usize,
    /// Minimum number of cells a row needs to be part of a table
    pub min_columns: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            row_tolerance: 3.0,
            column_tolerance: 5.0,
            word_gap: 6.0,
            min_rows: 2,
            min_columns: 2,
        }
    }
}

/// How aggregated tables are laid out into worksheets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// One worksheet per table, named `{document}_page_{page}`
    MultiSheet,
    /// All tables concatenated by row into one worksheet
    SingleSheet {
        /// Fixed worksheet name
        sheet_name: String,
    },
}

impl Default for AggregationMode {
    fn default() -> Self {
        Self::MultiSheet
    }
}

impl AggregationMode {
    /// Single-sheet mode with the default sheet name.
    pub fn single_sheet() -> Self {
        Self::SingleSheet {
            sheet_name: DEFAULT_SINGLE_SHEET_NAME.to_string(),
        }
    }
}

/// Locations of the external command-line tools used by the bundled adapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    /// poppler `pdfinfo`
    pub pdfinfo: PathBuf,
    /// poppler `pdftotext`
    pub pdftotext: PathBuf,
    /// poppler `pdftoppm`
    pub pdftoppm: PathBuf,
    /// `tesseract`
    pub tesseract: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            pdfinfo: PathBuf::from("pdfinfo"),
            pdftotext: PathBuf::from("pdftotext"),
            pdftoppm: PathBuf::from("pdftoppm"),
            tesseract: PathBuf::from("tesseract"),
        }
    }
}

/// Batch extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Rendering resolution for OCR
    pub dpi: u32,
    /// Page segmentation hint passed to the recognizer
    pub layout_hint: Option<LayoutHint>,
    /// Recognizer language code
    pub language: String,
    /// Native layout analysis tolerances
    pub native: LayoutConfig,
    /// Worksheet layout of the output
    pub aggregation: AggregationMode,
    /// Render the first row of each worksheet as a header
    pub header_row: bool,
    /// Number of documents processed concurrently
    pub jobs: usize,
    /// External tool locations
    pub tools: ToolPaths,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            layout_hint: None,
            language: "eng".to_string(),
            native: LayoutConfig::default(),
            aggregation: AggregationMode::MultiSheet,
            header_row: false,
            jobs: 1,
            tools: ToolPaths::default(),
        }
    }

    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the OCR rendering resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Set the page segmentation hint.
    pub fn with_layout_hint(mut self, hint: Option<LayoutHint>) -> Self {
        self.layout_hint = hint;
        self
    }

    /// Set the recognizer language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the native layout tolerances.
    pub fn with_native(mut self, native: LayoutConfig) -> Self {
        self.native = native;
        self
    }

    /// Set the aggregation mode.
    pub fn with_aggregation(mut self, aggregation: AggregationMode) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Enable header promotion of the first row.
    pub fn with_header_row(mut self, enable: bool) -> Self {
        self.header_row = enable;
        self
    }

    /// Set the number of concurrent document workers.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Set the external tool locations.
    pub fn with_tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if self.dpi == 0 {
            return Err(Error::Config("dpi must be greater than zero".to_string()));
        }
        if self.jobs == 0 {
            return Err(Error::Config("jobs must be at least 1".to_string()));
        }
        let native = &self.native;
        for (name, value) in [
            ("row_tolerance", native.row_tolerance),
            ("column_tolerance", native.column_tolerance),
            ("word_gap", native.word_gap),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!("{} must be a non-negative number", name)));
            }
        }
        if native.min_rows == 0 || native.min_columns == 0 {
            return Err(Error::Config("min_rows and min_columns must be at least 1".to_string()));
        }
        if let AggregationMode::SingleSheet { sheet_name } = &self.aggregation {
            if sheet_name.trim().is_empty() {
                return Err(Error::Config("single sheet name must not be empty".to_string()));
            }
            if sheet_name.chars().count() > MAX_SHEET_NAME_CHARS {
                return Err(Error::Config(format!(
                    "single sheet name '{}' exceeds {} characters",
                    sheet_name, MAX_SHEET_NAME_CHARS
                )));
            }
        }
        Ok(())
    }
}
