//! Table model shared by the extractors, the normalizer and the aggregator.
//!
//! Extractors produce [`RawTable`]s, whose rows may be ragged. The normalizer
//! turns them into [`NormalizedTable`]s, which are rectangular and remember
//! where they came from.

use serde::Serialize;

/// How a table was obtained from its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Grouped from the positioned words of the page's text layer.
    Native,
    /// Reconstructed from recognized text of the rendered page.
    ///
    /// Column boundaries are guessed from whitespace, so a multi-word cell
    /// appears as several cells.
    Ocr,
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Ocr => write!(f, "ocr"),
        }
    }
}

/// Rows of cell strings straight from an extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Table rows; lengths may differ
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Create a raw table from its rows.
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Build a raw table from string slices, mostly useful in tests.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// True when the table has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.is_empty())
    }

    /// Length of the longest row.
    pub fn max_row_len(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Where a normalized table was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableOrigin {
    /// Identifier of the source document
    pub document: String,
    /// 1-based page number
    pub page: usize,
    /// Position of the table among the tables of its page
    pub index_in_page: usize,
    /// Extraction path that produced the table
    pub method: ExtractionMethod,
}

/// A rectangular table: every row has [`NormalizedTable::column_count`] cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedTable {
    rows: Vec<Vec<String>>,
    column_count: usize,
    origin: TableOrigin,
    sequence_number: Option<usize>,
}

impl NormalizedTable {
    /// Create a table from rows that are already rectangular.
    ///
    /// Returns `None` if the rows are empty or not all of the same length.
    pub fn from_rectangular(rows: Vec<Vec<String>>, origin: TableOrigin) -> Option<Self> {
        let column_count = rows.first()?.len();
        if column_count == 0 || rows.iter().any(|row| row.len() != column_count) {
            return None;
        }
        Some(Self {
            rows,
            column_count,
            origin,
            sequence_number: None,
        })
    }

    /// Table rows, all of equal length.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Consume the table, returning its rows.
    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of cells in every row.
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Where the table was found.
    pub fn origin(&self) -> &TableOrigin {
        &self.origin
    }

    /// Position of the table in the aggregate, once aggregated.
    pub fn sequence_number(&self) -> Option<usize> {
        self.sequence_number
    }

    pub(crate) fn set_sequence_number(&mut self, sequence_number: usize) {
        self.sequence_number = Some(sequence_number);
    }
}
