//! Reshaping of raw extractor output into rectangular tables.

use crate::table::{NormalizedTable, RawTable, TableOrigin};

/// Pads ragged raw tables into rectangular ones.
///
/// The target width is the longest row; shorter rows are right-padded with
/// empty cells. Nothing is ever truncated, so every cell keeps its column.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableNormalizer;

impl TableNormalizer {
    /// Normalize `raw`, tagging it with `origin`.
    ///
    /// Returns `None` for a table without cells; such a table is dropped
    /// silently, it is not an extraction failure.
    pub fn normalize(&self, raw: RawTable, origin: TableOrigin) -> Option<NormalizedTable> {
        if raw.is_empty() {
            return None;
        }
        let width = raw.max_row_len();
        let rows = raw
            .rows
            .into_iter()
            .map(|row| pad_row(row, width))
            .collect();
        NormalizedTable::from_rectangular(rows, origin)
    }

    /// Normalize every table of a page, numbering survivors in page order.
    pub fn normalize_page(
        &self,
        raw_tables: Vec<RawTable>,
        make_origin: impl Fn(usize) -> TableOrigin,
    ) -> Vec<NormalizedTable> {
        raw_tables
            .into_iter()
            .filter(|raw| !raw.is_empty())
            .enumerate()
            .filter_map(|(index, raw)| self.normalize(raw, make_origin(index)))
            .collect()
    }
}

/// Right-pad `row` with empty cells up to `width`.
pub(crate) fn pad_row(mut row: Vec<String>, width: usize) -> Vec<String> {
    if row.len() < width {
        row.resize(width, String::new());
    }
    row
}
