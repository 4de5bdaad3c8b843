//! Aggregation of normalized tables and worksheet naming.
//!
//! Tables arrive in document order, page order and table-within-page order
//! and keep that order in the aggregate. Worksheet names follow the limits of
//! the workbook format: at most 31 characters, no `[ ] : * ? / \`, no leading
//! or trailing apostrophe, unique regardless of case.

use super::normalizer::pad_row;
use crate::config::AggregationMode;
use crate::table::NormalizedTable;
use crate::workbook::Sheet;
use std::collections::HashSet;

/// Longest worksheet name the workbook format accepts.
pub const MAX_SHEET_NAME_CHARS: usize = 31;

const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Collects tables in arrival order and numbers them.
///
/// Single writer: when documents are processed concurrently, their tables are
/// replayed into the aggregator in submission order after the workers finish.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    tables: Vec<NormalizedTable>,
    next_sequence: usize,
}

impl ResultAggregator {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a table, assigning it the next sequence number.
    pub fn push(&mut self, mut table: NormalizedTable) -> usize {
        let sequence = self.next_sequence;
        table.set_sequence_number(sequence);
        self.tables.push(table);
        self.next_sequence += 1;
        sequence
    }

    /// Append several tables in order.
    pub fn extend(&mut self, tables: impl IntoIterator<Item = NormalizedTable>) {
        for table in tables {
            self.push(table);
        }
    }

    /// Number of tables collected so far.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True when no table was collected.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Tables collected so far.
    pub fn tables(&self) -> &[NormalizedTable] {
        &self.tables
    }

    /// Finish aggregation, returning the tables in sequence order.
    pub fn finalize(self) -> Vec<NormalizedTable> {
        self.tables
    }
}

/// Hands out unique, valid worksheet names.
#[derive(Debug, Default)]
pub struct SheetNamer {
    taken: HashSet<String>,
}

impl SheetNamer {
    /// Create a namer with no names taken.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a name derived from `base`.
    ///
    /// The sanitized base is cut to 31 characters. If that name is taken, a
    /// numeric suffix `_1`, `_2`, ... is appended to a base cut short enough
    /// for the result to stay within 31 characters, until the name is free.
    pub fn assign(&mut self, base: &str) -> String {
        let clean = sanitize_sheet_name(base);

        let candidate = truncate_name(&clean, MAX_SHEET_NAME_CHARS);
        if self.taken.insert(candidate.to_lowercase()) {
            return candidate;
        }

        let mut counter = 1usize;
        loop {
            let suffix = format!("_{}", counter);
            let room = MAX_SHEET_NAME_CHARS.saturating_sub(suffix.chars().count());
            let candidate = format!("{}{}", truncate_name(&clean, room), suffix);
            if self.taken.insert(candidate.to_lowercase()) {
                log::debug!("Sheet name '{}' taken, using '{}'", clean, candidate);
                return candidate;
            }
            counter += 1;
        }
    }
}

/// Replace characters the workbook format forbids in sheet names.
pub fn sanitize_sheet_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if FORBIDDEN_SHEET_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    let trimmed = replaced.trim_matches('\'');
    if trimmed.is_empty() {
        "Sheet".to_string()
    } else {
        trimmed.to_string()
    }
}

/// First `max_chars` characters of `name`, without a trailing apostrophe.
fn truncate_name(name: &str, max_chars: usize) -> String {
    let cut: String = name.chars().take(max_chars).collect();
    cut.trim_end_matches('\'').to_string()
}

/// Base worksheet name of a table: `{document}_page_{page}`.
pub fn base_sheet_name(table: &NormalizedTable) -> String {
    format!("{}_page_{}", table.origin().document, table.origin().page)
}

/// Lay the aggregated tables out into named worksheets.
///
/// Multi-sheet mode yields one sheet per table in sequence order. Single-sheet
/// mode concatenates all rows into one sheet, every row padded to the widest
/// table. No tables yields no sheets.
pub fn layout_sheets(tables: &[NormalizedTable], mode: &AggregationMode) -> Vec<Sheet> {
    let mut namer = SheetNamer::new();
    match mode {
        AggregationMode::MultiSheet => tables
            .iter()
            .map(|table| Sheet::new(namer.assign(&base_sheet_name(table)), table.rows().to_vec()))
            .collect(),
        AggregationMode::SingleSheet { sheet_name } => {
            if tables.is_empty() {
                return vec![];
            }
            vec![Sheet::new(namer.assign(sheet_name), concatenate_rows(tables))]
        },
    }
}

/// Concatenate the rows of `tables` in order, padded to the widest table.
pub fn concatenate_rows(tables: &[NormalizedTable]) -> Vec<Vec<String>> {
    let width = tables
        .iter()
        .map(NormalizedTable::column_count)
        .max()
        .unwrap_or(0);
    tables
        .iter()
        .flat_map(|table| table.rows().iter().cloned())
        .map(|row| pad_row(row, width))
        .collect()
}
