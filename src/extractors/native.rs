//! Table detection from the positioned words of a page's text layer.
//!
//! Words are grouped into rows by vertical alignment and into columns by
//! horizontal alignment. A table is a run of consecutive rows that each hold
//! at least `min_columns` separate cells; the columns of a table are the
//! clusters formed by the left edges of its cells.

use super::{NativeTableExtractor, TextLayerSource, TextWord};
use crate::config::LayoutConfig;
use crate::document::DocumentHandle;
use crate::error::Result;
use crate::geometry::safe_float_cmp;
use crate::table::RawTable;

/// [`NativeTableExtractor`] that runs alignment analysis on a [`TextLayerSource`].
#[derive(Debug, Clone)]
pub struct LayoutTableExtractor<S> {
    source: S,
    config: LayoutConfig,
}

impl<S: TextLayerSource> LayoutTableExtractor<S> {
    /// Create an extractor reading words from `source`.
    pub fn new(source: S, config: LayoutConfig) -> Self {
        Self { source, config }
    }

    /// The layout tolerances in use.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }
}

impl<S: TextLayerSource> NativeTableExtractor for LayoutTableExtractor<S> {
    fn extract_tables(&self, document: &DocumentHandle<'_>, page: usize) -> Result<Vec<RawTable>> {
        let words = self.source.words(document, page)?;
        let tables = detect_tables(&words, &self.config);
        log::debug!(
            "'{}' page {}: {} words, {} native tables",
            document.identifier(),
            page,
            words.len(),
            tables.len()
        );
        Ok(tables)
    }
}

/// A run of words on one line that belong to the same cell.
#[derive(Debug, Clone, PartialEq)]
struct Fragment {
    text: String,
    left: f32,
    right: f32,
}

/// Detect tables in a page's words.
///
/// Returns the tables top to bottom; an empty vector when no region of the
/// page has a grid structure.
pub fn detect_tables(words: &[TextWord], config: &LayoutConfig) -> Vec<RawTable> {
    let lines = group_into_lines(words, config.row_tolerance);
    let fragmented: Vec<Vec<Fragment>> = lines
        .iter()
        .map(|line| split_fragments(line, config.word_gap))
        .collect();

    let mut tables = vec![];
    let mut region: Vec<&[Fragment]> = vec![];
    for fragments in &fragmented {
        if fragments.len() >= config.min_columns {
            region.push(fragments);
            continue;
        }
        if region.len() >= config.min_rows {
            tables.push(build_table(&region, config.column_tolerance));
        }
        region.clear();
    }
    if region.len() >= config.min_rows {
        tables.push(build_table(&region, config.column_tolerance));
    }

    tables
}

/// Group words into lines by vertical centre, top to bottom.
///
/// A word joins the current line when its centre lies within `tolerance` of
/// the centre of the line's first word. Words within a line are sorted by x.
fn group_into_lines(words: &[TextWord], tolerance: f32) -> Vec<Vec<&TextWord>> {
    let mut sorted: Vec<&TextWord> = words.iter().filter(|w| !w.text.trim().is_empty()).collect();
    sorted.sort_by(|a, b| {
        safe_float_cmp(a.bbox.center_y(), b.bbox.center_y())
            .then_with(|| safe_float_cmp(a.bbox.x, b.bbox.x))
    });

    let mut lines: Vec<(f32, Vec<&TextWord>)> = vec![];
    for word in sorted {
        let center = word.bbox.center_y();
        match lines.last_mut() {
            Some((anchor, line)) if (center - *anchor).abs() <= tolerance => line.push(word),
            _ => lines.push((center, vec![word])),
        }
    }

    lines
        .into_iter()
        .map(|(_, mut line)| {
            line.sort_by(|a, b| safe_float_cmp(a.bbox.x, b.bbox.x));
            line
        })
        .collect()
}

/// Merge horizontally adjacent words of a line into cell fragments.
fn split_fragments(line: &[&TextWord], word_gap: f32) -> Vec<Fragment> {
    let mut fragments: Vec<Fragment> = vec![];
    for word in line {
        let text = word.text.trim();
        match fragments.last_mut() {
            Some(last) if word.bbox.left() - last.right <= word_gap => {
                last.text.push(' ');
                last.text.push_str(text);
                last.right = last.right.max(word.bbox.right());
            },
            _ => fragments.push(Fragment {
                text: text.to_string(),
                left: word.bbox.left(),
                right: word.bbox.right(),
            }),
        }
    }
    fragments
}

/// Cluster left edges into column ranges `(min, max)`, left to right.
///
/// Consecutive sorted edges closer than `tolerance` share a column.
fn column_ranges(lefts: &mut [f32], tolerance: f32) -> Vec<(f32, f32)> {
    lefts.sort_by(|a, b| safe_float_cmp(*a, *b));
    let mut ranges: Vec<(f32, f32)> = vec![];
    for &left in lefts.iter() {
        match ranges.last_mut() {
            Some((_, max)) if left - *max <= tolerance => *max = left,
            _ => ranges.push((left, left)),
        }
    }
    ranges
}

/// Lay the fragments of a table region out on a shared column grid.
fn build_table(region: &[&[Fragment]], column_tolerance: f32) -> RawTable {
    let mut lefts: Vec<f32> = region.iter().flat_map(|row| row.iter().map(|f| f.left)).collect();
    let columns = column_ranges(&mut lefts, column_tolerance);

    let rows = region
        .iter()
        .map(|fragments| {
            let mut cells = vec![String::new(); columns.len()];
            for fragment in fragments.iter() {
                let column = columns
                    .iter()
                    .position(|&(min, max)| fragment.left >= min && fragment.left <= max)
                    .unwrap_or(columns.len() - 1);
                let cell = &mut cells[column];
                if !cell.is_empty() {
                    cell.push(' ');
                }
                cell.push_str(&fragment.text);
            }
            while cells.last().is_some_and(|c| c.is_empty()) {
                cells.pop();
            }
            cells
        })
        .collect();

    RawTable::new(rows)
}
