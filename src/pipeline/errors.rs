//! Failure bookkeeping for a batch run.

use serde::Serialize;

/// What a recorded failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "scope", content = "page")]
pub enum ErrorScope {
    /// The whole document; its remaining pages were skipped
    Document,
    /// One 1-based page of the document
    Page(usize),
}

/// One failure entry of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchError {
    /// Document or page scope
    #[serde(flatten)]
    pub scope: ErrorScope,
    /// Identifier of the document concerned
    pub identifier: String,
    /// Human-readable reason
    pub reason: String,
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.scope {
            ErrorScope::Document => write!(f, "{}: {}", self.identifier, self.reason),
            ErrorScope::Page(page) => {
                write!(f, "{} (page {}): {}", self.identifier, page, self.reason)
            },
        }
    }
}

/// Collects failures in the order they are reported. Never fails itself.
#[derive(Debug, Default)]
pub struct BatchErrorTracker {
    entries: Vec<BatchError>,
}

impl BatchErrorTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a document could not be processed at all.
    pub fn record_document(&mut self, identifier: impl Into<String>, reason: impl Into<String>) {
        self.record(ErrorScope::Document, identifier.into(), reason.into());
    }

    /// Record that one page ended in the failed state.
    pub fn record_page(
        &mut self,
        identifier: impl Into<String>,
        page: usize,
        reason: impl Into<String>,
    ) {
        self.record(ErrorScope::Page(page), identifier.into(), reason.into());
    }

    fn record(&mut self, scope: ErrorScope, identifier: String, reason: String) {
        let entry = BatchError {
            scope,
            identifier,
            reason,
        };
        log::warn!("{}", entry);
        self.entries.push(entry);
    }

    /// Number of failures recorded so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing failed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The recorded failures, in order.
    pub fn errors(&self) -> &[BatchError] {
        &self.entries
    }

    /// Consume the tracker, returning the failures in order.
    pub fn into_errors(self) -> Vec<BatchError> {
        self.entries
    }
}
