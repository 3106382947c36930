//! Trait definitions for the seams between the transport, the index traversal
//! engine and filing retrieval.
//!
//! [`Transport`] is the narrow interface everything else is written against:
//! one GET, one streaming body. The production implementation is
//! [`HttpTransport`](crate::HttpTransport); tests plug in an in-memory one.
//! [`IndexOperations`] and [`FilingOperations`] group the operations the
//! [`Edgar`](crate::Edgar) client offers on top of it.

use super::body::Body;
use super::error::{EdgarError, Result};
#[cfg(feature = "form4")]
use super::filings::Form4Cursor;
#[cfg(feature = "index")]
use super::index::FilingCursor;
#[cfg(feature = "index")]
use super::options::FilingOptions;
#[cfg(feature = "index")]
use super::parsing::index::IndexEntry;
use async_trait::async_trait;
#[cfg(feature = "index")]
use chrono::NaiveDate;
use std::fmt;
#[cfg(feature = "index")]
use std::ops::ControlFlow;

/// Performs HTTP GET requests against the archive.
///
/// Implementations apply their own rate limiting and retry policy. A
/// non-success status must surface as [`EdgarError::Status`] carrying the URL
/// and the status code; anything else that prevents a body from being opened
/// is a transport failure.
#[async_trait]
pub trait Transport: fmt::Debug + Send + Sync {
    /// Opens `url` and returns its body as a forward-only stream.
    async fn open(&self, url: &str) -> Result<Body>;
}

/// Operations for walking the quarterly full-index archive.
///
/// Partitions are visited newest first (`end` quarter down to `start`
/// quarter), one at a time, and entries are yielded only when their filing
/// date lies in `[start, end]`. An `end` of `None` means today.
#[cfg(feature = "index")]
#[async_trait]
pub trait IndexOperations {
    /// Returns a pull-based cursor over matching index entries.
    ///
    /// Nothing is fetched until the first call to [`FilingCursor::next`].
    /// Dropping the cursor stops the traversal and releases any open body.
    fn filings_between(
        &self,
        start: NaiveDate,
        end: Option<NaiveDate>,
        options: Option<FilingOptions>,
    ) -> FilingCursor;

    /// Calls `f` for every matching index entry.
    ///
    /// `f` returns `ControlFlow::Break(())` to stop early, which is not an
    /// error. An `Err` from `f` aborts the traversal and is returned as is.
    async fn for_each_filing_between<F, E>(
        &self,
        start: NaiveDate,
        end: Option<NaiveDate>,
        options: Option<FilingOptions>,
        f: F,
    ) -> std::result::Result<(), E>
    where
        F: FnMut(IndexEntry) -> std::result::Result<ControlFlow<()>, E> + Send,
        E: From<EdgarError> + Send;
}

/// Operations for retrieving individual filing documents.
#[cfg(feature = "index")]
#[async_trait]
pub trait FilingOperations {
    /// Builds the archive URL of the document an index entry points at.
    fn document_url(&self, entry: &IndexEntry) -> String;

    /// Opens the full-text filing document (the SGML envelope) for an entry.
    async fn open_document(&self, entry: &IndexEntry) -> Result<Body>;

    /// Walks the index between `start` and `end` and decodes every Form 4
    /// (and 4/A) filing found, newest partition first.
    #[cfg(feature = "form4")]
    fn form4_filings_between(&self, start: NaiveDate, end: Option<NaiveDate>) -> Form4Cursor;
}
