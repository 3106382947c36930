//! Filing document retrieval.
//!
//! Index entries point at full-text filing documents
//! (`edgar/data/<cik>/<accession>.txt`). This module opens those documents and,
//! for Form 4, chains index traversal, document retrieval and XML decoding into
//! one cursor.

use super::Edgar;
use super::body::Body;
use super::error::Result;
#[cfg(feature = "form4")]
use super::index::FilingCursor;
#[cfg(feature = "form4")]
use super::options::FilingOptions;
#[cfg(feature = "form4")]
use super::parsing::form4::{FORM_TYPE_4, Form4, parse_form4_from_document};
use super::parsing::index::IndexEntry;
#[cfg(feature = "form4")]
use super::traits::IndexOperations;
use super::traits::FilingOperations;
use async_trait::async_trait;
#[cfg(feature = "form4")]
use chrono::NaiveDate;
#[cfg(feature = "form4")]
use tokio::io::BufReader;

/// Pull-based cursor over decoded Form 4 filings.
///
/// Created by [`FilingOperations::form4_filings_between`]. Wraps a
/// [`FilingCursor`] restricted to form types `4` and `4/A`; every entry it
/// yields is fetched and decoded before being returned, so at most one index
/// partition and one filing document are open at a time.
#[cfg(feature = "form4")]
#[derive(Debug)]
pub struct Form4Cursor {
    edgar: Edgar,
    filings: FilingCursor,
}

#[cfg(feature = "form4")]
impl Form4Cursor {
    /// Returns the next Form 4 filing together with its index entry.
    ///
    /// # Errors
    ///
    /// Traversal errors, as for [`FilingCursor::next`], plus any failure to
    /// fetch a document (`Status`, `RequestError`), locate its `<XML>` payload
    /// (`TagNotFound`, `UnterminatedTag`) or decode it (`XmlError`). The
    /// cursor is closed after an error: every later call returns `Ok(None)`.
    pub async fn next(&mut self) -> Result<Option<(IndexEntry, Form4)>> {
        let next = self.advance().await;
        if next.is_err() {
            self.close();
        }
        next
    }

    async fn advance(&mut self) -> Result<Option<(IndexEntry, Form4)>> {
        let Some(entry) = self.filings.next().await? else {
            return Ok(None);
        };

        let body = self.edgar.open_document(&entry).await?;
        let form = parse_form4_from_document(BufReader::new(body)).await?;
        tracing::debug!(
            "Decoded Form {} for {} ({})",
            entry.form_type,
            form.issuer_name,
            entry.filename
        );

        Ok(Some((entry, form)))
    }

    /// Stops the traversal and releases any open partition.
    pub fn close(&mut self) {
        self.filings.close();
    }
}

#[async_trait]
impl FilingOperations for Edgar {
    fn document_url(&self, entry: &IndexEntry) -> String {
        entry.url(&self.edgar_archives_url)
    }

    async fn open_document(&self, entry: &IndexEntry) -> Result<Body> {
        let url = self.document_url(entry);
        tracing::debug!("Fetching document {}", url);
        self.open(&url).await
    }

    #[cfg(feature = "form4")]
    fn form4_filings_between(&self, start: NaiveDate, end: Option<NaiveDate>) -> Form4Cursor {
        // "4" also matches "4/A" while amendments are included
        let options = FilingOptions::new().with_form_type(FORM_TYPE_4);
        Form4Cursor {
            edgar: self.clone(),
            filings: self.filings_between(start, end, Some(options)),
        }
    }
}
