//! Master index records.
//!
//! A quarterly `master.idx` (served gzipped as `master.gz`) starts with a fixed
//! 11-line preamble (description, contact and column headers) followed by one
//! pipe-delimited record per filing:
//!
//! ```text
//! CIK|Company Name|Form Type|Date Filed|Filename
//! 1000045|NICHOLAS FINANCIAL INC|4|2018-10-15|edgar/data/1000045/0001357521-18-000008.txt
//! ```
//!
//! The format has not changed in decades, so a record that does not fit it is
//! treated as a hard error rather than skipped.

use crate::body::read_line;
use crate::{EdgarError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::io::AsyncBufRead;

/// Number of preamble lines before the first record.
pub const PREAMBLE_LINES: usize = 11;

/// Field delimiter of the master index.
pub const DELIMITER: char = '|';

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One filing listed in a master index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub cik: u64,
    pub company_name: String,
    pub form_type: String,
    pub date_filed: NaiveDate,
    /// Path of the full-text filing relative to the archives root.
    pub filename: String,
}

impl IndexEntry {
    /// Returns the document URL under the given archives base
    /// (e.g. `https://www.sec.gov/Archives`).
    pub fn url(&self, archives_url: &str) -> String {
        format!(
            "{}/{}",
            archives_url.trim_end_matches('/'),
            self.filename.trim_start_matches('/')
        )
    }
}

/// Parses one `cik|name|form|YYYY-MM-DD|filename` record.
///
/// Fields are taken verbatim so that formatting the entry back yields the
/// same line.
impl FromStr for IndexEntry {
    type Err = EdgarError;

    fn from_str(line: &str) -> Result<Self> {
        let malformed = |reason: String| EdgarError::MalformedRecord {
            line: line.to_string(),
            reason,
        };

        let fields: Vec<&str> = line.split(DELIMITER).collect();
        let [cik, company_name, form_type, date_filed, filename] = fields[..] else {
            return Err(malformed(format!("expected 5 fields, found {}", fields.len())));
        };

        let cik = cik
            .parse::<u64>()
            .map_err(|e| malformed(format!("invalid CIK {:?}: {}", cik, e)))?;
        let date_filed = NaiveDate::parse_from_str(date_filed, DATE_FORMAT)
            .map_err(|e| malformed(format!("invalid date {:?}: {}", date_filed, e)))?;

        Ok(IndexEntry {
            cik,
            company_name: company_name.to_string(),
            form_type: form_type.to_string(),
            date_filed,
            filename: filename.to_string(),
        })
    }
}

impl fmt::Display for IndexEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{d}{}{d}{}{d}{}{d}{}",
            self.cik,
            self.company_name,
            self.form_type,
            self.date_filed.format(DATE_FORMAT),
            self.filename,
            d = DELIMITER
        )
    }
}

/// Streaming reader over a decompressed master index.
///
/// The preamble is skipped lazily on the first call to
/// [`next_entry`](Self::next_entry); blank lines are ignored and every other
/// line must be a well-formed record.
///
/// Records are decoded as UTF-8. The few company names carrying Latin-1 bytes
/// have those bytes replaced with U+FFFD, so such an entry no longer formats
/// back to the exact source bytes. All other fields are ASCII.
///
/// # Example
///
/// ```rust
/// use edgarstream::parsing::index::MasterIndexReader;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> edgarstream::Result<()> {
/// let content = "\n".repeat(11) + "1000045|NICHOLAS FINANCIAL INC|4|2018-10-15|edgar/data/1000045/0001357521-18-000008.txt\n";
/// let mut reader = MasterIndexReader::new(content.as_bytes());
/// let entry = reader.next_entry().await?.unwrap();
/// assert_eq!(entry.cik, 1000045);
/// assert!(reader.next_entry().await?.is_none());
/// # Ok(())
/// # }
/// ```
pub struct MasterIndexReader<R> {
    reader: R,
    line: Vec<u8>,
    preamble_skipped: bool,
}

impl<R: AsyncBufRead + Unpin> MasterIndexReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            preamble_skipped: false,
        }
    }

    /// Returns the next record, or `None` at the end of the index.
    ///
    /// I/O errors (including decompression failures of a gzip-wrapped reader)
    /// are returned as `EdgarError::FileError`.
    pub async fn next_entry(&mut self) -> Result<Option<IndexEntry>> {
        if !self.preamble_skipped {
            self.preamble_skipped = true;
            for _ in 0..PREAMBLE_LINES {
                if !read_line(&mut self.reader, &mut self.line).await? {
                    return Ok(None);
                }
            }
        }

        while read_line(&mut self.reader, &mut self.line).await? {
            // Company names are not guaranteed to be UTF-8
            let line = String::from_utf8_lossy(&self.line);
            if line.trim().is_empty() {
                continue;
            }
            return line.parse().map(Some);
        }

        Ok(None)
    }
}
