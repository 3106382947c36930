//! Quarterly full-index traversal.
//!
//! EDGAR partitions its filing manifest by calendar quarter: every quarter has
//! a `full-index/<YEAR>/QTR<1-4>/master.gz` listing all filings accepted in it.
//! To find every filing between two dates we fetch the partitions that overlap
//! the range and keep the entries whose filing date falls inside it.
//!
//! Partitions are visited newest first. Callers that only care about recent
//! filings can stop after the first few results without ever fetching the
//! older quarters:
//!
//! ```text
//! start = 2018-06-01, end = 2018-10-20
//!
//!   2018/QTR4 ──▶ 2018/QTR3 ──▶ 2018/QTR2
//!   (fetched one at a time, each streamed through gunzip + line parser)
//! ```
//!
//! # Examples
//!
//! ```ignore
//! use chrono::NaiveDate;
//! use edgarstream::{Edgar, FilingOptions, IndexOperations};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let edgar = Edgar::new("MyApp contact@example.com")?;
//!
//!     let start = NaiveDate::from_ymd_opt(2018, 10, 15).unwrap();
//!     let end = NaiveDate::from_ymd_opt(2018, 10, 19);
//!     let opts = FilingOptions::new().with_form_type("4");
//!
//!     let mut filings = edgar.filings_between(start, end, Some(opts));
//!     while let Some(entry) = filings.next().await? {
//!         println!("{}", entry);
//!     }
//!     Ok(())
//! }
//! ```

use super::Edgar;
use super::body::{Body, GunzipReader};
use super::error::{EdgarError, Result};
use super::options::FilingOptions;
use super::parsing::index::{IndexEntry, MasterIndexReader};
use super::traits::{IndexOperations, Transport};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::io::BufReader;

/// The first year covered by the full-index archive.
pub const FIRST_INDEX_YEAR: i32 = 1993;

/// Calendar quarter (Q1-Q4).
///
/// EDGAR index directories are grouped by quarter (e.g., `QTR1` .. `QTR4`).
///
/// Each quarter maps to specific months:
/// - Q1: January through March
/// - Q2: April through June
/// - Q3: July through September
/// - Q4: October through December
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quarter {
    Q1 = 1,
    Q2 = 2,
    Q3 = 3,
    Q4 = 4,
}

impl Quarter {
    const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    /// Creates a Quarter from a month number (1-12)
    ///
    /// # Arguments
    /// * `month` - Month number (1-12)
    ///
    /// # Returns
    /// * `Ok(Quarter)` if month is valid
    /// * `Err(EdgarError::InvalidMonth)` if month is invalid
    pub fn from_month(month: u32) -> Result<Self> {
        match month {
            1..=3 => Ok(Quarter::Q1),
            4..=6 => Ok(Quarter::Q2),
            7..=9 => Ok(Quarter::Q3),
            10..=12 => Ok(Quarter::Q4),
            _ => Err(EdgarError::InvalidMonth),
        }
    }

    /// Returns the quarter containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        // chrono months are always 1..=12
        Self::ALL[date.month0() as usize / 3]
    }

    /// Converts the quarter to its integer representation (1-4).
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }
}

/// A year + quarter pair identifying one full-index partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgarPeriod {
    year: i32,
    quarter: Quarter,
}

impl EdgarPeriod {
    /// Creates a new EdgarPeriod (year must be >= 1993).
    pub fn new(year: i32, quarter: Quarter) -> Result<Self> {
        if year < FIRST_INDEX_YEAR {
            return Err(EdgarError::InvalidYear);
        }
        Ok(Self { year, quarter })
    }

    /// Returns the partition containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            quarter: Quarter::of(date),
        }
    }

    /// Returns the year of this period.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Returns the quarter of this period.
    pub fn quarter(&self) -> Quarter {
        self.quarter
    }

    /// Builds the URL of this partition's gzipped master index.
    pub fn master_index_url(&self, archives_url: &str) -> String {
        format!(
            "{}/edgar/full-index/{}/QTR{}/master.gz",
            archives_url.trim_end_matches('/'),
            self.year,
            self.quarter.as_i32()
        )
    }
}

impl fmt::Display for EdgarPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/QTR{}", self.year, self.quarter.as_i32())
    }
}

/// Lists the partitions overlapping `[start, end]`, newest first.
///
/// Years run from `end` down to `start`; within a year quarters run from the
/// last relevant one down to the first. An inverted range yields nothing.
///
/// ```rust
/// use chrono::NaiveDate;
/// use edgarstream::{EdgarPeriod, Quarter, partitions_between};
///
/// let start = NaiveDate::from_ymd_opt(2018, 6, 1).unwrap();
/// let end = NaiveDate::from_ymd_opt(2018, 10, 20).unwrap();
/// let quarters: Vec<_> = partitions_between(start, end)
///     .iter()
///     .map(|p| (p.year(), p.quarter()))
///     .collect();
/// assert_eq!(
///     quarters,
///     vec![(2018, Quarter::Q4), (2018, Quarter::Q3), (2018, Quarter::Q2)]
/// );
/// ```
pub fn partitions_between(start: NaiveDate, end: NaiveDate) -> Vec<EdgarPeriod> {
    if start > end {
        return Vec::new();
    }

    let first = EdgarPeriod::containing(start);
    let last = EdgarPeriod::containing(end);

    let mut periods = Vec::new();
    for year in (first.year..=last.year).rev() {
        let start_quarter = if year == first.year {
            first.quarter
        } else {
            Quarter::Q1
        };
        let end_quarter = if year == last.year {
            last.quarter
        } else {
            Quarter::Q4
        };

        for quarter in Quarter::ALL.iter().rev() {
            if (start_quarter..=end_quarter).contains(quarter) {
                periods.push(EdgarPeriod {
                    year,
                    quarter: *quarter,
                });
            }
        }
    }
    periods
}

type PartitionReader = MasterIndexReader<BufReader<GunzipReader<Body>>>;

/// An open partition and the URL it was fetched from.
struct OpenPartition {
    url: String,
    reader: PartitionReader,
}

/// Pull-based cursor over the index entries filed between two dates.
///
/// Created by [`IndexOperations::filings_between`]. Each call to
/// [`next`](Self::next) reads from the currently open partition and moves on to
/// the next (older) partition when it is exhausted. At most one partition body
/// is open at any time.
pub struct FilingCursor {
    transport: Arc<dyn Transport>,
    archives_url: String,
    pending: VecDeque<EdgarPeriod>,
    current: Option<OpenPartition>,
    start: NaiveDate,
    end: NaiveDate,
    options: FilingOptions,
    yielded: usize,
}

impl FilingCursor {
    pub(crate) fn new(
        edgar: &Edgar,
        start: NaiveDate,
        end: NaiveDate,
        options: FilingOptions,
    ) -> Self {
        Self {
            transport: Arc::clone(&edgar.transport),
            archives_url: edgar.edgar_archives_url.clone(),
            pending: partitions_between(start, end).into(),
            current: None,
            start,
            end,
            options,
            yielded: 0,
        }
    }

    /// Returns the inclusive date range this cursor covers.
    pub fn range(&self) -> (NaiveDate, NaiveDate) {
        (self.start, self.end)
    }

    /// Returns the next matching entry, or `None` once every partition has
    /// been read (or the configured limit is reached).
    ///
    /// # Errors
    ///
    /// Transport, status, transfer, decompression and malformed-record errors
    /// are returned as soon as they occur. The cursor is closed at that point:
    /// every later call returns `Ok(None)`.
    pub async fn next(&mut self) -> Result<Option<IndexEntry>> {
        let next = self.advance().await;
        if next.is_err() {
            self.close();
        }
        next
    }

    async fn advance(&mut self) -> Result<Option<IndexEntry>> {
        if self
            .options
            .limit
            .is_some_and(|limit| self.yielded >= limit)
        {
            self.close();
            return Ok(None);
        }

        loop {
            let Some(partition) = self.current.as_mut() else {
                match self.pending.pop_front() {
                    Some(period) => {
                        let transport = Arc::clone(&self.transport);
                        let url = period.master_index_url(&self.archives_url);
                        self.current = Some(Self::open(transport, period, url).await?);
                        continue;
                    }
                    None => return Ok(None),
                }
            };

            let entry = match partition.reader.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => {
                    tracing::debug!("Finished partition {}", partition.url);
                    self.current = None;
                    continue;
                }
                Err(EdgarError::FileError(source)) => {
                    let url = partition.url.clone();
                    // GunzipReader reports bad compressed data as InvalidData
                    return Err(if source.kind() == io::ErrorKind::InvalidData {
                        EdgarError::Decompression { url, source }
                    } else {
                        EdgarError::Transfer { url, source }
                    });
                }
                Err(e) => return Err(e),
            };

            if entry.date_filed < self.start || entry.date_filed > self.end {
                continue;
            }
            if !self.options.matches(&entry) {
                continue;
            }

            self.yielded += 1;
            return Ok(Some(entry));
        }
    }

    /// Drops the open partition and forgets the remaining ones.
    pub fn close(&mut self) {
        self.current = None;
        self.pending.clear();
    }

    async fn open(
        transport: Arc<dyn Transport>,
        period: EdgarPeriod,
        url: String,
    ) -> Result<OpenPartition> {
        tracing::debug!("Fetching partition {} from {}", period, url);

        let body = transport.open(&url).await?;
        let reader = MasterIndexReader::new(BufReader::new(GunzipReader::new(body)));
        Ok(OpenPartition { url, reader })
    }
}

impl fmt::Debug for FilingCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilingCursor")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("pending", &self.pending)
            .field("current", &self.current.as_ref().map(|p| &p.url))
            .field("yielded", &self.yielded)
            .finish()
    }
}

/// Operations for walking the full-index archive.
///
/// # Examples
///
/// ```ignore
/// use chrono::NaiveDate;
/// use edgarstream::{Edgar, IndexOperations};
/// use std::ops::ControlFlow;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let edgar = Edgar::new("MyApp contact@example.com")?;
///     let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
///
///     let mut seen = 0;
///     edgar
///         .for_each_filing_between(start, None, None, |entry| {
///             println!("{}", entry);
///             seen += 1;
///             Ok::<_, edgarstream::EdgarError>(if seen == 100 {
///                 ControlFlow::Break(())
///             } else {
///                 ControlFlow::Continue(())
///             })
///         })
///         .await?;
///     Ok(())
/// }
/// ```
#[async_trait]
impl IndexOperations for Edgar {
    fn filings_between(
        &self,
        start: NaiveDate,
        end: Option<NaiveDate>,
        options: Option<FilingOptions>,
    ) -> FilingCursor {
        let end = end.unwrap_or_else(|| Utc::now().date_naive());
        FilingCursor::new(self, start, end, options.unwrap_or_default())
    }

    async fn for_each_filing_between<F, E>(
        &self,
        start: NaiveDate,
        end: Option<NaiveDate>,
        options: Option<FilingOptions>,
        mut f: F,
    ) -> std::result::Result<(), E>
    where
        F: FnMut(IndexEntry) -> std::result::Result<ControlFlow<()>, E> + Send,
        E: From<EdgarError> + Send,
    {
        let mut cursor = self.filings_between(start, end, options);
        while let Some(entry) = cursor.next().await? {
            if f(entry)?.is_break() {
                tracing::debug!("Traversal stopped by caller");
                break;
            }
        }
        Ok(())
    }
}
