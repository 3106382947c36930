//! # edgarstream - Streaming access to the SEC EDGAR archive
//!
//! edgarstream walks the SEC's quarterly full-index archive over a date range
//! and pulls structured payloads out of full-text filing documents, without
//! ever holding a whole index partition or filing in memory.
//!
//! ## Features
//!
//! - **Index traversal** - Every filing accepted between two dates, newest
//!   quarter first, streamed through gunzip and a line parser
//! - **Payload extraction** - The lines between `<XML>` and `</XML>` (or any
//!   other tag) of a full-text filing, read lazily
//! - **Form 4 decoding** - Insider transaction filings decoded into typed records
//! - **Rate-limited HTTP transport** - Complies with SEC.gov fair access rules,
//!   retries throttled requests with backoff
//!
//! ## Requirements
//!
//! edgarstream is async-first and built on [tokio](https://tokio.rs).
//!
//! ## Basic Usage
//!
//! ```ignore
//! use chrono::NaiveDate;
//! use edgarstream::{Edgar, FilingOperations};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Initialize with a proper user agent (required by SEC.gov)
//!     let edgar = Edgar::new("YourAppName contact@example.com")?;
//!
//!     let start = NaiveDate::from_ymd_opt(2018, 10, 15).unwrap();
//!     let end = NaiveDate::from_ymd_opt(2018, 10, 19);
//!
//!     let mut forms = edgar.form4_filings_between(start, end);
//!     while let Some((entry, form)) = forms.next().await? {
//!         println!(
//!             "{} {}: {} transaction(s) by {}",
//!             entry.date_filed,
//!             form.issuer_trading_symbol,
//!             form.non_derivative_transactions.len(),
//!             form.reporting_owner_name
//!         );
//!     }
//!
//!     Ok(())
//! }
//! ```

mod body;
mod config;
mod core;
mod error;
pub mod parsing;
mod traits;

#[cfg(feature = "index")]
mod filings;
#[cfg(feature = "index")]
mod index;
#[cfg(feature = "index")]
mod options;

// Core functionality (always available)
pub use body::{Body, StreamBody};
pub use config::{EdgarConfig, EdgarUrls};
pub use core::{Edgar, HttpTransport};
pub use error::{EdgarError, Result};
pub use parsing::document::{PayloadState, TaggedPayload, extract_tag};
pub use traits::Transport;

#[cfg(feature = "index")]
pub use body::GunzipReader;
#[cfg(feature = "index")]
pub use index::{EdgarPeriod, FIRST_INDEX_YEAR, FilingCursor, Quarter, partitions_between};
#[cfg(feature = "index")]
pub use options::FilingOptions;
#[cfg(feature = "index")]
pub use parsing::index::{IndexEntry, MasterIndexReader};
#[cfg(feature = "index")]
pub use traits::{FilingOperations, IndexOperations};

#[cfg(feature = "form4")]
pub use filings::Form4Cursor;
#[cfg(feature = "form4")]
pub use parsing::form4::{Form4, Form4Transaction, parse_form4, parse_form4_from_document};

/// Current crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
