//! Parsers for the formats served by the EDGAR archive.
//!
//! - [`index`]: pipe-delimited master index records
//! - [`document`]: tagged payloads inside full-text filing envelopes
//! - [`form4`]: Form 4 ownership XML

pub mod document;
#[cfg(feature = "form4")]
pub mod form4;
#[cfg(feature = "index")]
pub mod index;
#[cfg(feature = "form4")]
pub(crate) mod utils;
