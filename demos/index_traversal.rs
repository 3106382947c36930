//! Index traversal example
//!
//! This example walks the quarterly full-index archive over a date range:
//! - Pull-based traversal with a cursor
//! - Filtering by form type
//! - Stopping early from a callback
//!
//! Run with: `RUST_LOG=edgarstream=debug cargo run --example index_traversal`

use chrono::NaiveDate;
use edgarstream::{Edgar, EdgarError, FilingOperations, FilingOptions, IndexOperations};
use std::collections::HashMap;
use std::error::Error;
use std::ops::ControlFlow;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let edgar = Edgar::new("edgarstream Example user@example.com")?;

    println!("=== edgarstream Index Traversal Example ===\n");

    let start = NaiveDate::from_ymd_opt(2024, 8, 12).ok_or("invalid date")?;
    let end = NaiveDate::from_ymd_opt(2024, 8, 16).ok_or("invalid date")?;

    // Example 1: Cursor over 10-K filings
    println!("1. 10-K filings between {} and {}...", start, end);
    let options = FilingOptions::new().with_form_type("10-K").with_limit(10);
    let mut cursor = edgar.filings_between(start, Some(end), Some(options));

    let mut i = 0;
    while let Some(entry) = cursor.next().await? {
        i += 1;
        println!(
            "   {}. {} - {} on {} (CIK: {})",
            i, entry.company_name, entry.form_type, entry.date_filed, entry.cik
        );
        println!("      {}", edgar.document_url(&entry));
    }

    // Example 2: Count form types until 5,000 filings have been seen
    println!("\n2. Counting form types over the first 5,000 filings...");
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut seen = 0;
    edgar
        .for_each_filing_between(start, Some(end), None, |entry| {
            *counts.entry(entry.form_type).or_default() += 1;
            seen += 1;
            Ok::<_, EdgarError>(if seen == 5_000 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            })
        })
        .await?;

    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    for (form_type, count) in counts.iter().take(10) {
        println!("   {:<10} {}", form_type, count);
    }

    println!("\n=== Example completed successfully ===");
    Ok(())
}
