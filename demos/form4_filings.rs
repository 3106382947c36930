//! Form 4 example
//!
//! This example decodes insider transaction filings (Form 4 and 4/A) filed on
//! a single day and prints every non-derivative transaction.
//!
//! Run with: `RUST_LOG=edgarstream=debug cargo run --example form4_filings`

use chrono::NaiveDate;
use edgarstream::{Edgar, FilingOperations};
use std::error::Error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let edgar = Edgar::new("edgarstream Example user@example.com")?;

    println!("=== edgarstream Form 4 Example ===\n");

    let day = NaiveDate::from_ymd_opt(2018, 10, 15).ok_or("invalid date")?;
    let mut forms = edgar.form4_filings_between(day, Some(day));

    let mut decoded = 0;
    while let Some((entry, form)) = forms.next().await? {
        println!(
            "{} ({}) - {} [{}]",
            form.issuer_name, form.issuer_trading_symbol, form.reporting_owner_name, entry.form_type
        );
        for tx in &form.non_derivative_transactions {
            println!(
                "   {} {} {} x {:.0} @ {:.2} -> {:.0} held ({})",
                tx.date,
                tx.transaction_code,
                tx.security_title,
                tx.shares,
                tx.price_per_share,
                tx.shares_owned_following_transaction,
                tx.direct_or_indirect_ownership
            );
        }

        decoded += 1;
        if decoded == 20 {
            forms.close();
            break;
        }
    }

    println!("\n✓ Decoded {} filings", decoded);
    Ok(())
}
