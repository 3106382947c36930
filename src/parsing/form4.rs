//! Form 4 (statement of changes in beneficial ownership) decoding.
//!
//! Form 4 filings embed an `<ownershipDocument>` XML payload inside the
//! full-text envelope. The XML nests most values one or two levels deep
//! (`transactionAmounts > transactionShares > value`); the raw serde structs
//! below mirror that nesting and are flattened into [`Form4`] and
//! [`Form4Transaction`].

use super::document::extract_tag;
use super::utils::{
    deserialize_date, deserialize_f64, deserialize_flag, deserialize_robust_f64,
    deserialize_str_to_u64,
};
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncBufRead;

/// Form type of an original Form 4 filing.
pub const FORM_TYPE_4: &str = "4";

/// Form type of an amended Form 4 filing.
pub const FORM_TYPE_4A: &str = "4/A";

/// Tag wrapping the XML payload inside the full-text envelope.
pub const XML_TAG: &str = "XML";

/// A decoded Form 4 filing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Form4 {
    pub period_of_report: NaiveDate,
    pub issuer_cik: u64,
    pub issuer_name: String,
    pub issuer_trading_symbol: String,
    pub reporting_owner_cik: u64,
    pub reporting_owner_name: String,
    /// Officer title, when the reporting owner is an officer. Read from
    /// `reportingOwnerRelationship > officerTitle`, the element current
    /// ownership schemas populate.
    pub reporting_owner_title: String,
    pub reporting_owner_is_director: bool,
    pub reporting_owner_is_officer: bool,
    pub reporting_owner_is_ten_percent_owner: bool,
    pub non_derivative_transactions: Vec<Form4Transaction>,
    pub derivative_transactions: Vec<Form4Transaction>,
}

/// One row of the non-derivative or derivative transaction table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Form4Transaction {
    pub security_title: String,
    pub date: NaiveDate,
    pub conversion_or_exercise_price: f64,
    pub form_type: String,
    pub transaction_code: String,
    pub equity_swap_involved: bool,
    pub shares: f64,
    pub price_per_share: f64,
    pub acquired_disposed_code: String,
    pub shares_owned_following_transaction: f64,
    pub direct_or_indirect_ownership: String,
}

/// Decodes an `<ownershipDocument>` XML payload.
pub fn parse_form4(xml: &str) -> Result<Form4> {
    let raw: RawOwnershipDocument = quick_xml::de::from_str(xml)?;
    Ok(raw.into())
}

/// Extracts the `<XML>` payload from a full-text filing envelope and decodes it.
///
/// Only the envelope up to the closing `</XML>` line is read.
pub async fn parse_form4_from_document<R>(reader: R) -> Result<Form4>
where
    R: AsyncBufRead + Unpin,
{
    let mut payload = extract_tag(reader, XML_TAG).await?;
    let xml = payload.read_to_string().await?;
    parse_form4(&xml)
}

/// Returns `true` for original and amended Form 4 filings.
pub fn is_form4(form_type: &str) -> bool {
    matches!(form_type.trim(), FORM_TYPE_4 | FORM_TYPE_4A)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOwnershipDocument {
    #[serde(deserialize_with = "deserialize_date")]
    period_of_report: NaiveDate,
    issuer: RawIssuer,
    #[serde(default)]
    reporting_owner: Vec<RawReportingOwner>,
    #[serde(default)]
    non_derivative_table: RawNonDerivativeTable,
    #[serde(default)]
    derivative_table: RawDerivativeTable,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIssuer {
    #[serde(deserialize_with = "deserialize_str_to_u64")]
    issuer_cik: u64,
    #[serde(default)]
    issuer_name: String,
    #[serde(default)]
    issuer_trading_symbol: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReportingOwner {
    #[serde(default)]
    reporting_owner_id: RawReportingOwnerId,
    #[serde(default)]
    reporting_owner_relationship: RawRelationship,
}

#[derive(Debug, Default, Deserialize)]
struct RawReportingOwnerId {
    #[serde(rename = "rptOwnerCik", default, deserialize_with = "deserialize_str_to_u64")]
    cik: u64,
    #[serde(rename = "rptOwnerName", default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRelationship {
    #[serde(default, deserialize_with = "deserialize_flag")]
    is_director: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    is_officer: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    is_ten_percent_owner: bool,
    #[serde(default)]
    officer_title: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawNonDerivativeTable {
    #[serde(rename = "nonDerivativeTransaction", default)]
    transactions: Vec<RawTransaction>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDerivativeTable {
    #[serde(rename = "derivativeTransaction", default)]
    transactions: Vec<RawTransaction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransaction {
    #[serde(default)]
    security_title: TextValue,
    #[serde(default)]
    conversion_or_exercise_price: RobustNumberValue,
    transaction_date: DateValue,
    #[serde(default)]
    transaction_coding: RawCoding,
    #[serde(default)]
    transaction_amounts: RawAmounts,
    #[serde(default)]
    post_transaction_amounts: RawPostAmounts,
    #[serde(default)]
    ownership_nature: RawOwnershipNature,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCoding {
    #[serde(default)]
    transaction_form_type: String,
    #[serde(default)]
    transaction_code: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    equity_swap_involved: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAmounts {
    #[serde(default)]
    transaction_shares: NumberValue,
    #[serde(default)]
    transaction_price_per_share: RobustNumberValue,
    #[serde(default)]
    transaction_acquired_disposed_code: TextValue,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPostAmounts {
    #[serde(default)]
    shares_owned_following_transaction: NumberValue,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOwnershipNature {
    #[serde(default)]
    direct_or_indirect_ownership: TextValue,
}

// `<x><value>…</value><footnoteId …/></x>` wrappers

#[derive(Debug, Default, Deserialize)]
struct TextValue {
    #[serde(default)]
    value: String,
}

#[derive(Debug, Default, Deserialize)]
struct NumberValue {
    #[serde(default, deserialize_with = "deserialize_f64")]
    value: f64,
}

#[derive(Debug, Default, Deserialize)]
struct RobustNumberValue {
    #[serde(default, deserialize_with = "deserialize_robust_f64")]
    value: f64,
}

#[derive(Debug, Deserialize)]
struct DateValue {
    #[serde(deserialize_with = "deserialize_date")]
    value: NaiveDate,
}

impl From<RawTransaction> for Form4Transaction {
    fn from(raw: RawTransaction) -> Self {
        Form4Transaction {
            security_title: raw.security_title.value,
            date: raw.transaction_date.value,
            conversion_or_exercise_price: raw.conversion_or_exercise_price.value,
            form_type: raw.transaction_coding.transaction_form_type,
            transaction_code: raw.transaction_coding.transaction_code,
            equity_swap_involved: raw.transaction_coding.equity_swap_involved,
            shares: raw.transaction_amounts.transaction_shares.value,
            price_per_share: raw.transaction_amounts.transaction_price_per_share.value,
            acquired_disposed_code: raw.transaction_amounts.transaction_acquired_disposed_code.value,
            shares_owned_following_transaction: raw
                .post_transaction_amounts
                .shares_owned_following_transaction
                .value,
            direct_or_indirect_ownership: raw.ownership_nature.direct_or_indirect_ownership.value,
        }
    }
}

impl From<RawOwnershipDocument> for Form4 {
    fn from(raw: RawOwnershipDocument) -> Self {
        // Joint filings list several owners; the first one is the filer
        let owner = raw.reporting_owner.into_iter().next().unwrap_or_default();

        Form4 {
            period_of_report: raw.period_of_report,
            issuer_cik: raw.issuer.issuer_cik,
            issuer_name: raw.issuer.issuer_name,
            issuer_trading_symbol: raw.issuer.issuer_trading_symbol,
            reporting_owner_cik: owner.reporting_owner_id.cik,
            reporting_owner_name: owner.reporting_owner_id.name,
            reporting_owner_title: owner.reporting_owner_relationship.officer_title,
            reporting_owner_is_director: owner.reporting_owner_relationship.is_director,
            reporting_owner_is_officer: owner.reporting_owner_relationship.is_officer,
            reporting_owner_is_ten_percent_owner: owner
                .reporting_owner_relationship
                .is_ten_percent_owner,
            non_derivative_transactions: raw
                .non_derivative_table
                .transactions
                .into_iter()
                .map(Into::into)
                .collect(),
            derivative_transactions: raw
                .derivative_table
                .transactions
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EdgarError;

    const MINIMAL: &str = r#"<?xml version="1.0"?>
<ownershipDocument>
    <periodOfReport>2021-03-01</periodOfReport>
    <issuer>
        <issuerCik>0000320193</issuerCik>
        <issuerName>Apple Inc.</issuerName>
        <issuerTradingSymbol>AAPL</issuerTradingSymbol>
    </issuer>
    <reportingOwner>
        <reportingOwnerId>
            <rptOwnerCik>0001000001</rptOwnerCik>
            <rptOwnerName>DOE JANE</rptOwnerName>
        </reportingOwnerId>
        <reportingOwnerRelationship>
            <isDirector>true</isDirector>
        </reportingOwnerRelationship>
    </reportingOwner>
    <reportingOwner>
        <reportingOwnerId>
            <rptOwnerCik>0001000002</rptOwnerCik>
            <rptOwnerName>DOE TRUST</rptOwnerName>
        </reportingOwnerId>
    </reportingOwner>
    <derivativeTable>
        <derivativeTransaction>
            <securityTitle><value>Stock Option</value></securityTitle>
            <conversionOrExercisePrice><value>N/A</value></conversionOrExercisePrice>
            <transactionDate><value>2021-03-01</value></transactionDate>
            <transactionCoding>
                <transactionFormType>4</transactionFormType>
                <transactionCode>M</transactionCode>
                <equitySwapInvolved>0</equitySwapInvolved>
            </transactionCoding>
            <transactionAmounts>
                <transactionShares><value>100</value></transactionShares>
                <transactionPricePerShare><value></value></transactionPricePerShare>
                <transactionAcquiredDisposedCode><value>D</value></transactionAcquiredDisposedCode>
            </transactionAmounts>
            <postTransactionAmounts>
                <sharesOwnedFollowingTransaction><value>0</value></sharesOwnedFollowingTransaction>
            </postTransactionAmounts>
            <ownershipNature>
                <directOrIndirectOwnership><value>I</value></directOrIndirectOwnership>
            </ownershipNature>
        </derivativeTransaction>
    </derivativeTable>
</ownershipDocument>"#;

    #[test]
    fn test_parse_minimal_document() {
        let form = parse_form4(MINIMAL).unwrap();

        assert_eq!(form.issuer_cik, 320193);
        assert_eq!(form.issuer_trading_symbol, "AAPL");
        assert_eq!(form.reporting_owner_cik, 1000001);
        assert_eq!(form.reporting_owner_name, "DOE JANE");
        assert!(form.reporting_owner_is_director);
        assert!(!form.reporting_owner_is_officer);
        assert_eq!(form.reporting_owner_title, "");
        assert!(form.non_derivative_transactions.is_empty());

        let option = &form.derivative_transactions[0];
        assert_eq!(option.security_title, "Stock Option");
        assert_eq!(option.conversion_or_exercise_price, 0.0);
        assert_eq!(option.price_per_share, 0.0);
        assert_eq!(option.shares, 100.0);
        assert_eq!(option.transaction_code, "M");
        assert_eq!(option.direct_or_indirect_ownership, "I");
    }

    #[test]
    fn test_invalid_xml() {
        assert!(matches!(
            parse_form4("<ownershipDocument><issuer>"),
            Err(EdgarError::XmlError(_))
        ));
    }

    #[test]
    fn test_is_form4() {
        assert!(is_form4("4"));
        assert!(is_form4("4/A"));
        assert!(!is_form4("424B2"));
        assert!(!is_form4("S-4"));
    }
}
