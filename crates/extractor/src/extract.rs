//! Field extraction for a single message.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::category::{Category, Direction};
use crate::registry::PatternRegistry;

/// Output shape for every normalized date.
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Message timestamp as supplied by the exporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    EpochMillis(i64),
    Text(String),
}

/// One exported text message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, alias = "date")]
    pub timestamp: Option<Timestamp>,
    #[serde(default)]
    pub readable_date: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
}

impl RawMessage {
    /// A message with only a body.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Self::default()
        }
    }

    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_readable_date(mut self, readable_date: impl Into<String>) -> Self {
        self.readable_date = Some(readable_date.into());
        self
    }
}

/// Typed fields that can fail to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Amount,
    Date,
    Fee,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Amount => "amount",
            Field::Date => "date",
            Field::Fee => "fee",
        })
    }
}

/// A capture that was present but could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFailure {
    pub field: Field,
    /// The offending captured text.
    pub capture: String,
    pub reason: String,
}

/// Why a message did not produce a storable record.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    /// Empty or absent body.
    #[error("malformed input: {reason}")]
    MalformedInput { reason: String },

    /// The extractor panicked on this record.
    #[error("extraction failed: {reason}")]
    ExtractionFailed { reason: String },

    /// Extraction finished but the record lacks a date or an amount.
    #[error("{category} record missing {}", join_fields(.missing))]
    Validity { category: Category, missing: Vec<Field> },
}

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(Field::to_string)
        .collect::<Vec<_>>()
        .join(" and ")
}

/// A classified message with its typed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTransaction {
    /// `YYYY-MM-DDTHH:MM:SS`, or `None` if no usable date was found.
    pub date: Option<String>,
    pub category: Category,
    pub amount: Option<f64>,
    /// Sender for inbound categories, recipient for outbound ones.
    pub counterparty: Option<String>,
    pub tx_id: Option<String>,
    pub fee: Option<f64>,
    /// The message body exactly as received.
    pub raw_body: String,
    pub source_readable_date: Option<String>,
    /// Captures that were present but unparseable. Not persisted.
    #[serde(skip)]
    pub field_failures: Vec<FieldFailure>,
    /// Registry pattern that classified the message, `None` if nothing
    /// matched. Not persisted.
    #[serde(skip)]
    pub pattern_index: Option<usize>,
}

impl ParsedTransaction {
    pub fn sender(&self) -> Option<&str> {
        match self.category.direction() {
            Direction::Inbound => self.counterparty.as_deref(),
            _ => None,
        }
    }

    pub fn recipient(&self) -> Option<&str> {
        match self.category.direction() {
            Direction::Outbound => self.counterparty.as_deref(),
            _ => None,
        }
    }

    /// A record is storable only with both a date and an amount.
    pub fn validate(&self) -> Result<(), Rejection> {
        let mut missing = Vec::new();
        if self.date.is_none() {
            missing.push(Field::Date);
        }
        if self.amount.is_none() {
            missing.push(Field::Amount);
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Rejection::Validity {
                category: self.category,
                missing,
            })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Applies a [`PatternRegistry`] to individual messages.
///
/// Pure: no I/O, no logging, no clock.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    registry: Arc<PatternRegistry>,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new(PatternRegistry::shared())
    }
}

impl FieldExtractor {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    /// Classify one message and extract its fields.
    ///
    /// Only an empty body is rejected here. Unmatched bodies become
    /// [`Category::Other`] and unparseable captures become `None` with a
    /// [`FieldFailure`] attached; the validity rule is applied by the caller.
    pub fn extract(&self, message: &RawMessage) -> Result<ParsedTransaction, Rejection> {
        let body = message
            .body
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| Rejection::MalformedInput {
                reason: "empty body".to_string(),
            })?;

        let mut txn = ParsedTransaction {
            date: None,
            category: Category::Other,
            amount: None,
            counterparty: None,
            tx_id: None,
            fee: None,
            raw_body: body.to_string(),
            source_readable_date: message.readable_date.clone(),
            field_failures: Vec::new(),
            pattern_index: None,
        };

        let mut date_capture = None;

        if let Some(matched) = self.registry.lookup(body) {
            let bindings = matched.bindings;
            txn.category = matched.category;
            txn.pattern_index = Some(matched.pattern_index);
            txn.tx_id = bindings.tx_id;

            if let Some(raw) = bindings.amount {
                txn.amount = convert(&mut txn.field_failures, Field::Amount, raw, parse_amount);
            }
            if let Some(raw) = bindings.fee {
                txn.fee = convert(&mut txn.field_failures, Field::Fee, raw, parse_amount);
            }

            txn.counterparty = match matched.category.direction() {
                Direction::Inbound | Direction::Outbound => bindings.counterparty,
                Direction::Neutral => None,
            };

            date_capture = bindings.date;
        }

        txn.date = match (date_capture, &message.timestamp) {
            (Some(raw), _) => convert(&mut txn.field_failures, Field::Date, raw, normalize_date),
            (None, Some(Timestamp::EpochMillis(millis))) => {
                let millis = *millis;
                convert(&mut txn.field_failures, Field::Date, millis.to_string(), |_| {
                    format_epoch_millis(millis)
                })
            }
            (None, Some(Timestamp::Text(raw))) => {
                convert(&mut txn.field_failures, Field::Date, raw.clone(), normalize_date)
            }
            (None, None) => None,
        };

        Ok(txn)
    }
}

fn convert<T>(
    failures: &mut Vec<FieldFailure>,
    field: Field,
    capture: String,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Option<T> {
    match parse(&capture) {
        Ok(value) => Some(value),
        Err(reason) => {
            failures.push(FieldFailure {
                field,
                capture,
                reason,
            });
            None
        }
    }
}

/// Parse a non-negative amount, ignoring `,` grouping separators.
pub fn parse_amount(raw: &str) -> Result<f64, String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    let value: f64 = cleaned
        .parse()
        .map_err(|e| format!("not a number: {e}"))?;

    if !value.is_finite() || value < 0.0 {
        return Err(format!("amount out of range: {value}"));
    }

    Ok(value)
}

/// Render epoch milliseconds as a UTC `YYYY-MM-DDTHH:MM:SS` string.
pub fn format_epoch_millis(millis: i64) -> Result<String, String> {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.naive_utc().format(ISO_FORMAT).to_string())
        .ok_or_else(|| format!("epoch milliseconds out of range: {millis}"))
}

/// Normalize either date convention to `YYYY-MM-DDTHH:MM:SS`.
///
/// An all-digit value is epoch milliseconds (rendered in UTC); anything
/// else must be `YYYY-MM-DD HH:MM:SS`, its `T`-separated form, or RFC 3339.
pub fn normalize_date(raw: &str) -> Result<String, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("empty date".to_string());
    }

    if raw.bytes().all(|b| b.is_ascii_digit()) {
        let millis: i64 = raw
            .parse()
            .map_err(|e| format!("bad epoch milliseconds: {e}"))?;
        return format_epoch_millis(millis);
    }

    for format in ["%Y-%m-%d %H:%M:%S", ISO_FORMAT] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt.format(ISO_FORMAT).to_string());
        }
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_utc().format(ISO_FORMAT).to_string())
        .map_err(|_| format!("unrecognized date: {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(body: &str) -> ParsedTransaction {
        FieldExtractor::default().extract(&RawMessage::new(body)).unwrap()
    }

    #[test]
    fn test_incoming_scenario() {
        let txn = extract(
            "You have received 5,000 RWF from John Doe (0788123456) at 2023-01-15 10:30:00",
        );
        assert_eq!(txn.category, Category::Incoming);
        assert_eq!(txn.amount, Some(5000.0));
        assert_eq!(txn.counterparty.as_deref(), Some("John Doe (0788123456)"));
        assert_eq!(txn.sender(), Some("John Doe (0788123456)"));
        assert_eq!(txn.recipient(), None);
        assert_eq!(txn.date.as_deref(), Some("2023-01-15T10:30:00"));
        assert!(txn.is_valid());
    }

    #[test]
    fn test_grouped_amount() {
        let txn = extract("A bank deposit of 12,300,000 RWF has been added at 2024-05-11 18:43:49.");
        assert_eq!(txn.category, Category::Deposit);
        assert_eq!(txn.amount, Some(12_300_000.0));
    }

    #[test]
    fn test_neutral_category_has_no_counterparty() {
        let txn = extract(
            "*162*TxId:13913173274*S*Your payment of 2000 RWF to Airtime with token  has been \
             completed at 2024-05-12 11:41:28. Fee was 0 RWF.",
        );
        assert_eq!(txn.category, Category::Airtime);
        assert_eq!(txn.counterparty, None);
        assert_eq!(txn.tx_id.as_deref(), Some("13913173274"));
        assert_eq!(txn.fee, Some(0.0));
    }

    #[test]
    fn test_outbound_recipient() {
        let txn = extract(
            "*165*S*10000 RWF transferred to Samuel Carter (250791666666) from 36521838 at \
             2024-05-11 20:34:47 .",
        );
        assert_eq!(txn.recipient(), Some("Samuel Carter (250791666666)"));
        assert_eq!(txn.sender(), None);
    }

    #[test]
    fn test_empty_body_rejected() {
        let extractor = FieldExtractor::default();
        let err = extractor.extract(&RawMessage::new("")).unwrap_err();
        assert!(matches!(err, Rejection::MalformedInput { .. }));

        let err = extractor.extract(&RawMessage::default()).unwrap_err();
        assert_eq!(err.to_string(), "malformed input: empty body");
    }

    #[test]
    fn test_unmatched_is_other() {
        let txn = extract("Your MTN bundle expires tomorrow");
        assert_eq!(txn.category, Category::Other);
        assert_eq!(txn.amount, None);
        assert_eq!(txn.counterparty, None);
        assert!(txn.field_failures.is_empty());

        let err = txn.validate().unwrap_err();
        assert_eq!(err.to_string(), "other record missing date and amount");
    }

    #[test]
    fn test_no_date_yields_none() {
        let txn = extract("You have purchased an internet bundle of 1GB for 2000 RWF");
        assert_eq!(txn.category, Category::Bundle);
        assert_eq!(txn.amount, Some(2000.0));
        assert_eq!(txn.date, None);
        assert!(!txn.is_valid());
    }

    #[test]
    fn test_timestamp_fallback() {
        let message = RawMessage::new("You have purchased an internet bundle of 1GB for 2000 RWF")
            .with_timestamp(Timestamp::EpochMillis(1_715_351_458_724));
        let txn = FieldExtractor::default().extract(&message).unwrap();
        assert_eq!(txn.date.as_deref(), Some("2024-05-10T14:30:58"));
    }

    #[test]
    fn test_negative_epoch_timestamp() {
        let message = RawMessage::new("You have purchased an internet bundle of 1GB for 2000 RWF")
            .with_timestamp(Timestamp::EpochMillis(-1_000));
        let txn = FieldExtractor::default().extract(&message).unwrap();
        assert_eq!(txn.date.as_deref(), Some("1969-12-31T23:59:59"));
        assert!(txn.field_failures.is_empty());
    }

    #[test]
    fn test_account_number_not_read_as_date() {
        let txn = extract(
            "*165*S*10000 RWF transferred to Samuel Carter (250791666666) from 1234567890123 \
             at 2024-05-11 20:34:47 .",
        );
        assert_eq!(txn.category, Category::Transfer);
        assert_eq!(txn.date.as_deref(), Some("2024-05-11T20:34:47"));
    }

    #[test]
    fn test_epoch_millis_in_body_normalized() {
        let txn = extract("You have received 500 RWF from Ann at 1715351458724.");
        assert_eq!(txn.date.as_deref(), Some("2024-05-10T14:30:58"));
        assert!(txn.is_valid());
    }

    #[test]
    fn test_pattern_index_recorded() {
        assert_eq!(extract("Welcome to MoMo").pattern_index, None);
        assert_eq!(
            extract("You have received 100 RWF from Bob at 2023-01-15 10:30:00").pattern_index,
            Some(0)
        );
    }

    #[test]
    fn test_body_date_wins_over_timestamp() {
        let message = RawMessage::new("You have received 100 RWF from Bob at 2023-01-15 10:30:00")
            .with_timestamp(Timestamp::EpochMillis(1_715_351_458_724));
        let txn = FieldExtractor::default().extract(&message).unwrap();
        assert_eq!(txn.date.as_deref(), Some("2023-01-15T10:30:00"));
    }

    #[test]
    fn test_bad_date_degrades_to_none() {
        let txn = extract("You have received 100 RWF from Bob at 2023-13-45 10:30:00");
        assert_eq!(txn.category, Category::Incoming);
        assert_eq!(txn.amount, Some(100.0));
        assert_eq!(txn.date, None);
        assert_eq!(txn.field_failures.len(), 1);
        assert_eq!(txn.field_failures[0].field, Field::Date);
        assert_eq!(txn.field_failures[0].capture, "2023-13-45 10:30:00");
    }

    #[test]
    fn test_raw_body_and_readable_date_pass_through() {
        let message = RawMessage::new("  hello  ").with_readable_date("10 May 2024 4:30:58 PM");
        let txn = FieldExtractor::default().extract(&message).unwrap();
        assert_eq!(txn.raw_body, "  hello  ");
        assert_eq!(txn.source_readable_date.as_deref(), Some("10 May 2024 4:30:58 PM"));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12,300"), Ok(12300.0));
        assert_eq!(parse_amount("12,300,000"), Ok(12_300_000.0));
        assert_eq!(parse_amount("1,500.50"), Ok(1500.5));
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("-5").is_err());
        assert!(parse_amount("inf").is_err());
    }

    #[test]
    fn test_normalize_date_formats() {
        assert_eq!(normalize_date("2023-01-15 10:30:00").unwrap(), "2023-01-15T10:30:00");
        assert_eq!(normalize_date("2023-01-15T10:30:00").unwrap(), "2023-01-15T10:30:00");
        assert_eq!(normalize_date("1673778600000").unwrap(), "2023-01-15T10:30:00");
        assert_eq!(normalize_date("2023-01-15T10:30:00+02:00").unwrap(), "2023-01-15T08:30:00");
        assert!(normalize_date("yesterday").is_err());
        assert!(normalize_date("").is_err());
    }

    #[test]
    fn test_rejection_serializes_with_kind() {
        let rejection = Rejection::Validity {
            category: Category::Bundle,
            missing: vec![Field::Date],
        };
        let json = serde_json::to_value(&rejection).unwrap();
        assert_eq!(json["kind"], "validity");
        assert_eq!(json["category"], "bundle");
        assert_eq!(json["missing"][0], "date");
    }
}
