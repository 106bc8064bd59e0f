//! End-to-end extraction over a recorded SMS backup export.

use std::path::PathBuf;
use std::sync::Arc;

use extractor::{
    read_export, BatchParser, Category, FieldExtractor, NullReporter, PatternRegistry, Rejection,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn quiet_parser() -> BatchParser {
    BatchParser::new(FieldExtractor::default(), Arc::new(NullReporter))
}

#[test]
fn test_fixture_batch() {
    let messages = read_export(fixture("sms_export.xml")).unwrap();
    assert_eq!(messages.len(), 11);

    let result = quiet_parser().process(&messages).unwrap();

    let categories: Vec<Category> = result.accepted.iter().map(|t| t.category).collect();
    assert_eq!(
        categories,
        vec![
            Category::Incoming,
            Category::Payment,
            Category::Transfer,
            Category::Deposit,
            Category::Airtime,
            Category::CashPower,
            Category::Withdrawal,
            Category::Bundle,
            Category::Bundle,
        ]
    );

    assert_eq!(result.rejected_count, 2);
    assert_eq!(result.unmatched_count, 1);
    assert_eq!(result.rejection_log[0].index, 8);
    assert!(matches!(
        result.rejection_log[0].reason,
        Rejection::Validity {
            category: Category::Other,
            ..
        }
    ));
    assert_eq!(result.rejection_log[1].index, 9);
    assert!(matches!(
        result.rejection_log[1].reason,
        Rejection::MalformedInput { .. }
    ));
}

#[test]
fn test_fixture_fields() {
    let messages = read_export(fixture("sms_export.xml")).unwrap();
    let result = quiet_parser().process(&messages).unwrap();

    let incoming = &result.accepted[0];
    assert_eq!(incoming.amount, Some(2000.0));
    assert_eq!(incoming.sender(), Some("Jane Smith (*********013)"));
    assert_eq!(incoming.tx_id.as_deref(), Some("76662021700"));
    assert_eq!(incoming.date.as_deref(), Some("2024-05-10T16:30:51"));
    assert_eq!(
        incoming.source_readable_date.as_deref(),
        Some("10 May 2024 4:30:58 PM")
    );

    let deposit = &result.accepted[3];
    assert_eq!(deposit.amount, Some(40_000.0));
    assert_eq!(deposit.counterparty, None);

    let withdrawal = &result.accepted[6];
    assert_eq!(withdrawal.recipient(), Some("Agent Sophia (250790777777)"));
    assert_eq!(withdrawal.fee, Some(350.0));

    let dateless_bundle = &result.accepted[8];
    assert_eq!(dateless_bundle.amount, Some(2000.0));
    assert_eq!(dateless_bundle.date.as_deref(), Some("2024-05-14T15:20:00"));
}

#[test]
fn test_fixture_reproducible_across_workers() {
    let messages = read_export(fixture("sms_export.xml")).unwrap();
    let sequential = quiet_parser().process(&messages).unwrap();
    let parallel = quiet_parser().with_workers(4).process(&messages).unwrap();

    assert_eq!(
        serde_json::to_string(&sequential).unwrap(),
        serde_json::to_string(&parallel).unwrap()
    );
}

#[test]
fn test_custom_registry_extends_categories() {
    let registry = PatternRegistry::builder()
        .pattern(
            Category::Deposit,
            r"savings\s+of\s+(?P<amount>\d[\d,]*)\s*rwf.*?(?P<date>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})",
        )
        .build()
        .unwrap();
    let parser = BatchParser::new(FieldExtractor::new(Arc::new(registry)), Arc::new(NullReporter));

    let messages = vec![extractor::RawMessage::new(
        "Your savings of 1,250 RWF were credited at 2024-06-01 09:00:00",
    )];
    let result = parser.process(&messages).unwrap();

    assert_eq!(result.accepted[0].category, Category::Deposit);
    assert_eq!(result.accepted[0].amount, Some(1250.0));
}
