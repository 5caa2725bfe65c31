mod common;

use common::{
    Harness, KEY, MemoryDirectory, MemoryFetcher, MemoryIndex, MemoryNotifier, MemoryRecords, item,
};
use std::sync::atomic::Ordering;
use wtrk_core::config::{DedupMode, PipelineConfig};
use wtrk_core::entities::TransactionRecord;
use wtrk_core::events::LookupKey;
use wtrk_core::processors::{IdentityOutcome, ItemOutcome};

fn lookup() -> LookupKey {
    LookupKey::parse(KEY).unwrap()
}

#[tokio::test]
async fn test_valid_and_invalid_item_in_one_batch() {
    let cid1 = item("0xCD", "0x111");
    let harness = Harness::registered(
        &["cid1", "cid2"],
        &[("cid1", cid1.as_str()), ("cid2", "{not json")],
    );

    let outcome = harness.pipeline().process_key(&lookup()).await;

    let report = outcome.report().expect("batch should be processed");
    assert!(matches!(report.outcome("cid1"), Some(ItemOutcome::Notified)));
    assert!(matches!(report.outcome("cid2"), Some(ItemOutcome::ParseFailed(_))));

    assert_eq!(
        harness.rows(),
        vec![TransactionRecord {
            wallet_address: "0xAB".to_string(),
            contract_address: "0xCD".to_string(),
            transaction_hash: "0x111".to_string(),
        }]
    );
    let sent = harness.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "owner@example.com");
    assert!(sent[0].body.contains("0xCD"));
    assert!(sent[0].body.contains("0x111"));
}

#[tokio::test]
async fn test_unregistered_wallet_produces_no_side_effects() {
    let body = item("0xCD", "0x111");
    let harness = Harness::new(
        MemoryDirectory::with("0xOTHER", "other@example.com"),
        MemoryIndex::with(KEY, &["cid1"]),
        MemoryFetcher::with(&[("cid1", body.as_str())]),
        MemoryRecords::default(),
        MemoryNotifier::default(),
    );

    let outcome = harness.pipeline().process_key(&lookup()).await;

    assert!(matches!(outcome, IdentityOutcome::UnknownSubscriber));
    assert_eq!(harness.insert_attempts(), 0);
    assert_eq!(harness.notify_attempts(), 0);
}

#[tokio::test]
async fn test_empty_range_produces_no_side_effects() {
    let harness = Harness::registered(&[], &[]);

    let outcome = harness.pipeline().process_key(&lookup()).await;

    assert!(matches!(outcome, IdentityOutcome::NoContent));
    assert_eq!(harness.insert_attempts(), 0);
    assert_eq!(harness.notify_attempts(), 0);
}

#[tokio::test]
async fn test_lookup_failure_stops_before_range_query() {
    let harness = Harness::new(
        MemoryDirectory {
            fail: true,
            ..MemoryDirectory::default()
        },
        MemoryIndex::with(KEY, &["cid1"]),
        MemoryFetcher::default(),
        MemoryRecords::default(),
        MemoryNotifier::default(),
    );

    let outcome = harness.pipeline().process_key(&lookup()).await;

    assert!(matches!(outcome, IdentityOutcome::LookupFailed(_)));
    assert_eq!(harness.index.queries.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_attempts_match_successfully_parsed_items() {
    // 5 references: one missing at the gateway, one empty, one malformed.
    let a = item("0xC1", "0xA");
    let b = item("0xC2", "0xB");
    let missing_field = r#"{"contract_address":"0xC3"}"#;
    let harness = Harness::registered(
        &["a", "gone", "empty", "bad", "b"],
        &[
            ("a", a.as_str()),
            ("empty", ""),
            ("bad", missing_field),
            ("b", b.as_str()),
        ],
    );

    let outcome = harness.pipeline().process_key(&lookup()).await;
    let report = outcome.report().unwrap();

    assert_eq!(report.len(), 5);
    assert_eq!(report.skipped(), 3);
    assert_eq!(harness.insert_attempts(), 2);
    assert_eq!(harness.notify_attempts(), 2);
    assert!(matches!(report.outcome("gone"), Some(ItemOutcome::FetchFailed(_))));
    assert!(matches!(report.outcome("empty"), Some(ItemOutcome::FetchFailed(_))));
    assert!(matches!(report.outcome("bad"), Some(ItemOutcome::ParseFailed(_))));
}

#[tokio::test]
async fn test_fetch_failure_does_not_block_remaining_items() {
    let later = item("0xCD", "0x999");
    let harness = Harness::registered(&["unreachable", "later"], &[("later", later.as_str())]);

    let outcome = harness.pipeline().process_key(&lookup()).await;
    let report = outcome.report().unwrap();

    assert!(matches!(
        report.outcome("unreachable"),
        Some(ItemOutcome::FetchFailed(_))
    ));
    assert!(matches!(report.outcome("later"), Some(ItemOutcome::Notified)));
    assert_eq!(harness.rows().len(), 1);
}

#[tokio::test]
async fn test_redelivery_duplicates_in_unconditional_mode() {
    let body = item("0xCD", "0x111");
    let harness = Harness::registered(&["cid1"], &[("cid1", body.as_str())]);
    let pipeline = harness.pipeline();

    pipeline.process_key(&lookup()).await;
    pipeline.process_key(&lookup()).await;

    assert_eq!(harness.rows().len(), 2);
    assert_eq!(harness.rows()[0], harness.rows()[1]);
    assert_eq!(harness.sent().len(), 2);
}

#[tokio::test]
async fn test_redelivery_is_deduplicated_in_strict_mode() {
    let body = item("0xCD", "0x111");
    let harness = Harness::registered(&["cid1"], &[("cid1", body.as_str())]);
    harness
        .set_config(PipelineConfig {
            dedup: DedupMode::Strict,
            ..PipelineConfig::default()
        })
        .await;
    let pipeline = harness.pipeline();

    pipeline.process_key(&lookup()).await;
    let second = pipeline.process_key(&lookup()).await;

    assert!(matches!(
        second.report().unwrap().outcome("cid1"),
        Some(ItemOutcome::Duplicate)
    ));
    assert_eq!(harness.insert_attempts(), 2);
    assert_eq!(harness.rows().len(), 1);
    assert_eq!(harness.sent().len(), 1);
}

#[tokio::test]
async fn test_same_transaction_twice_in_one_batch() {
    let body = item("0xCD", "0x111");
    let harness = Harness::registered(
        &["cid1", "cid1-copy"],
        &[("cid1", body.as_str()), ("cid1-copy", body.as_str())],
    );

    harness.pipeline().process_key(&lookup()).await;
    assert_eq!(harness.sent().len(), 2);

    let strict = Harness::registered(
        &["cid1", "cid1-copy"],
        &[("cid1", body.as_str()), ("cid1-copy", body.as_str())],
    );
    strict
        .set_config(PipelineConfig {
            dedup: DedupMode::Strict,
            ..PipelineConfig::default()
        })
        .await;
    strict.pipeline().process_key(&lookup()).await;
    assert_eq!(strict.sent().len(), 1);
}

#[tokio::test]
async fn test_insert_failure_skips_notification_and_continues() {
    let a = item("0xC1", "0xA");
    let b = item("0xC2", "0xB");
    let harness = Harness::new(
        MemoryDirectory::with("0xAB", "owner@example.com"),
        MemoryIndex::with(KEY, &["a", "b"]),
        MemoryFetcher::with(&[("a", a.as_str()), ("b", b.as_str())]),
        MemoryRecords {
            fail: true,
            ..MemoryRecords::default()
        },
        MemoryNotifier::default(),
    );

    let outcome = harness.pipeline().process_key(&lookup()).await;
    let report = outcome.report().unwrap();

    assert_eq!(harness.insert_attempts(), 2);
    assert_eq!(harness.notify_attempts(), 0);
    assert!(matches!(report.outcome("b"), Some(ItemOutcome::InsertFailed(_))));
}

#[tokio::test]
async fn test_notify_failure_keeps_record_and_continues() {
    let a = item("0xC1", "0xA");
    let b = item("0xC2", "0xB");
    let harness = Harness::new(
        MemoryDirectory::with("0xAB", "owner@example.com"),
        MemoryIndex::with(KEY, &["a", "b"]),
        MemoryFetcher::with(&[("a", a.as_str()), ("b", b.as_str())]),
        MemoryRecords::default(),
        MemoryNotifier {
            fail: true,
            ..MemoryNotifier::default()
        },
    );

    let outcome = harness.pipeline().process_key(&lookup()).await;
    let report = outcome.report().unwrap();

    assert_eq!(harness.rows().len(), 2);
    assert_eq!(harness.notify_attempts(), 2);
    assert_eq!(report.notified(), 0);
    assert!(matches!(report.outcome("a"), Some(ItemOutcome::NotifyFailed(_))));
}

#[tokio::test]
async fn test_recipient_override() {
    let body = item("0xCD", "0x111");
    let harness = Harness::registered(&["cid1"], &[("cid1", body.as_str())]);
    harness
        .set_config(PipelineConfig {
            recipient_override: Some("ops@example.com".to_string()),
            ..PipelineConfig::default()
        })
        .await;

    harness.pipeline().process_key(&lookup()).await;

    assert_eq!(harness.sent()[0].recipient, "ops@example.com");
}

#[tokio::test]
async fn test_concurrent_items_process_every_reference() {
    let refs: Vec<String> = (0..20).map(|i| format!("cid{i}")).collect();
    let bodies: Vec<String> = (0..20).map(|i| item("0xCD", &format!("0x{i}"))).collect();
    let ref_list: Vec<&str> = refs.iter().map(String::as_str).collect();
    let body_list: Vec<(&str, &str)> = refs
        .iter()
        .zip(&bodies)
        .filter(|(cid, _)| cid.as_str() != "cid7")
        .map(|(cid, body)| (cid.as_str(), body.as_str()))
        .collect();
    let harness = Harness::registered(&ref_list, &body_list);
    harness
        .set_config(PipelineConfig {
            item_concurrency: 4,
            ..PipelineConfig::default()
        })
        .await;

    let outcome = harness.pipeline().process_key(&lookup()).await;
    let report = outcome.report().unwrap();

    assert_eq!(report.len(), 20);
    assert_eq!(report.notified(), 19);
    assert!(matches!(report.outcome("cid7"), Some(ItemOutcome::FetchFailed(_))));
    assert_eq!(harness.rows().len(), 19);
}

#[tokio::test]
async fn test_range_query_failure_stops_before_fetching() {
    let body = item("0xCD", "0x111");
    let harness = Harness::new(
        MemoryDirectory::with("0xAB", "owner@example.com"),
        MemoryIndex {
            fail: true,
            ..MemoryIndex::with(KEY, &["cid1"])
        },
        MemoryFetcher::with(&[("cid1", body.as_str())]),
        MemoryRecords::default(),
        MemoryNotifier::default(),
    );

    let outcome = harness.pipeline().process_key(&lookup()).await;

    assert!(matches!(outcome, IdentityOutcome::RangeQueryFailed(_)));
    assert_eq!(harness.fetcher.fetches.load(Ordering::SeqCst), 0);
    assert_eq!(harness.insert_attempts(), 0);
    assert_eq!(harness.notify_attempts(), 0);
}
