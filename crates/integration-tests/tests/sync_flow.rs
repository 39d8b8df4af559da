//! Sync pipeline behavior through the dispatcher, with counting doubles in
//! place of the external system.

use std::sync::Arc;

use curator_sync::client::mocks::RecordingResearchApi;
use curator_sync::notifier::mocks::CountingDispatchSink;
use curator_sync::{
    ConsumeOutcome, ElectronicVersionLinkConsumer, EventDispatcher, EventKind, SkipReason,
    SubjectSnapshot, SubjectType, SyncConfig, SyncEvent,
};
use serde_json::json;

fn configured() -> SyncConfig {
    SyncConfig {
        api_base_url: Some("pure.example.org".to_string()),
        api_key: Some("secret".to_string()),
        dispatcher_url: Some("https://dispatch.example.org".to_string()),
        dispatcher_key: Some("token".to_string()),
        ..SyncConfig::default()
    }
}

fn linkable_record() -> serde_json::Value {
    json!({
        "title": "Research output",
        "electronicVersions": [
            {"accessType": {"uri": "/open"}, "versionType": {"uri": "/published"}}
        ]
    })
}

fn tracked_event() -> SyncEvent {
    SyncEvent::new(SubjectType::Item, EventKind::ModifyMetadata, "item-9").with_snapshot(
        SubjectSnapshot::new()
            .with_field("dc.identifier.gerioid", vec!["out-42".to_string()])
            .with_field("dc.identifier.uri", vec!["http://hdl/123".to_string()]),
    )
}

#[tokio::test]
async fn test_full_pipeline_sync_and_notify() {
    let api = Arc::new(RecordingResearchApi::serving(linkable_record()));
    let sink = Arc::new(CountingDispatchSink::succeeding());

    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(Arc::new(ElectronicVersionLinkConsumer::new(
        configured(),
        api.clone(),
        Some(sink.clone()),
    )));

    let outcomes = dispatcher.deliver(&tracked_event()).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].0, "electronic-version-link");
    assert_eq!(
        outcomes[0].1,
        ConsumeOutcome::Synced {
            external_id: "out-42".to_string(),
            notified: true
        }
    );

    // The POST body is the fetched record plus the appended link object
    let (posted_id, posted) = api.last_update.lock().unwrap().clone().unwrap();
    assert_eq!(posted_id, "out-42");
    let versions = posted["electronicVersions"].as_array().unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[1]["typeDiscriminator"], "LinkElectronicVersion");
    assert_eq!(versions[1]["link"], "http://hdl/123");

    assert_eq!(sink.call_count(), 1);
}

#[tokio::test]
async fn test_mismatched_event_never_reaches_the_wire() {
    let api = Arc::new(RecordingResearchApi::serving(linkable_record()));
    let sink = Arc::new(CountingDispatchSink::succeeding());

    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(Arc::new(ElectronicVersionLinkConsumer::new(
        configured(),
        api.clone(),
        Some(sink.clone()),
    )));

    let event = SyncEvent::new(SubjectType::Bundle, EventKind::ModifyMetadata, "bundle-1");
    let outcomes = dispatcher.deliver(&event).await;

    assert_eq!(
        outcomes[0].1,
        ConsumeOutcome::Skipped(SkipReason::SubjectTypeMismatch)
    );
    assert_eq!(api.total_calls(), 0);
    assert_eq!(sink.call_count(), 0);
}

#[tokio::test]
async fn test_unconfigured_pipeline_skips_silently() {
    let api = Arc::new(RecordingResearchApi::serving(linkable_record()));

    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(Arc::new(ElectronicVersionLinkConsumer::new(
        SyncConfig::default(), // No URL, no key
        api.clone(),
        None,
    )));

    let outcomes = dispatcher.deliver(&tracked_event()).await;

    assert_eq!(
        outcomes[0].1,
        ConsumeOutcome::Skipped(SkipReason::MissingConfiguration("api_base_url"))
    );
    assert_eq!(api.total_calls(), 0);
}

#[tokio::test]
async fn test_external_failure_stays_inside_the_consumer() {
    let failing_api = Arc::new(RecordingResearchApi::failing_fetch(503));
    let ok_api = Arc::new(RecordingResearchApi::serving(linkable_record()));

    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(Arc::new(ElectronicVersionLinkConsumer::new(
        configured(),
        failing_api,
        None,
    )));
    dispatcher.register(Arc::new(ElectronicVersionLinkConsumer::new(
        configured(),
        ok_api.clone(),
        None,
    )));

    // The first consumer fails; delivery continues to the second
    let outcomes = dispatcher.deliver(&tracked_event()).await;

    assert_eq!(outcomes.len(), 2);
    assert!(matches!(outcomes[0].1, ConsumeOutcome::Failed { .. }));
    assert!(matches!(outcomes[1].1, ConsumeOutcome::Synced { .. }));
    assert_eq!(
        ok_api
            .update_calls
            .load(std::sync::atomic::Ordering::SeqCst),
        1
    );
}
