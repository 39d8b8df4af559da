// Electronic-Version Link Consumer
//
// The one configured pipeline: filter -> extract -> sync -> notify.
// Mirrors an item's handle into the external record's electronicVersions
// array whenever its metadata changes.

use crate::client::{append_version_link, ResearchApi};
use crate::config::SyncConfig;
use crate::consumer::Consumer;
use crate::event::{EventKind, SubjectType, SyncEvent};
use crate::notifier::DispatchSink;
use crate::outcome::{ConsumeOutcome, FailureStage, SkipReason};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

const HANDLE_FIELD: &str = "dc.identifier.uri";

/// Declared interest: Item subjects, metadata modifications only.
pub struct ElectronicVersionLinkConsumer {
    config: SyncConfig,
    api: Arc<dyn ResearchApi>,
    dispatcher: Option<Arc<dyn DispatchSink>>,
}

impl ElectronicVersionLinkConsumer {
    pub fn new(
        config: SyncConfig,
        api: Arc<dyn ResearchApi>,
        dispatcher: Option<Arc<dyn DispatchSink>>,
    ) -> Self {
        Self {
            config,
            api,
            dispatcher,
        }
    }

    /// Filter + configuration stage. Returns the external id and handle on
    /// a match; the consumer touches nothing external before this passes.
    fn extract<'a>(&self, event: &'a SyncEvent) -> Result<(&'a str, &'a str), SkipReason> {
        if event.subject_type != SubjectType::Item {
            warn!(
                event = %event,
                "Consumer should not have been given this kind of subject, skipping"
            );
            return Err(SkipReason::SubjectTypeMismatch);
        }
        if event.kind != EventKind::ModifyMetadata {
            warn!(
                event = %event,
                "Consumer should not have been given this kind of event, skipping"
            );
            return Err(SkipReason::EventKindMismatch);
        }

        if self.config.api_base_url.is_none() {
            warn!(event = %event, "Cannot get external API URL, skipping");
            return Err(SkipReason::MissingConfiguration("api_base_url"));
        }
        if self.config.api_key.is_none() {
            warn!(event = %event, "Cannot get external API key, skipping");
            return Err(SkipReason::MissingConfiguration("api_key"));
        }

        let snapshot = match &event.snapshot {
            Some(s) => s,
            None => {
                debug!(event = %event, "Event carries no subject snapshot, skipping");
                return Err(SkipReason::NotTracked);
            }
        };

        // The external key is the first value of the configured field; an
        // absent key just means the item is not mirrored externally
        let external_id = match snapshot.first_value(&self.config.metadata_field) {
            Some(id) => id,
            None => {
                debug!(
                    event = %event,
                    field = %self.config.metadata_field,
                    "Subject has no external identifier, skipping"
                );
                return Err(SkipReason::NotTracked);
            }
        };

        let handle = match snapshot.first_value(HANDLE_FIELD) {
            Some(h) => h,
            None => {
                debug!(event = %event, "Subject has no handle to link, skipping");
                return Err(SkipReason::MissingHandle);
            }
        };

        Ok((external_id, handle))
    }
}

#[async_trait]
impl Consumer for ElectronicVersionLinkConsumer {
    fn name(&self) -> &str {
        "electronic-version-link"
    }

    async fn consume(&self, event: &SyncEvent) -> ConsumeOutcome {
        let (external_id, handle) = match self.extract(event) {
            Ok(pair) => pair,
            Err(reason) => return ConsumeOutcome::Skipped(reason),
        };

        // Read-modify-write round trip; each leg fails independently and
        // abandons just this event, no retry
        let mut record = match self.api.fetch_record(external_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!(event = %event, error = %e, "Cannot get record from external system, skipping");
                return ConsumeOutcome::Failed {
                    stage: FailureStage::Fetch,
                    external_id: external_id.to_string(),
                };
            }
        };

        if let Err(e) = append_version_link(&mut record, handle) {
            warn!(event = %event, error = %e, "External record not linkable, skipping");
            return ConsumeOutcome::Failed {
                stage: FailureStage::RecordShape,
                external_id: external_id.to_string(),
            };
        }

        if let Err(e) = self.api.update_record(external_id, &record).await {
            warn!(event = %event, error = %e, "Cannot update record in external system, skipping");
            return ConsumeOutcome::Failed {
                stage: FailureStage::Update,
                external_id: external_id.to_string(),
            };
        }

        // Best-effort downstream ping; failure rides along in the outcome
        let notified = match (&self.dispatcher, &self.config.dispatcher_url) {
            (Some(sink), Some(_)) => sink.notify(&event.subject_id).await,
            _ => false,
        };

        ConsumeOutcome::Synced {
            external_id: external_id.to_string(),
            notified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mocks::RecordingResearchApi;
    use crate::event::SubjectSnapshot;
    use crate::notifier::mocks::CountingDispatchSink;
    use serde_json::json;

    fn config_with_api() -> SyncConfig {
        SyncConfig {
            api_base_url: Some("pure.example.org".to_string()),
            api_key: Some("secret".to_string()),
            ..SyncConfig::default()
        }
    }

    fn tracked_item_event() -> SyncEvent {
        SyncEvent::new(SubjectType::Item, EventKind::ModifyMetadata, "item-9").with_snapshot(
            SubjectSnapshot::new()
                .with_field("dc.identifier.gerioid", vec!["out-42".to_string()])
                .with_field("dc.identifier.uri", vec!["http://hdl/123".to_string()]),
        )
    }

    fn linkable_record() -> serde_json::Value {
        json!({
            "electronicVersions": [
                {"accessType": {"uri": "/open"}, "versionType": {"uri": "/published"}}
            ]
        })
    }

    #[tokio::test]
    async fn test_wrong_subject_type_makes_no_external_call() {
        let api = Arc::new(RecordingResearchApi::serving(linkable_record()));
        let consumer =
            ElectronicVersionLinkConsumer::new(config_with_api(), api.clone(), None);

        let event = SyncEvent::new(SubjectType::Bundle, EventKind::ModifyMetadata, "bundle-1");
        let outcome = consumer.consume(&event).await;

        assert_eq!(
            outcome,
            ConsumeOutcome::Skipped(SkipReason::SubjectTypeMismatch)
        );
        assert_eq!(api.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_wrong_event_kind_makes_no_external_call() {
        let api = Arc::new(RecordingResearchApi::serving(linkable_record()));
        let consumer =
            ElectronicVersionLinkConsumer::new(config_with_api(), api.clone(), None);

        let event = SyncEvent::new(SubjectType::Item, EventKind::Create, "item-9");
        let outcome = consumer.consume(&event).await;

        assert_eq!(outcome, ConsumeOutcome::Skipped(SkipReason::EventKindMismatch));
        assert_eq!(api.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_api_url_short_circuits_before_any_call() {
        let api = Arc::new(RecordingResearchApi::serving(linkable_record()));
        let config = SyncConfig {
            api_key: Some("secret".to_string()),
            ..SyncConfig::default()
        };
        let consumer = ElectronicVersionLinkConsumer::new(config, api.clone(), None);

        let outcome = consumer.consume(&tracked_item_event()).await;

        assert_eq!(
            outcome,
            ConsumeOutcome::Skipped(SkipReason::MissingConfiguration("api_base_url"))
        );
        assert_eq!(api.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_untracked_item_skips_without_error() {
        let api = Arc::new(RecordingResearchApi::serving(linkable_record()));
        let consumer =
            ElectronicVersionLinkConsumer::new(config_with_api(), api.clone(), None);

        let event = SyncEvent::new(SubjectType::Item, EventKind::ModifyMetadata, "item-9")
            .with_snapshot(
                SubjectSnapshot::new()
                    .with_field("dc.identifier.uri", vec!["http://hdl/123".to_string()]),
            );
        let outcome = consumer.consume(&event).await;

        assert_eq!(outcome, ConsumeOutcome::Skipped(SkipReason::NotTracked));
        assert_eq!(api.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_happy_path_appends_link_and_posts_back() {
        let api = Arc::new(RecordingResearchApi::serving(linkable_record()));
        let consumer =
            ElectronicVersionLinkConsumer::new(config_with_api(), api.clone(), None);

        let outcome = consumer.consume(&tracked_item_event()).await;

        assert_eq!(
            outcome,
            ConsumeOutcome::Synced {
                external_id: "out-42".to_string(),
                notified: false
            }
        );

        let (posted_id, posted) = api.last_update.lock().unwrap().clone().unwrap();
        assert_eq!(posted_id, "out-42");

        let versions = posted["electronicVersions"].as_array().unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(
            versions[1],
            json!({
                "typeDiscriminator": "LinkElectronicVersion",
                "accessType": {"uri": "/open"},
                "link": "http://hdl/123",
                "versionType": {"uri": "/published"}
            })
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_is_nonfatal_and_skips_update() {
        let api = Arc::new(RecordingResearchApi::failing_fetch(503));
        let consumer =
            ElectronicVersionLinkConsumer::new(config_with_api(), api.clone(), None);

        let outcome = consumer.consume(&tracked_item_event()).await;

        assert_eq!(
            outcome,
            ConsumeOutcome::Failed {
                stage: FailureStage::Fetch,
                external_id: "out-42".to_string()
            }
        );
        assert_eq!(api.update_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_update_failure_is_nonfatal() {
        let api = Arc::new(RecordingResearchApi::failing_update(linkable_record()));
        let consumer =
            ElectronicVersionLinkConsumer::new(config_with_api(), api.clone(), None);

        let outcome = consumer.consume(&tracked_item_event()).await;
        assert_eq!(
            outcome,
            ConsumeOutcome::Failed {
                stage: FailureStage::Update,
                external_id: "out-42".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_unlinkable_record_fails_at_record_shape() {
        let api = Arc::new(RecordingResearchApi::serving(json!({
            "electronicVersions": []
        })));
        let consumer =
            ElectronicVersionLinkConsumer::new(config_with_api(), api.clone(), None);

        let outcome = consumer.consume(&tracked_item_event()).await;
        assert_eq!(
            outcome,
            ConsumeOutcome::Failed {
                stage: FailureStage::RecordShape,
                external_id: "out-42".to_string()
            }
        );
        assert_eq!(api.update_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatcher_pinged_after_successful_sync() {
        let api = Arc::new(RecordingResearchApi::serving(linkable_record()));
        let sink = Arc::new(CountingDispatchSink::succeeding());
        let config = SyncConfig {
            dispatcher_url: Some("https://dispatch.example.org".to_string()),
            dispatcher_key: Some("token".to_string()),
            ..config_with_api()
        };
        let consumer =
            ElectronicVersionLinkConsumer::new(config, api, Some(sink.clone()));

        let outcome = consumer.consume(&tracked_item_event()).await;

        assert_eq!(
            outcome,
            ConsumeOutcome::Synced {
                external_id: "out-42".to_string(),
                notified: true
            }
        );
        assert_eq!(sink.call_count(), 1);
        assert_eq!(
            sink.last_subject.lock().unwrap().as_deref(),
            Some("item-9")
        );
    }

    #[tokio::test]
    async fn test_dispatcher_failure_rides_along_in_outcome() {
        let api = Arc::new(RecordingResearchApi::serving(linkable_record()));
        let sink = Arc::new(CountingDispatchSink::failing());
        let config = SyncConfig {
            dispatcher_url: Some("https://dispatch.example.org".to_string()),
            dispatcher_key: Some("token".to_string()),
            ..config_with_api()
        };
        let consumer =
            ElectronicVersionLinkConsumer::new(config, api, Some(sink.clone()));

        let outcome = consumer.consume(&tracked_item_event()).await;
        assert_eq!(
            outcome,
            ConsumeOutcome::Synced {
                external_id: "out-42".to_string(),
                notified: false
            }
        );
    }

    #[tokio::test]
    async fn test_replayed_event_appends_again() {
        // No idempotency by design: the same event twice appends twice
        let api = Arc::new(RecordingResearchApi::serving(linkable_record()));
        let consumer =
            ElectronicVersionLinkConsumer::new(config_with_api(), api.clone(), None);

        consumer.consume(&tracked_item_event()).await;
        consumer.consume(&tracked_item_event()).await;

        assert_eq!(api.update_calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
