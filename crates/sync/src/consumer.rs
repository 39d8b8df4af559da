// Consumer Trait & Event Dispatcher

use crate::event::SyncEvent;
use crate::outcome::ConsumeOutcome;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// A handler invoked synchronously on every content-lifecycle event.
///
/// A consumer must never abort the delivering caller: whatever happens is
/// expressed in the returned outcome.
#[async_trait]
pub trait Consumer: Send + Sync {
    fn name(&self) -> &str;

    async fn consume(&self, event: &SyncEvent) -> ConsumeOutcome;
}

/// Fans each event out to every registered consumer, in registration
/// order, synchronously within the delivering call.
#[derive(Default)]
pub struct EventDispatcher {
    consumers: Vec<Arc<dyn Consumer>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, consumer: Arc<dyn Consumer>) {
        self.consumers.push(consumer);
    }

    /// Deliver one event to all consumers.
    ///
    /// Outcomes are logged here; failures stay inside their consumer and
    /// the remaining consumers still run.
    pub async fn deliver(&self, event: &SyncEvent) -> Vec<(String, ConsumeOutcome)> {
        let mut outcomes = Vec::with_capacity(self.consumers.len());

        for consumer in &self.consumers {
            let outcome = consumer.consume(event).await;
            match &outcome {
                ConsumeOutcome::Failed { .. } => {
                    warn!(consumer = %consumer.name(), event = %event, outcome = %outcome, "Consumer failed");
                }
                _ => {
                    info!(consumer = %consumer.name(), event = %event, outcome = %outcome, "Consumer finished");
                }
            }
            outcomes.push((consumer.name().to_string(), outcome));
        }

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventKind, SubjectType};
    use crate::outcome::SkipReason;

    struct StaticConsumer {
        name: &'static str,
        outcome: ConsumeOutcome,
    }

    #[async_trait]
    impl Consumer for StaticConsumer {
        fn name(&self) -> &str {
            self.name
        }

        async fn consume(&self, _event: &SyncEvent) -> ConsumeOutcome {
            self.outcome.clone()
        }
    }

    #[tokio::test]
    async fn test_deliver_runs_all_consumers_in_order() {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(Arc::new(StaticConsumer {
            name: "first",
            outcome: ConsumeOutcome::Skipped(SkipReason::NotTracked),
        }));
        dispatcher.register(Arc::new(StaticConsumer {
            name: "second",
            outcome: ConsumeOutcome::Synced {
                external_id: "out-1".to_string(),
                notified: false,
            },
        }));

        let event = SyncEvent::new(SubjectType::Item, EventKind::ModifyMetadata, "item-1");
        let outcomes = dispatcher.deliver(&event).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].0, "first");
        assert_eq!(outcomes[1].0, "second");
        assert!(matches!(
            outcomes[1].1,
            ConsumeOutcome::Synced { .. }
        ));
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_consumers() {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(Arc::new(StaticConsumer {
            name: "failing",
            outcome: ConsumeOutcome::Failed {
                stage: crate::outcome::FailureStage::Fetch,
                external_id: "out-1".to_string(),
            },
        }));
        dispatcher.register(Arc::new(StaticConsumer {
            name: "after",
            outcome: ConsumeOutcome::Skipped(SkipReason::NotTracked),
        }));

        let event = SyncEvent::new(SubjectType::Item, EventKind::ModifyMetadata, "item-1");
        let outcomes = dispatcher.deliver(&event).await;
        assert_eq!(outcomes.len(), 2);
    }
}
