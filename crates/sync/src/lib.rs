// Curator Sync - Content-event synchronization pipeline
//
// One configurable pipeline (filter -> extract -> sync -> notify) with each
// stage behind a trait. Consumers are invoked synchronously by the caller
// delivering the event and must never abort it: every outcome is explicit
// and every external failure is logged and swallowed.

pub mod client;
pub mod config;
pub mod consumer;
pub mod error;
pub mod event;
pub mod notifier;
pub mod outcome;
pub mod pipeline;

pub use client::{append_version_link, ResearchApi, ResearchApiClient};
pub use config::SyncConfig;
pub use consumer::{Consumer, EventDispatcher};
pub use error::SyncError;
pub use event::{EventKind, SubjectSnapshot, SubjectType, SyncEvent};
pub use notifier::{DispatchSink, HttpDispatchNotifier};
pub use outcome::{ConsumeOutcome, FailureStage, SkipReason};
pub use pipeline::ElectronicVersionLinkConsumer;
