// Consume Outcome Model
//
// Every consume returns an explicit outcome so callers and tests can tell
// "skipped due to X" apart from "succeeded" without reading logs.

/// Why a consumer declined an event without side effects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Event subject is not the consumer's declared subject type
    SubjectTypeMismatch,
    /// Event kind is not the consumer's declared event kind
    EventKindMismatch,
    /// A required configuration value is absent (names which one)
    MissingConfiguration(&'static str),
    /// Subject carries no external identifier - not tracked externally
    NotTracked,
    /// Subject carries no handle/URI to link back to
    MissingHandle,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::SubjectTypeMismatch => write!(f, "subject type mismatch"),
            SkipReason::EventKindMismatch => write!(f, "event kind mismatch"),
            SkipReason::MissingConfiguration(what) => {
                write!(f, "missing configuration: {}", what)
            }
            SkipReason::NotTracked => write!(f, "subject not tracked externally"),
            SkipReason::MissingHandle => write!(f, "subject has no handle/URI"),
        }
    }
}

/// Which leg of the external round trip failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// GET of the external record
    Fetch,
    /// External record lacked a usable electronicVersions entry
    RecordShape,
    /// POST of the transformed record
    Update,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureStage::Fetch => write!(f, "fetch"),
            FailureStage::RecordShape => write!(f, "record shape"),
            FailureStage::Update => write!(f, "update"),
        }
    }
}

/// Result of delivering one event to one consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// Early exit, zero side effects
    Skipped(SkipReason),
    /// External record updated; `notified` reports the best-effort
    /// dispatcher ping
    Synced { external_id: String, notified: bool },
    /// A stage failed; the event's synchronization was abandoned without
    /// retry
    Failed {
        stage: FailureStage,
        external_id: String,
    },
}

impl std::fmt::Display for ConsumeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsumeOutcome::Skipped(reason) => write!(f, "skipped ({})", reason),
            ConsumeOutcome::Synced {
                external_id,
                notified,
            } => write!(f, "synced {} (notified: {})", external_id, notified),
            ConsumeOutcome::Failed { stage, external_id } => {
                write!(f, "failed at {} for {}", stage, external_id)
            }
        }
    }
}
