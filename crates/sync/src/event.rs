// Sync Event Model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Content object kinds an event may concern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubjectType {
    Item,
    Bundle,
    Collection,
    Community,
    Other,
}

impl std::fmt::Display for SubjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubjectType::Item => write!(f, "ITEM"),
            SubjectType::Bundle => write!(f, "BUNDLE"),
            SubjectType::Collection => write!(f, "COLLECTION"),
            SubjectType::Community => write!(f, "COMMUNITY"),
            SubjectType::Other => write!(f, "OTHER"),
        }
    }
}

/// Content-lifecycle event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Create,
    Modify,
    ModifyMetadata,
    Add,
    Remove,
    Delete,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Create => write!(f, "CREATE"),
            EventKind::Modify => write!(f, "MODIFY"),
            EventKind::ModifyMetadata => write!(f, "MODIFY_METADATA"),
            EventKind::Add => write!(f, "ADD"),
            EventKind::Remove => write!(f, "REMOVE"),
            EventKind::Delete => write!(f, "DELETE"),
        }
    }
}

/// Metadata snapshot of the event's subject at delivery time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSnapshot {
    /// field name -> values, e.g. "dc.identifier.uri" -> ["http://hdl/123"]
    pub metadata: BTreeMap<String, Vec<String>>,
}

impl SubjectSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(
        mut self,
        field: impl Into<String>,
        values: Vec<String>,
    ) -> Self {
        self.metadata.insert(field.into(), values);
        self
    }

    /// First value of a metadata field, if any
    pub fn first_value(&self, field: &str) -> Option<&str> {
        self.metadata
            .get(field)
            .and_then(|values| values.first())
            .map(|s| s.as_str())
    }
}

/// One content-modification event.
///
/// Transient: constructed per delivery, never persisted by this subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEvent {
    pub subject_type: SubjectType,
    pub kind: EventKind,
    pub subject_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SubjectSnapshot>,
}

impl SyncEvent {
    pub fn new(
        subject_type: SubjectType,
        kind: EventKind,
        subject_id: impl Into<String>,
    ) -> Self {
        Self {
            subject_type,
            kind,
            subject_id: subject_id.into(),
            snapshot: None,
        }
    }

    pub fn with_snapshot(mut self, snapshot: SubjectSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }
}

impl std::fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}({}) on {}",
            self.kind, self.subject_type, self.subject_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_first_value() {
        let snapshot = SubjectSnapshot::new()
            .with_field("dc.identifier.uri", vec!["http://hdl/123".to_string()])
            .with_field("dc.title", vec![]);

        assert_eq!(
            snapshot.first_value("dc.identifier.uri"),
            Some("http://hdl/123")
        );
        assert_eq!(snapshot.first_value("dc.title"), None);
        assert_eq!(snapshot.first_value("dc.missing"), None);
    }

    #[test]
    fn test_event_display_names_kind_subject_and_id() {
        let event = SyncEvent::new(SubjectType::Item, EventKind::ModifyMetadata, "item-9");
        assert_eq!(event.to_string(), "MODIFY_METADATA(ITEM) on item-9");
    }
}
