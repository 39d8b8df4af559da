// External Research-Information System Client
//
// Read-modify-write against records keyed by an external identifier.
// Both legs are independent: the caller decides what a failed GET or POST
// means for its pipeline.

use crate::error::{Result, SyncError};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

/// Seam for the external system, mockable in tests
#[async_trait]
pub trait ResearchApi: Send + Sync {
    /// GET the current record for an external identifier
    async fn fetch_record(&self, external_id: &str) -> Result<Value>;

    /// POST a transformed record back under the same identifier
    async fn update_record(&self, external_id: &str, record: &Value) -> Result<()>;
}

/// Production client speaking the external system's research-outputs API
pub struct ResearchApiClient {
    http: reqwest::Client,
    base: String,
    api_key: String,
}

impl ResearchApiClient {
    /// # Arguments
    /// * `base` - API host, e.g. "pure.example.org"
    /// * `api_key` - credential sent as the `api-key` header
    pub fn new(base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.into(),
            api_key: api_key.into(),
        }
    }

    fn record_url(&self, external_id: &str) -> String {
        format!(
            "https://{}/ws/api/research-outputs/{}",
            self.base, external_id
        )
    }
}

#[async_trait]
impl ResearchApi for ResearchApiClient {
    async fn fetch_record(&self, external_id: &str) -> Result<Value> {
        let url = self.record_url(external_id);
        debug!(url = %url, "Fetching external record");

        let response = self
            .http
            .get(&url)
            .header("api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status {
                status: status.as_u16(),
                url,
            });
        }

        Ok(response.json().await?)
    }

    async fn update_record(&self, external_id: &str, record: &Value) -> Result<()> {
        let url = self.record_url(external_id);
        debug!(url = %url, "Updating external record");

        let response = self
            .http
            .post(&url)
            .header("api-key", &self.api_key)
            .json(record)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status {
                status: status.as_u16(),
                url,
            });
        }
        Ok(())
    }
}

/// Append an electronic-version link entry to an external record.
///
/// Takes `accessType` and `versionType` from the record's first
/// `electronicVersions` entry and appends
/// `{typeDiscriminator, accessType, link, versionType}` to the same array.
/// The record must already carry a usable entry; there is nothing sensible
/// to synthesize from an empty one.
pub fn append_version_link(record: &mut Value, link: &str) -> Result<()> {
    let first = record
        .get("electronicVersions")
        .and_then(Value::as_array)
        .and_then(|versions| versions.first())
        .ok_or_else(|| {
            SyncError::MalformedRecord("no electronicVersions entry".to_string())
        })?;

    let access_type = first
        .get("accessType")
        .cloned()
        .ok_or_else(|| SyncError::MalformedRecord("missing accessType".to_string()))?;
    let version_type = first
        .get("versionType")
        .cloned()
        .ok_or_else(|| SyncError::MalformedRecord("missing versionType".to_string()))?;

    let entry = json!({
        "typeDiscriminator": "LinkElectronicVersion",
        "accessType": access_type,
        "link": link,
        "versionType": version_type,
    });

    // Checked non-empty above
    record["electronicVersions"]
        .as_array_mut()
        .expect("electronicVersions is an array")
        .push(entry);
    Ok(())
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Recording ResearchApi: counts calls, serves a canned record, and
    /// keeps the last update body for assertions
    pub struct RecordingResearchApi {
        record: Mutex<Result<Value>>,
        fail_update: bool,
        pub fetch_calls: AtomicUsize,
        pub update_calls: AtomicUsize,
        pub last_update: Mutex<Option<(String, Value)>>,
    }

    impl RecordingResearchApi {
        pub fn serving(record: Value) -> Self {
            Self {
                record: Mutex::new(Ok(record)),
                fail_update: false,
                fetch_calls: AtomicUsize::new(0),
                update_calls: AtomicUsize::new(0),
                last_update: Mutex::new(None),
            }
        }

        pub fn failing_fetch(status: u16) -> Self {
            Self {
                record: Mutex::new(Err(SyncError::Status {
                    status,
                    url: "mock://record".to_string(),
                })),
                fail_update: false,
                fetch_calls: AtomicUsize::new(0),
                update_calls: AtomicUsize::new(0),
                last_update: Mutex::new(None),
            }
        }

        pub fn failing_update(record: Value) -> Self {
            let mut api = Self::serving(record);
            api.fail_update = true;
            api
        }

        pub fn total_calls(&self) -> usize {
            self.fetch_calls.load(Ordering::SeqCst) + self.update_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ResearchApi for RecordingResearchApi {
        async fn fetch_record(&self, _external_id: &str) -> Result<Value> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            match &*self.record.lock().unwrap() {
                Ok(record) => Ok(record.clone()),
                Err(SyncError::Status { status, url }) => Err(SyncError::Status {
                    status: *status,
                    url: url.clone(),
                }),
                Err(e) => Err(SyncError::MalformedRecord(e.to_string())),
            }
        }

        async fn update_record(&self, external_id: &str, record: &Value) -> Result<()> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_update {
                return Err(SyncError::Status {
                    status: 500,
                    url: "mock://record".to_string(),
                });
            }
            *self.last_update.lock().unwrap() =
                Some((external_id.to_string(), record.clone()));
            Ok(())
        }
    }
}
