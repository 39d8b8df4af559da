// Dispatch Notifier
//
// Single best-effort call to a downstream dispatcher after a subject
// changes. Never propagates: non-2xx and transport errors are logged and
// reported as `false`.

use async_trait::async_trait;
use tracing::{debug, warn};

/// Seam for the downstream dispatcher, mockable in tests
#[async_trait]
pub trait DispatchSink: Send + Sync {
    /// Ping the dispatcher for a subject. Returns whether the call
    /// succeeded; failure carries no further detail by design.
    async fn notify(&self, subject_id: &str) -> bool;
}

/// Production notifier: GET {base}/dispatch/{subject_id} with an
/// Authorization header
pub struct HttpDispatchNotifier {
    http: reqwest::Client,
    base: String,
    key: String,
}

impl HttpDispatchNotifier {
    pub fn new(base: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.into(),
            key: key.into(),
        }
    }

    fn dispatch_url(&self, subject_id: &str) -> String {
        format!("{}/dispatch/{}", self.base.trim_end_matches('/'), subject_id)
    }
}

#[async_trait]
impl DispatchSink for HttpDispatchNotifier {
    async fn notify(&self, subject_id: &str) -> bool {
        let url = self.dispatch_url(subject_id);

        let response = match self
            .http
            .get(&url)
            .header("Authorization", &self.key)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(url = %url, error = %e, "Dispatcher call failed");
                return false;
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!(url = %url, status = %status, body = %body, "Dispatcher response");

        if !status.is_success() {
            warn!(url = %url, status = %status, "Dispatcher returned non-success status");
            return false;
        }
        true
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Counting DispatchSink for call-count assertions
    pub struct CountingDispatchSink {
        succeed: bool,
        pub calls: AtomicUsize,
        pub last_subject: Mutex<Option<String>>,
    }

    impl CountingDispatchSink {
        pub fn succeeding() -> Self {
            Self {
                succeed: true,
                calls: AtomicUsize::new(0),
                last_subject: Mutex::new(None),
            }
        }

        pub fn failing() -> Self {
            Self {
                succeed: false,
                calls: AtomicUsize::new(0),
                last_subject: Mutex::new(None),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DispatchSink for CountingDispatchSink {
        async fn notify(&self, subject_id: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_subject.lock().unwrap() = Some(subject_id.to_string());
            self.succeed
        }
    }
}
