// Sync Configuration

/// Metadata field holding the external-system identifier, unless
/// configured otherwise
pub const DEFAULT_METADATA_FIELD: &str = "dc.identifier.gerioid";

/// Explicit configuration for the sync pipeline, injected at construction.
///
/// A missing API URL or credential is a skip condition for the pipeline,
/// never a startup failure: the daemon runs fine with synchronization
/// unconfigured.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// External API host, e.g. "pure.example.org"
    pub api_base_url: Option<String>,
    pub api_key: Option<String>,

    /// Metadata field carrying the external identifier
    pub metadata_field: String,

    /// Downstream dispatcher base URL, e.g. "https://dispatch.example.org"
    pub dispatcher_url: Option<String>,
    pub dispatcher_key: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            api_key: None,
            metadata_field: DEFAULT_METADATA_FIELD.to_string(),
            dispatcher_url: None,
            dispatcher_key: None,
        }
    }
}

impl SyncConfig {
    /// Load from environment variables (unset values stay None/default)
    pub fn from_env() -> Self {
        Self {
            api_base_url: std::env::var("CURATOR_SYNC_API_URL").ok(),
            api_key: std::env::var("CURATOR_SYNC_API_KEY").ok(),
            metadata_field: std::env::var("CURATOR_SYNC_METADATA_FIELD")
                .unwrap_or_else(|_| DEFAULT_METADATA_FIELD.to_string()),
            dispatcher_url: std::env::var("CURATOR_DISPATCHER_URL").ok(),
            dispatcher_key: std::env::var("CURATOR_DISPATCHER_KEY").ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_metadata_field() {
        let config = SyncConfig::default();
        assert_eq!(config.metadata_field, "dc.identifier.gerioid");
        assert!(config.api_base_url.is_none());
        assert!(config.api_key.is_none());
    }
}
