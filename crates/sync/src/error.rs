// Sync Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Malformed external record: {0}")]
    MalformedRecord(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
