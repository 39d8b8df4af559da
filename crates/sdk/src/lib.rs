//! Curator SDK - Rust Client Library
//!
//! Provides a convenient client for interacting with the Curator daemon.
//!
//! # Example
//!
//! ```no_run
//! use curator_sdk::{CuratorClient, LaunchRequest, Principal};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect to daemon
//!     let client = CuratorClient::connect("http://127.0.0.1:9533").await?;
//!
//!     // Launch a script
//!     let process = client.launch(LaunchRequest {
//!         script: "metadata-export".to_string(),
//!         properties: Some(r#"[{"name":"-i","value":"col-1"}]"#.to_string()),
//!         files: vec![],
//!         principal: Principal::admin("ops"),
//!     }).await?;
//!
//!     println!("Process launched: {}", process.process_id);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::CuratorClient;
pub use error::{Result, SdkError};
pub use types::{
    ConsumerOutcome, FilePart, LaunchRequest, Principal, ProcessResponse, ScriptInfo,
    TailLogsRequest, TailLogsResponse,
};
