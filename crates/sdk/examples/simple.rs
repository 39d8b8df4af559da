//! Simple SDK Example
//!
//! Demonstrates basic usage of the Curator SDK.
//!
//! # Usage
//!
//! 1. Start the daemon:
//!    ```bash
//!    cargo run --package curator-daemon
//!    ```
//!
//! 2. Run this example:
//!    ```bash
//!    cargo run --example simple
//!    ```

use curator_sdk::{CuratorClient, FilePart, LaunchRequest, Principal};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Curator SDK - Simple Example");
    println!("============================\n");

    // 1. Connect to daemon
    println!("1. Connecting to daemon...");
    let client = CuratorClient::connect("http://127.0.0.1:9533").await?;
    println!("   ✓ Connected\n");

    // 2. List available scripts
    println!("2. Listing scripts...");
    let principal = Principal::admin("example");
    let scripts = client.list_scripts(&principal).await?;
    for script in &scripts {
        println!("   - {}: {}", script.name, script.description);
    }
    println!();

    // 3. Launch a script with one uploaded file
    println!("3. Launching a script...");
    let process = client
        .launch(LaunchRequest {
            script: "metadata-import".to_string(),
            properties: Some(r#"[{"name":"-f","value":"records.csv"}]"#.to_string()),
            files: vec![FilePart::from_bytes("records.csv", b"id,title\n1,Example\n")],
            principal,
        })
        .await?;

    println!("   ✓ Process launched:");
    println!("     - ID: {}", process.process_id);
    println!("     - Status: {}\n", process.status);

    // 4. Wait a bit for processing
    println!("4. Waiting 2 seconds...");
    tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;
    println!("   ✓ Done\n");

    // 5. Poll status and tail logs
    println!("5. Polling process...");
    let status = client.process_status(&process.process_id).await?;
    println!("   ✓ Status: {}", status.status);

    let logs = client.tail_logs(&process.process_id, Some(10)).await?;
    if !logs.lines.is_empty() {
        println!("\n   Last {} lines:", logs.lines.len());
        for line in &logs.lines {
            println!("     | {}", line);
        }
    }

    println!("\n✓ Example completed successfully!");

    Ok(())
}
