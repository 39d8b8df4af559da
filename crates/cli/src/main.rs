//! Curator CLI - Command-line interface for the Curator daemon

use anyhow::{Context, Result};
use base64::Engine;
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9533";

#[derive(Parser)]
#[command(name = "curator")]
#[command(about = "Curator script engine CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "CURATOR_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,

    /// Principal name sent with authenticated requests
    #[arg(long, env = "CURATOR_USER", default_value = "cli")]
    user: String,

    /// Group membership (repeatable)
    #[arg(long = "group")]
    groups: Vec<String>,

    /// Act as administrator
    #[arg(long)]
    admin: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List scripts the caller may execute
    Scripts,

    /// Launch a script as a background process
    Launch {
        /// Script name
        script: String,

        /// Parameters as a JSON array: [{"name":"-i","value":"x"},...]
        #[arg(long)]
        properties: Option<String>,

        /// File to upload (repeatable); sent under its file name
        #[arg(long = "file")]
        files: Vec<String>,
    },

    /// Poll a process
    Status {
        /// Process ID
        process_id: String,
    },

    /// Tail a process log
    Logs {
        /// Process ID
        process_id: String,

        /// Number of lines to tail
        #[arg(short = 'n', long, default_value = "100")]
        lines: usize,
    },

    /// Deliver a content event to the sync pipeline
    Deliver {
        /// Subject type (ITEM, BUNDLE, ...)
        #[arg(long, default_value = "ITEM")]
        subject_type: String,

        /// Event kind (MODIFY_METADATA, CREATE, ...)
        #[arg(long, default_value = "MODIFY_METADATA")]
        kind: String,

        /// Subject identifier
        subject_id: String,

        /// Subject metadata as field=value (repeatable)
        #[arg(long = "meta")]
        metadata: Vec<String>,
    },

    /// Show system status
    Stats,

    /// Run maintenance operations
    Maintenance {
        /// Force VACUUM even if not needed
        #[arg(long)]
        force_vacuum: bool,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize, Tabled)]
struct ScriptRow {
    name: String,
    description: String,
}

#[derive(Deserialize, Tabled)]
struct ProcessRow {
    process_id: String,
    script: String,
    status: String,
    owner: String,
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

fn principal_json(cli: &Cli) -> serde_json::Value {
    json!({
        "name": cli.user,
        "groups": cli.groups,
        "admin": cli.admin,
    })
}

/// Parse repeated field=value pairs into the snapshot metadata map
fn metadata_json(pairs: &[String]) -> Result<serde_json::Value> {
    let mut metadata = serde_json::Map::new();
    for pair in pairs {
        let (field, value) = pair
            .split_once('=')
            .with_context(|| format!("Expected field=value, got: {}", pair))?;
        metadata
            .entry(field.to_string())
            .or_insert_with(|| json!([]))
            .as_array_mut()
            .unwrap()
            .push(json!(value));
    }
    Ok(serde_json::Value::Object(metadata))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Scripts => {
            let params = json!({ "principal": principal_json(&cli) });
            let result = call_rpc(&cli.rpc_url, "script.list.v1", params).await?;

            let scripts: Vec<ScriptRow> =
                serde_json::from_value(result["scripts"].clone())?;

            if scripts.is_empty() {
                println!("{}", "No scripts available".yellow());
            } else {
                println!("{}", Table::new(scripts));
            }
        }

        Commands::Launch {
            script,
            properties,
            files,
        } => {
            let mut file_parts = Vec::new();
            for path in files {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("Cannot read file {}", path))?;
                let name = std::path::Path::new(path)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .with_context(|| format!("Cannot derive file name from {}", path))?;
                file_parts.push(json!({
                    "name": name,
                    "content_base64": base64::engine::general_purpose::STANDARD.encode(bytes),
                }));
            }

            let params = json!({
                "script": script,
                "properties": properties,
                "files": file_parts,
                "principal": principal_json(&cli),
            });

            let result = call_rpc(&cli.rpc_url, "process.launch.v1", params).await?;
            let row: ProcessRow = serde_json::from_value(result)?;

            println!("{}", "✓ Process launched".green().bold());
            println!();
            println!("{}", Table::new(vec![row]));
        }

        Commands::Status { process_id } => {
            let params = json!({ "process_id": process_id });
            let result = call_rpc(&cli.rpc_url, "process.status.v1", params).await?;

            println!(
                "{}",
                format!("Process {}", result["process_id"]).cyan().bold()
            );
            println!("  {} {}", "Script:".bold(), result["script"]);
            println!("  {} {}", "Status:".bold(), result["status"]);
            println!("  {} {}", "Owner:".bold(), result["owner"]);
            if let Some(code) = result["exit_code"].as_i64() {
                println!("  {} {}", "Exit code:".bold(), code);
            }
            if let Some(message) = result["failure_message"].as_str() {
                println!("  {} {}", "Failure:".bold(), message.red());
            }
        }

        Commands::Logs { process_id, lines } => {
            let params = json!({
                "process_id": process_id,
                "lines": lines,
            });

            let result = call_rpc(&cli.rpc_url, "logs.tail.v1", params).await?;

            let log_lines = result["lines"].as_array().cloned().unwrap_or_default();
            if log_lines.is_empty() {
                println!("{}", "No logs available".yellow());
            } else {
                println!(
                    "{}",
                    format!("Logs for process {}:", process_id).cyan().bold()
                );
                for line in log_lines {
                    println!("{}", line.as_str().unwrap_or_default());
                }
            }
        }

        Commands::Deliver {
            subject_type,
            kind,
            subject_id,
            metadata,
        } => {
            let params = json!({
                "event": {
                    "subject_type": subject_type,
                    "kind": kind,
                    "subject_id": subject_id,
                    "snapshot": { "metadata": metadata_json(metadata)? },
                }
            });

            let result = call_rpc(&cli.rpc_url, "sync.deliver.v1", params).await?;

            println!("{}", "Event delivered".cyan().bold());
            for outcome in result["outcomes"].as_array().cloned().unwrap_or_default() {
                println!(
                    "  {} {}: {}",
                    "•".bold(),
                    outcome["consumer"].as_str().unwrap_or("?"),
                    outcome["outcome"].as_str().unwrap_or("?")
                );
            }
        }

        Commands::Stats => {
            println!("{}", "System Status".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "admin.stats.v1", json!({})).await {
                Ok(stats) => {
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!();
                    println!("  {} {}", "Scheduled:".bold(), stats["scheduled_processes"]);
                    println!("  {} {}", "Running:".bold(), stats["running_processes"]);
                    println!("  {} {}", "Completed:".bold(), stats["completed_processes"]);
                    println!("  {} {}", "Failed:".bold(), stats["failed_processes"]);
                    println!();
                    let db_mb =
                        stats["db_size_bytes"].as_i64().unwrap_or(0) as f64 / (1024.0 * 1024.0);
                    println!("  {} {:.2} MB", "DB Size:".bold(), db_mb);
                    println!("  {} {} seconds", "Uptime:".bold(), stats["uptime_seconds"]);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }

        Commands::Maintenance { force_vacuum } => {
            println!("{}", "Running maintenance...".cyan().bold());
            println!();

            let params = json!({ "force_vacuum": force_vacuum });

            match call_rpc(&cli.rpc_url, "admin.maintenance.v1", params).await {
                Ok(result) => {
                    println!("  ✓ Maintenance completed");
                    println!();
                    if result["vacuum_run"].as_bool().unwrap_or(false) {
                        println!("  {} VACUUM executed", "✓".green());
                    } else {
                        println!("  ○ VACUUM skipped (not needed)");
                    }
                    println!(
                        "  {} {} processes deleted",
                        "✓".green(),
                        result["processes_deleted"]
                    );
                    println!(
                        "  {} {} workspaces deleted",
                        "✓".green(),
                        result["workspaces_deleted"]
                    );
                    println!();
                    let size_before_mb =
                        result["db_size_before"].as_i64().unwrap_or(0) as f64 / (1024.0 * 1024.0);
                    let size_after_mb =
                        result["db_size_after"].as_i64().unwrap_or(0) as f64 / (1024.0 * 1024.0);
                    println!(
                        "  {} {:.2} MB -> {:.2} MB",
                        "DB Size:".bold(),
                        size_before_mb,
                        size_after_mb
                    );
                }
                Err(e) => {
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}
