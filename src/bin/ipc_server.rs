#![allow(missing_docs)]
//! IPC Server for the AtaBot Plugin
//!
//! This binary runs as a subprocess and handles JSON-RPC requests over
//! stdin/stdout, so any runtime (TypeScript, Python, Go, etc.) can drive an
//! AtaBot conversation.
//!
//! ## Usage
//!
//! ```bash
//! cargo build --features ipc --bin atabot-ipc
//! ATABOT_HISTORY_DIR=/tmp/atabot ./atabot-ipc
//! ```
//!
//! ## Protocol
//!
//! One JSON request per line on stdin, one JSON response per line on stdout.
//! Logs go to stderr.
//!
//! ### Example Request
//! ```json
//! {"id": 1, "method": "generateResponse", "params": {"input": "Tell me a joke"}}
//! ```
//!
//! ### Example Response
//! ```json
//! {"id": 1, "result": {"response": "Why do programmers prefer dark mode? ...", "category": "jokes", "trigger": null, "typingDelayMs": 1240}}
//! ```

use elizaos_plugin_atabot::interop::{handle_ipc_request, IpcRequest, IpcResponse};
use elizaos_plugin_atabot::{AtaBotConfig, AtaBotPlugin};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut plugin = AtaBotPlugin::with_config(AtaBotConfig::from_env())?;
    info!("[atabot-ipc] Server started, waiting for requests...");

    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("[atabot-ipc] Error reading input: {}", e);
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<IpcRequest>(&line) {
            Ok(request) => handle_ipc_request(&mut plugin, &request),
            Err(e) => IpcResponse::error(0, &format!("Invalid JSON: {}", e)),
        };

        match serde_json::to_string(&response) {
            Ok(output) => {
                stdout.write_all(output.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
            Err(e) => error!("[atabot-ipc] Error serializing response: {}", e),
        }
    }

    info!("[atabot-ipc] Server shutting down");
    Ok(())
}
