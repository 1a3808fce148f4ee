//! Tab sidebar RPC server — JSON-RPC over stdin/stdout for the view layer.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"tab.drop", "params":{"tab_id":3,"target_index":0}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Push:     {"event":"snapshot", "snapshot":{...}} after every applied refresh.

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use tabsidebar::app::App;
use tabsidebar::rpc_handler::handle_method;
use tabsidebar::settings::SettingsEngine;

/// Environment variable pointing at an alternative settings file.
const CONFIG_ENV: &str = "TABSIDEBAR_CONFIG";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let settings = SettingsEngine::new(std::env::var(CONFIG_ENV).ok());
    let app = App::new(settings).await;

    // stdout is shared by responses and pushed snapshots; one writer task owns it.
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Value>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(message) = out_rx.recv().await {
            let line = format!("{}\n", message);
            if stdout.write_all(line.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
                break;
            }
        }
    });

    let mut snapshots = app.engine.watch();
    let push_tx = out_tx.clone();
    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            match serde_json::to_value(&*snapshot) {
                Ok(value) => {
                    if push_tx.send(json!({"event": "snapshot", "snapshot": value})).is_err() {
                        break;
                    }
                }
                Err(e) => log::error!("failed to encode snapshot: {}", e),
            }
        }
    });

    app.startup().await;
    let _ = out_tx.send(json!({
        "event": "ready",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": app.engine.backend().kind(),
    }));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                let _ = out_tx.send(json!({"id": null, "error": format!("parse error: {}", e)}));
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);
        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let response = match handle_method(&app, method, &params).await {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        let _ = out_tx.send(response);
    }

    app.shutdown();
    drop(out_tx);
    let _ = writer.await;
    Ok(())
}
