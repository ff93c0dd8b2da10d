//! splitscroll relay host: newline-delimited JSON over stdin/stdout.
//!
//! Protocol: one JSON object per line.
//! Request:  {"id":1, "method":"message", "params":{"tabId":3,"message":{"type":"SCROLL_EVENT",...}}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Deliveries produced by a request follow its response as
//! {"event":"deliver","tabId":4,"message":{"type":"SYNC_SCROLL",...}}

use std::io::{self, BufRead, Write};
use std::sync::Mutex;

use serde_json::{json, Value};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use splitscroll::app::{QueueMessenger, RelayApp};
use splitscroll::rpc_handler::{drain_deliveries, handle_method};
use splitscroll::services::settings_store::SharedSettings;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SPLITSCROLL_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Initial settings: `SPLITSCROLL_SETTINGS` may hold a stored settings blob.
fn initial_settings() -> SharedSettings {
    match std::env::var("SPLITSCROLL_SETTINGS") {
        Ok(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(value) => SharedSettings::from_stored(&value),
            Err(e) => {
                error!(error = %e, "ignoring unreadable SPLITSCROLL_SETTINGS");
                SharedSettings::default()
            }
        },
        Err(_) => SharedSettings::default(),
    }
}

fn emit(out: &mut impl Write, value: &Value) -> io::Result<()> {
    writeln!(out, "{}", value)?;
    out.flush()
}

fn main() -> io::Result<()> {
    init_tracing();
    let app = Mutex::new(RelayApp::new(initial_settings(), QueueMessenger::new()));

    let stdout = io::stdout();
    let mut out = stdout.lock();

    // Signal ready
    emit(&mut out, &json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}))?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                emit(&mut out, &json!({"id": null, "error": format!("parse error: {}", e)}))?;
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);
        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let response = match handle_method(&app, method, &params) {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        emit(&mut out, &response)?;

        match drain_deliveries(&app) {
            Ok(events) => {
                for event in events {
                    emit(&mut out, &event)?;
                }
            }
            Err(e) => error!(error = %e, "failed to flush deliveries"),
        }
    }

    info!("stdin closed, relay host exiting");
    Ok(())
}
