//! RPC method handler for the splitscroll relay host.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_method` dispatches host requests to the `RelayApp`; deliveries the
//! relay produces are queued on its `QueueMessenger` for the server to flush.

use std::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::{QueueMessenger, RelayApp};
use crate::managers::tab_registry::TabRegistryTrait;
use crate::services::relay_router::TabDirectory;
use crate::types::message::Message;
use crate::types::settings::SettingsPatch;
use crate::types::tab::{TabId, TabInfo, WindowId};

pub type HostApp = RelayApp<QueueMessenger>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageParams {
    tab_id: TabId,
    message: Message,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveParams {
    id: TabId,
    index: usize,
}

fn parse<T: for<'de> Deserialize<'de>>(params: &Value) -> Result<T, String> {
    serde_json::from_value(params.clone()).map_err(|e| format!("invalid params: {}", e))
}

/// Dispatch a host request to the relay.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(app: &Mutex<HostApp>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Tabs ───
        "tab.upsert" => {
            let tab: TabInfo = parse(params)?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let stored = a.registry.upsert_tab(tab);
            serde_json::to_value(stored).map_err(|e| e.to_string())
        }
        "tab.move" => {
            let p: MoveParams = parse(params)?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.registry.move_tab(p.id, p.index).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "tab.remove" => {
            let id = params.get("id").and_then(|v| v.as_u64()).ok_or("missing id")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.registry.remove_tab(id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "tab.list" => {
            let window_id: WindowId = params
                .get("windowId")
                .and_then(|v| v.as_u64())
                .ok_or("missing windowId")?;
            let a = app.lock().map_err(|e| e.to_string())?;
            let tabs = a.registry.tabs_in_window(window_id);
            serde_json::to_value(tabs).map_err(|e| e.to_string())
        }

        // ─── Relay ───
        "message" => {
            let p: MessageParams = parse(params)?;
            if matches!(p.message, Message::ScrollEvent(m) if !m.is_valid()) {
                return Err("invalid params: percentage must be within [0, 1]".to_string());
            }
            let mut a = app.lock().map_err(|e| e.to_string())?;
            if a.registry.get_tab(p.tab_id).is_none() {
                return Err(format!("unknown tab: {}", p.tab_id));
            }
            let outcome = a.receive(p.tab_id, &p.message);
            serde_json::to_value(outcome).map_err(|e| e.to_string())
        }

        // ─── Settings ───
        "settings.get" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            a.settings.to_stored().map_err(|e| e.to_string())
        }
        "settings.update" => {
            let patch: SettingsPatch = parse(params)?;
            if patch.is_empty() {
                return Err("settings.update needs enableSync or syncMode".to_string());
            }
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let reached = a.update_settings(patch);
            Ok(json!({"ok": true, "notified": reached}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}

/// Takes every delivery queued since the last call, rendered as host events.
pub fn drain_deliveries(app: &Mutex<HostApp>) -> Result<Vec<Value>, String> {
    let a = app.lock().map_err(|e| e.to_string())?;
    Ok(a.messenger()
        .drain()
        .into_iter()
        .map(|(tab_id, message)| json!({"event": "deliver", "tabId": tab_id, "message": message}))
        .collect())
}
