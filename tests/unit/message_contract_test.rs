//! Wire-format tests for the three message types.

use serde_json::json;
use splitscroll::types::message::Message;
use splitscroll::types::scroll::{ScrollMetrics, SyncCommand};
use splitscroll::types::settings::{SettingsPatch, SyncMode};

#[test]
fn test_scroll_event_shape() {
    let msg = Message::ScrollEvent(ScrollMetrics {
        percentage: 0.25,
        pixel: 250,
    });
    assert_eq!(
        serde_json::to_value(msg).unwrap(),
        json!({"type": "SCROLL_EVENT", "percentage": 0.25, "pixel": 250})
    );
}

#[test]
fn test_sync_scroll_shape() {
    let msg = Message::SyncScroll(SyncCommand {
        percentage: 0.5,
        pixel: 10,
        sync_mode: Some(SyncMode::Pixel),
    });
    assert_eq!(
        serde_json::to_value(msg).unwrap(),
        json!({"type": "SYNC_SCROLL", "percentage": 0.5, "pixel": 10, "syncMode": "pixel"})
    );
}

#[test]
fn test_sync_scroll_without_mode_parses() {
    let msg: Message = serde_json::from_value(json!({"type": "SYNC_SCROLL", "percentage": 0.5, "pixel": 10})).unwrap();
    match msg {
        Message::SyncScroll(cmd) => assert_eq!(cmd.sync_mode, None),
        other => panic!("unexpected variant: {:?}", other),
    }
}

#[test]
fn test_settings_updated_partial_payload() {
    let msg: Message = serde_json::from_value(json!({"type": "SETTINGS_UPDATED", "enableSync": false})).unwrap();
    assert_eq!(msg, Message::SettingsUpdated(SettingsPatch::enable_sync(false)));
    assert_eq!(msg.kind(), "SETTINGS_UPDATED");
}

#[test]
fn test_unknown_type_is_rejected() {
    let result = serde_json::from_value::<Message>(json!({"type": "SCROLL_TO_TOP"}));
    assert!(result.is_err());
}
