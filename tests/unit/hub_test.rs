//! End-to-end tests for the in-process hub: real observer tasks talking to the
//! relay over channels, on tokio's paused clock.

use std::time::Duration;

use tokio::time::sleep;

use splitscroll::hub::{spawn_hub, spawn_hub_from_env, HubHandle, TabHandle};
use splitscroll::services::scroll_observer::{SharedPage, SimulatedPage, Viewport};
use splitscroll::services::settings_store::SharedSettings;
use splitscroll::types::settings::{ObserverConfig, SettingsPatch, SyncMode, SyncSettings};
use splitscroll::types::tab::TabInfo;

fn hub_with(settings: SyncSettings) -> HubHandle {
    let (hub, _task) = spawn_hub(SharedSettings::new(settings), ObserverConfig::default());
    hub
}

async fn open(hub: &HubHandle, tab: TabInfo, range: f64) -> TabHandle {
    hub.open_tab(tab, SharedPage::new(SimulatedPage::with_range(range)))
        .await
        .unwrap()
}

/// Long enough for a frame tick, a relay pass and a quiescence window.
async fn settle() {
    sleep(Duration::from_millis(200)).await;
}

#[tokio::test(start_paused = true)]
async fn test_split_view_percentage_sync() {
    let hub = hub_with(SyncSettings::default());
    let tab1 = open(&hub, TabInfo::new(1, 1).with_split_view(3), 1000.0).await;
    let tab2 = open(&hub, TabInfo::new(2, 1).with_split_view(3), 2000.0).await;

    tab1.user_scroll_to(250.0);
    settle().await;

    assert_eq!(tab2.scroll_top(), 500.0);
    assert_eq!(tab1.scroll_top(), 250.0);
    hub.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_split_view_pixel_sync() {
    let hub = hub_with(SyncSettings {
        enable_sync: true,
        sync_mode: SyncMode::Pixel,
    });
    let tab1 = open(&hub, TabInfo::new(1, 1).with_split_view(3), 1000.0).await;
    let tab2 = open(&hub, TabInfo::new(2, 1).with_split_view(3), 2000.0).await;

    tab1.user_scroll_to(250.0);
    settle().await;

    assert_eq!(tab2.scroll_top(), 250.0);
    hub.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_other_groups_and_windows_are_untouched() {
    let hub = hub_with(SyncSettings::default());
    let tab1 = open(&hub, TabInfo::new(1, 1).with_group(5), 1000.0).await;
    let sibling = open(&hub, TabInfo::new(2, 1).with_group(5), 1000.0).await;
    let other_group = open(&hub, TabInfo::new(3, 1).with_group(6), 1000.0).await;
    let other_window = open(&hub, TabInfo::new(4, 2).with_group(5), 1000.0).await;

    tab1.user_scroll_to(400.0);
    settle().await;

    assert_eq!(sibling.scroll_top(), 400.0);
    assert_eq!(other_group.scroll_top(), 0.0);
    assert_eq!(other_window.scroll_top(), 0.0);
    hub.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_programmatic_scroll_does_not_echo_back() {
    let hub = hub_with(SyncSettings::default());
    let tab1 = open(&hub, TabInfo::new(1, 1).with_split_view(3), 1000.0).await;
    let tab2 = open(&hub, TabInfo::new(2, 1).with_split_view(3), 2000.0).await;

    tab1.user_scroll_to(250.0);
    // Let the relay land in tab2 but stay inside its quiescence window.
    sleep(Duration::from_millis(20)).await;
    assert_eq!(tab2.scroll_top(), 500.0);

    // tab2's jump fired its own scroll notification; an echo of it would
    // drag tab1 back to 250.
    tab1.page().with(|page| page.scroll_to(900.0));
    settle().await;

    assert_eq!(tab1.scroll_top(), 900.0);
    hub.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_user_scroll_after_quiescence_syncs_back() {
    let hub = hub_with(SyncSettings::default());
    let tab1 = open(&hub, TabInfo::new(1, 1).with_split_view(3), 1000.0).await;
    let tab2 = open(&hub, TabInfo::new(2, 1).with_split_view(3), 2000.0).await;

    tab1.user_scroll_to(250.0);
    settle().await;

    tab2.user_scroll_to(1500.0);
    settle().await;

    assert_eq!(tab1.scroll_top(), 750.0);
    hub.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_dead_sibling_does_not_block_delivery() {
    let hub = hub_with(SyncSettings::default());
    let tab1 = open(&hub, TabInfo::new(1, 1).with_split_view(3), 1000.0).await;
    let mut dead = open(&hub, TabInfo::new(2, 1).with_split_view(3), 1000.0).await;
    let alive = open(&hub, TabInfo::new(3, 1).with_split_view(3), 1000.0).await;

    dead.kill_observer().await;
    tab1.user_scroll_to(600.0);
    settle().await;

    assert_eq!(dead.scroll_top(), 0.0);
    assert_eq!(alive.scroll_top(), 600.0);
    hub.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_closed_tab_stops_receiving() {
    let hub = hub_with(SyncSettings::default());
    let tab1 = open(&hub, TabInfo::new(1, 1).with_split_view(3), 1000.0).await;
    let tab2 = open(&hub, TabInfo::new(2, 1).with_split_view(3), 1000.0).await;
    let page2 = tab2.page().clone();

    tab2.close().await;
    tab1.user_scroll_to(300.0);
    settle().await;

    assert_eq!(page2.scroll_top(), 0.0);
    hub.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_settings_broadcast_reaches_observers() {
    let hub = hub_with(SyncSettings::default());
    let tab1 = open(&hub, TabInfo::new(1, 1).with_split_view(3), 1000.0).await;
    let tab2 = open(&hub, TabInfo::new(2, 1).with_split_view(3), 2000.0).await;

    hub.update_settings(SettingsPatch::enable_sync(false)).unwrap();
    settle().await;

    tab1.user_scroll_to(250.0);
    settle().await;
    assert_eq!(tab2.scroll_top(), 0.0);

    hub.update_settings(SettingsPatch::enable_sync(true)).unwrap();
    hub.update_settings(SettingsPatch::sync_mode(SyncMode::Pixel)).unwrap();
    settle().await;

    tab1.user_scroll_to(300.0);
    settle().await;
    assert_eq!(tab2.scroll_top(), 300.0);
    assert_eq!(hub.settings().snapshot().sync_mode, SyncMode::Pixel);
    hub.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_env_config_reaches_observers() {
    std::env::set_var("SPLITSCROLL_FRAME_MS", "100");
    let (hub, _task) = spawn_hub_from_env(SharedSettings::default());
    std::env::remove_var("SPLITSCROLL_FRAME_MS");

    let tab1 = open(&hub, TabInfo::new(1, 1).with_split_view(3), 1000.0).await;
    let tab2 = open(&hub, TabInfo::new(2, 1).with_split_view(3), 1000.0).await;

    tab1.user_scroll_to(300.0);
    // Past the default frame but short of the configured one.
    sleep(Duration::from_millis(50)).await;
    assert_eq!(tab2.scroll_top(), 0.0);

    sleep(Duration::from_millis(100)).await;
    assert_eq!(tab2.scroll_top(), 300.0);
    hub.shutdown();
}
