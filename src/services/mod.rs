// splitscroll services
// Services implement the relay protocol: delivery policy, settings access, the per-tab observer and the shared router.

pub mod delivery;
pub mod relay_router;
pub mod scroll_observer;
pub mod settings_store;
