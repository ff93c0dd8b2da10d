use std::collections::HashMap;

use crate::services::relay_router::TabDirectory;
use crate::types::errors::RegistryError;
use crate::types::tab::{TabId, TabInfo, WindowId};

/// Trait defining the tab registry interface.
pub trait TabRegistryTrait {
    fn upsert_tab(&mut self, tab: TabInfo) -> TabInfo;
    fn remove_tab(&mut self, tab_id: TabId) -> Result<(), RegistryError>;
    fn move_tab(&mut self, tab_id: TabId, new_index: usize) -> Result<(), RegistryError>;
    fn set_split_view(&mut self, tab_id: TabId, split_view_id: Option<i64>) -> Result<(), RegistryError>;
    fn set_group(&mut self, tab_id: TabId, group_id: Option<i64>) -> Result<(), RegistryError>;
    fn get_tab(&self, tab_id: TabId) -> Option<TabInfo>;
    fn window_order(&self, window_id: WindowId) -> Vec<TabId>;
    fn all_tab_ids(&self) -> Vec<TabId>;
    fn tab_count(&self) -> usize;
}

#[derive(Debug, Clone)]
struct TabRecord {
    window_id: WindowId,
    split_view_id: Option<i64>,
    group_id: Option<i64>,
}

/// In-memory view of the browser's windows and tabs, as reported by the host.
///
/// A tab's index is never stored; it is derived from its position among the
/// tabs of its window. Every lookup is linear in the number of tabs.
#[derive(Debug, Default)]
pub struct TabRegistry {
    tabs: HashMap<TabId, TabRecord>,
    tab_order: Vec<TabId>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_order_index(&self, tab_id: TabId) -> Option<usize> {
        self.tab_order.iter().position(|id| *id == tab_id)
    }

    fn record_mut(&mut self, tab_id: TabId) -> Result<&mut TabRecord, RegistryError> {
        self.tabs
            .get_mut(&tab_id)
            .ok_or(RegistryError::TabNotFound(tab_id))
    }

    fn in_window(&self, tab_id: TabId, window_id: WindowId) -> bool {
        self.tabs
            .get(&tab_id)
            .is_some_and(|record| record.window_id == window_id)
    }

    fn to_info(id: TabId, record: &TabRecord, index: Option<usize>) -> TabInfo {
        TabInfo {
            id,
            window_id: record.window_id,
            split_view_id: record.split_view_id,
            group_id: record.group_id,
            index: index.map(|i| i as u32),
        }
    }
}

impl TabRegistryTrait for TabRegistry {
    /// Registers a tab, or updates the tab with the same id.
    /// The incoming `index` is ignored; new tabs go to the end of their window.
    fn upsert_tab(&mut self, tab: TabInfo) -> TabInfo {
        let record = TabRecord {
            window_id: tab.window_id,
            split_view_id: tab.split_view_id,
            group_id: tab.group_id,
        };

        match self.tabs.insert(tab.id, record) {
            Some(previous) => {
                if previous.window_id != tab.window_id {
                    // Re-append so it lands at the end of the new window.
                    if let Some(order_idx) = self.find_order_index(tab.id) {
                        self.tab_order.remove(order_idx);
                    }
                    self.tab_order.push(tab.id);
                }
            }
            None => self.tab_order.push(tab.id),
        }

        self.get_tab(tab.id).unwrap_or(tab)
    }

    fn remove_tab(&mut self, tab_id: TabId) -> Result<(), RegistryError> {
        self.tabs
            .remove(&tab_id)
            .ok_or(RegistryError::TabNotFound(tab_id))?;
        self.tab_order.retain(|id| *id != tab_id);
        Ok(())
    }

    /// Moves a tab to `new_index` within its own window.
    fn move_tab(&mut self, tab_id: TabId, new_index: usize) -> Result<(), RegistryError> {
        let window_id = self
            .tabs
            .get(&tab_id)
            .map(|record| record.window_id)
            .ok_or(RegistryError::TabNotFound(tab_id))?;

        let mut window = self.window_order(window_id);
        if new_index >= window.len() {
            return Err(RegistryError::InvalidIndex(new_index));
        }
        let current = window
            .iter()
            .position(|id| *id == tab_id)
            .ok_or(RegistryError::TabNotFound(tab_id))?;
        let id = window.remove(current);
        window.insert(new_index, id);

        // Write the window's new order back into the slots it already occupies.
        let mut reordered = window.into_iter();
        let tabs = &self.tabs;
        for slot in self.tab_order.iter_mut() {
            let in_window = tabs
                .get(slot)
                .is_some_and(|record| record.window_id == window_id);
            if in_window {
                if let Some(next) = reordered.next() {
                    *slot = next;
                }
            }
        }
        Ok(())
    }

    fn set_split_view(&mut self, tab_id: TabId, split_view_id: Option<i64>) -> Result<(), RegistryError> {
        self.record_mut(tab_id)?.split_view_id = split_view_id;
        Ok(())
    }

    fn set_group(&mut self, tab_id: TabId, group_id: Option<i64>) -> Result<(), RegistryError> {
        self.record_mut(tab_id)?.group_id = group_id;
        Ok(())
    }

    fn get_tab(&self, tab_id: TabId) -> Option<TabInfo> {
        let record = self.tabs.get(&tab_id)?;
        let index = self
            .tab_order
            .iter()
            .filter(|id| self.in_window(**id, record.window_id))
            .position(|id| *id == tab_id);
        Some(Self::to_info(tab_id, record, index))
    }

    fn window_order(&self, window_id: WindowId) -> Vec<TabId> {
        self.tab_order
            .iter()
            .filter(|id| self.in_window(**id, window_id))
            .copied()
            .collect()
    }

    fn all_tab_ids(&self) -> Vec<TabId> {
        self.tab_order.clone()
    }

    fn tab_count(&self) -> usize {
        self.tabs.len()
    }
}

impl TabDirectory for TabRegistry {
    fn tabs_in_window(&self, window_id: WindowId) -> Vec<TabInfo> {
        self.window_order(window_id)
            .into_iter()
            .enumerate()
            .filter_map(|(index, id)| {
                self.tabs
                    .get(&id)
                    .map(|record| Self::to_info(id, record, Some(index)))
            })
            .collect()
    }
}
