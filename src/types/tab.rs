use std::fmt;

use serde::{Deserialize, Serialize};

/// Browser-assigned tab identifier.
pub type TabId = u64;

/// Browser-assigned top-level window identifier.
pub type WindowId = u64;

/// What the relay knows about a tab when routing scroll events.
///
/// Group identifiers follow browser conventions: a negative value means
/// "not in a split view / group" and is treated the same as absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub id: TabId,
    pub window_id: WindowId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_view_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

impl TabInfo {
    /// A tab with no grouping signals at all.
    pub fn new(id: TabId, window_id: WindowId) -> Self {
        Self {
            id,
            window_id,
            split_view_id: None,
            group_id: None,
            index: None,
        }
    }

    pub fn with_split_view(mut self, split_view_id: i64) -> Self {
        self.split_view_id = Some(split_view_id);
        self
    }

    pub fn with_group(mut self, group_id: i64) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    /// Resolves which sync group this tab belongs to.
    pub fn group_key(&self) -> GroupKey {
        GroupKey::resolve(self)
    }
}

/// Identifies which tabs are siblings for scroll sync.
///
/// Variants are ordered by resolution priority, strongest signal first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    SplitView(i64),
    TabGroup(i64),
    Position(u32),
    Ungrouped,
}

impl GroupKey {
    /// Picks the strongest grouping signal present on the tab.
    pub fn resolve(tab: &TabInfo) -> Self {
        if let Some(id) = tab.split_view_id.filter(|id| *id >= 0) {
            return GroupKey::SplitView(id);
        }
        if let Some(id) = tab.group_id.filter(|id| *id >= 0) {
            return GroupKey::TabGroup(id);
        }
        match tab.index {
            Some(index) => GroupKey::Position(index),
            None => GroupKey::Ungrouped,
        }
    }

    pub fn is_defined(&self) -> bool {
        !matches!(self, GroupKey::Ungrouped)
    }

    /// Two keys are siblings when both are the same defined key, or both are
    /// ungrouped. A defined key never matches `Ungrouped`.
    pub fn is_same_group(&self, other: &GroupKey) -> bool {
        match (self, other) {
            (GroupKey::Ungrouped, GroupKey::Ungrouped) => true,
            (GroupKey::Ungrouped, _) | (_, GroupKey::Ungrouped) => false,
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::SplitView(id) => write!(f, "{}", id),
            GroupKey::TabGroup(id) => write!(f, "group_{}", id),
            GroupKey::Position(index) => write!(f, "index_{}", index),
            GroupKey::Ungrouped => write!(f, "ungrouped"),
        }
    }
}
