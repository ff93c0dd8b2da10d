use serde::{Deserialize, Serialize};

use super::settings::SyncMode;

/// Normalized scroll position emitted by an observer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScrollMetrics {
    pub percentage: f64,
    pub pixel: u64,
}

impl ScrollMetrics {
    /// Computes metrics for a page, or `None` when the page has no
    /// scrollable range.
    pub fn compute(scroll_top: f64, scroll_height: f64, viewport_height: f64) -> Option<Self> {
        let range = scroll_height - viewport_height;
        if !(range > 0.0) || !scroll_top.is_finite() {
            return None;
        }
        Some(Self {
            percentage: (scroll_top / range).clamp(0.0, 1.0),
            pixel: scroll_top.max(0.0).round() as u64,
        })
    }

    /// Whether `percentage` is a finite fraction in [0, 1], as `compute` produces.
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.percentage)
    }
}

/// Instruction from the relay telling an observer where to scroll.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncCommand {
    pub percentage: f64,
    pub pixel: u64,
    /// Mode active when the command was relayed; receivers fall back to their
    /// own cached mode when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_mode: Option<SyncMode>,
}

impl SyncCommand {
    pub fn from_metrics(metrics: ScrollMetrics, sync_mode: SyncMode) -> Self {
        Self {
            percentage: metrics.percentage,
            pixel: metrics.pixel,
            sync_mode: Some(sync_mode),
        }
    }
}
