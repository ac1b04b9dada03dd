use crate::system::snapshot::CpuTimes;

use super::round::percent;

/// Derives system-wide user CPU percentage from consecutive counter snapshots.
#[derive(Debug, Default)]
pub struct SystemTracker {
    previous: Option<CpuTimes>,
}

impl SystemTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns 0 on the first call. Every call replaces the baseline.
    pub fn cpu_percent(&mut self, current: CpuTimes) -> f64 {
        let Some(previous) = self.previous.replace(current) else {
            return 0.0;
        };

        let delta_all = current.sum().saturating_sub(previous.sum());
        if delta_all == 0 {
            return 0.0;
        }
        let delta_user = current.user.saturating_sub(previous.user);

        percent(100.0 * delta_user as f64 / delta_all as f64)
    }

    pub fn baseline(&self) -> Option<&CpuTimes> {
        self.previous.as_ref()
    }
}

/// Share of `total` taken by `used`, or 0 when `total` is 0.
pub fn used_percent(total: u64, used: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    percent(100.0 * used as f64 / total as f64)
}
