use std::collections::{HashMap, HashSet};

use crate::system::snapshot::ProcessSnapshot;

use super::round::percent;

/// How per-process CPU time is expressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CpuPercentMode {
    /// Relative to one logical core; multi-threaded processes may exceed 100.
    #[default]
    SingleCore,
    /// The single-core value multiplied by the number of logical cores.
    CoreScaled { logical_cores: usize },
}

/// Non-fatal condition raised while deriving a memory share.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryTotalUnavailable;

/// Keeps the most recent snapshot per pid and derives CPU deltas from it.
#[derive(Debug, Default)]
pub struct ProcessTracker {
    previous: HashMap<u32, ProcessSnapshot>,
    mode: CpuPercentMode,
}

impl ProcessTracker {
    pub fn new(mode: CpuPercentMode) -> Self {
        Self {
            previous: HashMap::new(),
            mode,
        }
    }

    pub fn mode(&self) -> CpuPercentMode {
        self.mode
    }

    /// Replace all baselines without producing any output.
    pub fn seed(&mut self, snapshots: impl IntoIterator<Item = ProcessSnapshot>) {
        self.previous.clear();
        for snapshot in snapshots {
            self.previous.insert(snapshot.pid, snapshot);
        }
    }

    /// CPU percentage since the last observation of `current.pid`.
    ///
    /// Returns 0 for a pid seen for the first time, for a pid whose start time
    /// changed (the OS reused it), and when no wall time elapsed. The baseline
    /// is always replaced with `current`.
    pub fn cpu_percent(&mut self, current: &ProcessSnapshot) -> f64 {
        let Some(previous) = self.previous.insert(current.pid, current.clone()) else {
            return 0.0;
        };
        if previous.start_time != current.start_time {
            return 0.0;
        }

        let delta_cpu_ms = current
            .cpu
            .user
            .saturating_sub(previous.cpu.user)
            .saturating_add(current.cpu.system.saturating_sub(previous.cpu.system));
        let delta_wall_ms = current
            .captured_at
            .saturating_duration_since(previous.captured_at)
            .as_millis();
        if delta_wall_ms == 0 {
            return 0.0;
        }

        let single_core = 100.0 * delta_cpu_ms as f64 / delta_wall_ms as f64;
        match self.mode {
            CpuPercentMode::SingleCore => percent(single_core),
            CpuPercentMode::CoreScaled { logical_cores } => {
                percent(single_core * logical_cores as f64)
            }
        }
    }

    /// Record `current` as the baseline for its pid without deriving anything.
    pub fn observe(&mut self, current: ProcessSnapshot) {
        self.previous.insert(current.pid, current);
    }

    pub fn baseline(&self, pid: u32) -> Option<&ProcessSnapshot> {
        self.previous.get(&pid)
    }

    pub fn len(&self) -> usize {
        self.previous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }

    /// Drop baselines for pids that no longer exist.
    pub fn retain_alive(&mut self, alive: &HashSet<u32>) {
        self.previous.retain(|pid, _| alive.contains(pid));
    }
}

/// Share of physical memory held by a process.
///
/// A missing or zero total yields 0 together with a warning for the caller.
pub fn rss_percent(rss: u64, total: Option<u64>) -> (f64, Option<MemoryTotalUnavailable>) {
    match total {
        Some(total) if total > 0 => (percent(rss as f64 / total as f64 * 100.0), None),
        _ => (0.0, Some(MemoryTotalUnavailable)),
    }
}
