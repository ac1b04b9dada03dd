use std::time::Instant;

use serde::Serialize;

/// Cumulative CPU time counters since boot, in OS clock ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    pub fn sum(&self) -> u64 {
        [
            self.user,
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
        ]
        .iter()
        .fold(0u64, |acc, v| acc.saturating_add(*v))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct LoadStats {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
    pub procs_running: u64,
    pub procs_total: u64,
}

/// Memory or swap totals in bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemStats {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub actual_used: u64,
    pub actual_free: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemorySnapshot {
    pub mem: MemStats,
    pub swap: MemStats,
}

/// Per-process CPU time in milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcCpuTimes {
    pub user: u64,
    pub system: u64,
}

impl ProcCpuTimes {
    pub fn total(&self) -> u64 {
        self.user.saturating_add(self.system)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub ppid: u32,
    pub name: String,
    pub state: String,
    pub cpu: ProcCpuTimes,
    pub rss: u64,
    pub size: u64,
    /// Seconds since the epoch; together with `pid` identifies one process lifetime.
    pub start_time: u64,
    pub captured_at: Instant,
}
