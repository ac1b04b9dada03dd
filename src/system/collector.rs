use std::time::Instant;

use sysinfo::{CpuRefreshKind, Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use crate::error::ProviderError;

use super::platform;
use super::snapshot::{
    CpuTimes, LoadStats, MemStats, MemorySnapshot, ProcCpuTimes, ProcessSnapshot,
};
use super::source::{MemoryStatsSource, ProcessListSource, SystemStatsSource};

/// Live data source backed by sysinfo, with `/proc` counters where available.
pub struct Collector {
    sys: System,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_list(CpuRefreshKind::nothing());
        sys.refresh_memory();
        Collector { sys }
    }

    pub fn logical_cores(&self) -> usize {
        self.sys.cpus().len().max(1)
    }
}

impl SystemStatsSource for Collector {
    fn load(&mut self) -> Result<LoadStats, ProviderError> {
        if let Some(load) = platform::load_stats() {
            return Ok(load);
        }
        // Counts the processes cached by the previous `pids()` refresh, so
        // procs_total lags one tick behind.
        let avg = System::load_average();
        Ok(LoadStats {
            load1: avg.one,
            load5: avg.five,
            load15: avg.fifteen,
            procs_running: 0,
            procs_total: self.sys.processes().len() as u64,
        })
    }

    fn cpu_times(&mut self) -> Result<CpuTimes, ProviderError> {
        platform::cpu_times()
    }
}

impl MemoryStatsSource for Collector {
    fn memory(&mut self) -> Result<MemorySnapshot, ProviderError> {
        self.sys.refresh_memory();

        let total = self.sys.total_memory();
        let available = self.sys.available_memory();
        let mem = MemStats {
            total,
            used: self.sys.used_memory(),
            free: self.sys.free_memory(),
            actual_used: total.saturating_sub(available),
            actual_free: available,
        };
        let swap = MemStats {
            total: self.sys.total_swap(),
            used: self.sys.used_swap(),
            free: self.sys.free_swap(),
            actual_used: self.sys.used_swap(),
            actual_free: self.sys.free_swap(),
        };
        Ok(MemorySnapshot { mem, swap })
    }
}

impl ProcessListSource for Collector {
    fn pids(&mut self) -> Result<Vec<u32>, ProviderError> {
        let _refresh_span = tracing::debug_span!("collector.refresh").entered();

        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_memory().with_cpu(),
        );
        let mut pids: Vec<u32> = self.sys.processes().keys().map(|pid| pid.as_u32()).collect();
        pids.sort_unstable();
        Ok(pids)
    }

    fn process(&mut self, pid: u32) -> Result<ProcessSnapshot, ProviderError> {
        let process = self
            .sys
            .process(Pid::from_u32(pid))
            .ok_or(ProviderError::ProcessGone(pid))?;

        let cpu = match platform::process_cpu_times(pid) {
            Ok(cpu) => cpu,
            Err(ProviderError::Unsupported(_)) => ProcCpuTimes {
                user: process.accumulated_cpu_time(),
                system: 0,
            },
            Err(e) => return Err(e),
        };

        Ok(ProcessSnapshot {
            pid,
            ppid: process.parent().map(|p| p.as_u32()).unwrap_or(0),
            name: process.name().to_string_lossy().to_string(),
            state: process.status().to_string(),
            cpu,
            rss: process.memory(),
            size: process.virtual_memory(),
            start_time: process.start_time(),
            captured_at: Instant::now(),
        })
    }
}
