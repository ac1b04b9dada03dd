use crate::error::ProviderError;
use crate::system::snapshot::{CpuTimes, LoadStats, ProcCpuTimes};

use super::PlatformExtensions;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn cpu_times() -> Result<CpuTimes, ProviderError> {
        Err(ProviderError::Unsupported("cumulative cpu counters"))
    }

    fn load_stats() -> Option<LoadStats> {
        None
    }

    fn process_cpu_times(_pid: u32) -> Result<ProcCpuTimes, ProviderError> {
        // Collector falls back to sysinfo's accumulated cpu time
        Err(ProviderError::Unsupported("per-process cpu times"))
    }
}
