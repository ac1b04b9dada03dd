use crate::error::ProviderError;

use super::snapshot::{CpuTimes, LoadStats, MemorySnapshot, ProcessSnapshot};

pub trait SystemStatsSource {
    fn load(&mut self) -> Result<LoadStats, ProviderError>;
    fn cpu_times(&mut self) -> Result<CpuTimes, ProviderError>;
}

pub trait MemoryStatsSource {
    fn memory(&mut self) -> Result<MemorySnapshot, ProviderError>;
}

pub trait ProcessListSource {
    /// Refresh and list the pids currently alive.
    fn pids(&mut self) -> Result<Vec<u32>, ProviderError>;

    /// Snapshot one pid from the latest listing. A pid that exited in the
    /// meantime yields [`ProviderError::ProcessGone`].
    fn process(&mut self, pid: u32) -> Result<ProcessSnapshot, ProviderError>;
}
