use crate::error::ProviderError;

use super::snapshot::{CpuTimes, LoadStats, ProcCpuTimes};

pub trait PlatformExtensions {
    /// Aggregate CPU counters since boot.
    fn cpu_times() -> Result<CpuTimes, ProviderError>;
    /// Load averages plus process counts, if the OS reports them together.
    fn load_stats() -> Option<LoadStats>;
    /// User and system CPU time of one process, in milliseconds.
    ///
    /// `Unsupported` means the OS has no split counters; `ProcessGone` means
    /// the process exited.
    fn process_cpu_times(pid: u32) -> Result<ProcCpuTimes, ProviderError>;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(not(target_os = "linux"))]
mod other;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(not(target_os = "linux"))]
use other as platform_impl;

pub fn cpu_times() -> Result<CpuTimes, ProviderError> {
    platform_impl::Platform::cpu_times()
}

pub fn load_stats() -> Option<LoadStats> {
    platform_impl::Platform::load_stats()
}

pub fn process_cpu_times(pid: u32) -> Result<ProcCpuTimes, ProviderError> {
    platform_impl::Platform::process_cpu_times(pid)
}
