//! Delta engine: baselines plus the percentage rules derived from them.
//!
//! Nothing in here talks to the OS; snapshots are handed in by the sampler.

pub mod process;
pub mod round;
pub mod system;

pub use process::{CpuPercentMode, MemoryTotalUnavailable, ProcessTracker, rss_percent};
pub use system::{SystemTracker, used_percent};
