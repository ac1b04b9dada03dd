use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::system::snapshot::{CpuTimes, LoadStats, MemStats, ProcessSnapshot};

/// One structured record handed to an [`EventSink`](crate::sink::EventSink).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    System(SystemEvent),
    Proc(ProcEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SystemEvent {
    pub timestamp: DateTime<Utc>,
    pub load: LoadStats,
    pub cpu: CpuBlock,
    pub mem: MemBlock,
    pub swap: MemBlock,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CpuBlock {
    #[serde(flatten)]
    pub times: CpuTimes,
    pub user_percent: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MemBlock {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub actual_used: u64,
    pub actual_free: u64,
    pub used_percent: f64,
}

impl MemBlock {
    pub fn new(stats: MemStats, used_percent: f64) -> Self {
        MemBlock {
            total: stats.total,
            used: stats.used,
            free: stats.free,
            actual_used: stats.actual_used,
            actual_free: stats.actual_free,
            used_percent,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcEvent {
    pub timestamp: DateTime<Utc>,
    pub pid: u32,
    pub ppid: u32,
    pub name: String,
    pub state: String,
    pub mem: ProcMemBlock,
    pub cpu: ProcCpuBlock,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcMemBlock {
    pub size: u64,
    pub rss: u64,
    pub rss_percent: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcCpuBlock {
    pub user: u64,
    pub system: u64,
    pub total: u64,
    pub start_time: u64,
    pub user_percent: f64,
}

impl ProcEvent {
    pub fn new(
        timestamp: DateTime<Utc>,
        snapshot: ProcessSnapshot,
        user_percent: f64,
        rss_percent: f64,
    ) -> Self {
        ProcEvent {
            timestamp,
            pid: snapshot.pid,
            ppid: snapshot.ppid,
            mem: ProcMemBlock {
                size: snapshot.size,
                rss: snapshot.rss,
                rss_percent,
            },
            cpu: ProcCpuBlock {
                user: snapshot.cpu.user,
                system: snapshot.cpu.system,
                total: snapshot.cpu.total(),
                start_time: snapshot.start_time,
                user_percent,
            },
            name: snapshot.name,
            state: snapshot.state,
        }
    }
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::System(_) => "system",
            Event::Proc(_) => "proc",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Event::System(e) => e.timestamp,
            Event::Proc(e) => e.timestamp,
        }
    }
}
