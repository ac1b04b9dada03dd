#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use topwatch::error::{ProviderError, SinkError};
use topwatch::event::{Event, ProcEvent, SystemEvent};
use topwatch::sampler::StopHandle;
use topwatch::sink::EventSink;
use topwatch::system::snapshot::{
    CpuTimes, LoadStats, MemStats, MemorySnapshot, ProcCpuTimes, ProcessSnapshot,
};
use topwatch::system::source::{MemoryStatsSource, ProcessListSource, SystemStatsSource};

#[derive(Debug, Clone)]
pub struct FakeProcess {
    pub name: String,
    pub user_ms: u64,
    pub system_ms: u64,
    pub rss: u64,
    pub start_time: u64,
}

impl FakeProcess {
    pub fn new(name: &str) -> Self {
        FakeProcess {
            name: name.to_string(),
            user_ms: 0,
            system_ms: 0,
            rss: 0,
            start_time: 1_700_000_000,
        }
    }

    pub fn cpu(mut self, user_ms: u64, system_ms: u64) -> Self {
        self.user_ms = user_ms;
        self.system_ms = system_ms;
        self
    }

    pub fn rss(mut self, rss: u64) -> Self {
        self.rss = rss;
        self
    }
}

/// Scripted OS state. `None` makes the matching query fail.
#[derive(Debug)]
pub struct FakeState {
    pub base: Instant,
    pub elapsed: Duration,
    pub load: Option<LoadStats>,
    pub cpu: Option<CpuTimes>,
    pub memory: Option<MemorySnapshot>,
    pub procs: BTreeMap<u32, FakeProcess>,
    /// Listed by `pids` but gone by the time they are fetched.
    pub vanishing: HashSet<u32>,
    pub fail_pids: bool,
}

impl Default for FakeState {
    fn default() -> Self {
        FakeState {
            base: Instant::now(),
            elapsed: Duration::ZERO,
            load: Some(LoadStats {
                load1: 0.5,
                load5: 0.4,
                load15: 0.3,
                procs_running: 1,
                procs_total: 3,
            }),
            cpu: Some(CpuTimes::default()),
            memory: Some(memory(10_000_000, 4_000_000)),
            procs: BTreeMap::new(),
            vanishing: HashSet::new(),
            fail_pids: false,
        }
    }
}

impl FakeState {
    pub fn advance(&mut self, ms: u64) {
        self.elapsed += Duration::from_millis(ms);
    }

    pub fn set_cpu(&mut self, user: u64, idle: u64) {
        self.cpu = Some(CpuTimes {
            user,
            idle,
            ..CpuTimes::default()
        });
    }
}

pub fn memory(total: u64, used: u64) -> MemorySnapshot {
    MemorySnapshot {
        mem: MemStats {
            total,
            used,
            free: total - used,
            actual_used: used,
            actual_free: total - used,
        },
        swap: MemStats::default(),
    }
}

#[derive(Clone, Default)]
pub struct FakeSource {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }
}

impl SystemStatsSource for FakeSource {
    fn load(&mut self) -> Result<LoadStats, ProviderError> {
        self.with(|s| s.load)
            .ok_or(ProviderError::Unsupported("load statistics"))
    }

    fn cpu_times(&mut self) -> Result<CpuTimes, ProviderError> {
        self.with(|s| s.cpu)
            .ok_or_else(|| ProviderError::parse("/proc/stat", "scripted failure"))
    }
}

impl MemoryStatsSource for FakeSource {
    fn memory(&mut self) -> Result<MemorySnapshot, ProviderError> {
        self.with(|s| s.memory)
            .ok_or(ProviderError::Unsupported("memory statistics"))
    }
}

impl ProcessListSource for FakeSource {
    fn pids(&mut self) -> Result<Vec<u32>, ProviderError> {
        self.with(|s| {
            if s.fail_pids {
                return Err(ProviderError::Unsupported("process listing"));
            }
            Ok(s.procs.keys().copied().collect())
        })
    }

    fn process(&mut self, pid: u32) -> Result<ProcessSnapshot, ProviderError> {
        self.with(|s| {
            if s.vanishing.contains(&pid) {
                return Err(ProviderError::ProcessGone(pid));
            }
            let p = s.procs.get(&pid).ok_or(ProviderError::ProcessGone(pid))?;
            Ok(ProcessSnapshot {
                pid,
                ppid: 1,
                name: p.name.clone(),
                state: "Run".to_string(),
                cpu: ProcCpuTimes {
                    user: p.user_ms,
                    system: p.system_ms,
                },
                rss: p.rss,
                size: p.rss * 2,
                start_time: p.start_time,
                captured_at: s.base + s.elapsed,
            })
        })
    }
}

/// Keeps every event; optionally stops a sampler after N system events.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub events: Arc<Mutex<Vec<Event>>>,
    stop_after: Option<(usize, StopHandle)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stopping_after(system_events: usize, stop: StopHandle) -> Self {
        RecordingSink {
            events: Arc::default(),
            stop_after: Some((system_events, stop)),
        }
    }

    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    pub fn system_events(&self) -> Vec<SystemEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                Event::System(s) => Some(s.clone()),
                Event::Proc(_) => None,
            })
            .collect()
    }

    pub fn proc_events(&self) -> Vec<ProcEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                Event::Proc(p) => Some(p.clone()),
                Event::System(_) => None,
            })
            .collect()
    }
}

/// Records like `RecordingSink` but fails the listed event numbers (1-based)
/// with an I/O error instead of keeping them.
#[derive(Clone, Default)]
pub struct FailingSink {
    pub inner: RecordingSink,
    fail_on: HashSet<usize>,
    sent: Arc<Mutex<usize>>,
}

impl FailingSink {
    pub fn failing_on(events: &[usize]) -> Self {
        FailingSink {
            inner: RecordingSink::new(),
            fail_on: events.iter().copied().collect(),
            sent: Arc::default(),
        }
    }
}

impl EventSink for FailingSink {
    async fn send(&mut self, event: Event) -> Result<(), SinkError> {
        let n = {
            let mut sent = self.sent.lock().unwrap();
            *sent += 1;
            *sent
        };
        if self.fail_on.contains(&n) {
            return Err(SinkError::Io(std::io::Error::other("disk full")));
        }
        self.inner.send(event).await
    }
}

impl EventSink for RecordingSink {
    async fn send(&mut self, event: Event) -> Result<(), SinkError> {
        let mut events = self.events.lock().unwrap();
        events.push(event);
        if let Some((limit, stop)) = &self.stop_after {
            let systems = events.iter().filter(|e| e.kind() == "system").count();
            if systems >= *limit {
                stop.stop();
            }
        }
        Ok(())
    }
}
