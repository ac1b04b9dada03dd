use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use tracing::{Instrument, debug, info, warn};

use crate::error::SinkError;
use crate::event::{CpuBlock, Event, MemBlock, ProcEvent, SystemEvent};
use crate::matcher::ProcessMatcher;
use crate::sink::EventSink;
use crate::system::snapshot::MemorySnapshot;
use crate::system::source::{MemoryStatsSource, ProcessListSource, SystemStatsSource};
use crate::tracker::{CpuPercentMode, ProcessTracker, SystemTracker, rss_percent, used_percent};

pub const DEFAULT_PERIOD: Duration = Duration::from_secs(1);
pub const DEFAULT_GC_EVERY: u32 = 10;

/// Requests a cooperative stop. Cloneable and safe to trigger from any thread.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// What one tick emitted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub system_emitted: bool,
    pub procs_emitted: usize,
    pub procs_seen: usize,
}

/// Periodic sampling loop.
///
/// Everything runs on the caller's task: each tick queries the sources,
/// derives percentages and awaits the sink before the next query. The sleep
/// between ticks is a fixed `period`, so the effective interval grows by the
/// time a tick takes.
pub struct Sampler<Src, S> {
    source: Src,
    sink: S,
    matcher: ProcessMatcher,
    system: SystemTracker,
    procs: ProcessTracker,
    period: Duration,
    gc_every: u32,
    ticks: u64,
    stop: StopHandle,
}

impl<Src, S> Sampler<Src, S>
where
    Src: SystemStatsSource + MemoryStatsSource + ProcessListSource,
    S: EventSink,
{
    pub fn new(source: Src, sink: S, matcher: ProcessMatcher) -> Self {
        Sampler {
            source,
            sink,
            matcher,
            system: SystemTracker::new(),
            procs: ProcessTracker::new(CpuPercentMode::default()),
            period: DEFAULT_PERIOD,
            gc_every: DEFAULT_GC_EVERY,
            ticks: 0,
            stop: StopHandle::new(),
        }
    }

    /// A zero period falls back to the default.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = if period.is_zero() {
            DEFAULT_PERIOD
        } else {
            period
        };
        self
    }

    pub fn with_cpu_mode(mut self, mode: CpuPercentMode) -> Self {
        self.procs = ProcessTracker::new(mode);
        self
    }

    /// Evict baselines of vanished pids every `ticks` ticks; 0 never evicts.
    pub fn with_gc_every(mut self, ticks: u32) -> Self {
        self.gc_every = ticks;
        self
    }

    /// Share an existing stop flag instead of the sampler's own.
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn process_tracker(&self) -> &ProcessTracker {
        &self.procs
    }

    /// Seed process baselines, then sample every `period` until stopped.
    ///
    /// The stop flag is read before sleeping and again after waking, so a
    /// stop requested mid-sleep never starts another tick. Returns
    /// `SinkError::Closed` if the sink goes away.
    pub async fn run(&mut self) -> Result<(), SinkError> {
        info!(
            period_ms = self.period.as_millis() as u64,
            patterns = ?self.matcher.patterns().collect::<Vec<_>>(),
            mode = ?self.procs.mode(),
            "sampler started"
        );
        self.seed();

        while !self.stop.is_stopped() {
            tokio::time::sleep(self.period).await;
            if self.stop.is_stopped() {
                break;
            }
            self.tick().await?;
        }

        info!(ticks = self.ticks, "sampler stopped");
        Ok(())
    }

    /// Record a baseline for every current process without emitting anything.
    pub fn seed(&mut self) {
        let pids = match self.source.pids() {
            Ok(pids) => pids,
            Err(e) => {
                warn!(error = %e, "getting the list of pids");
                Vec::new()
            }
        };

        let mut snapshots = Vec::with_capacity(pids.len());
        for pid in pids {
            match self.source.process(pid) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => debug!(pid, error = %e, "skip process"),
            }
        }
        debug!(count = snapshots.len(), "seeded process baselines");
        self.procs.seed(snapshots);
    }

    /// Sample once: one system event, then one proc event per matched process.
    pub async fn tick(&mut self) -> Result<TickReport, SinkError> {
        self.ticks += 1;
        let span = tracing::debug_span!("sampler.tick", tick = self.ticks);
        self.sample().instrument(span).await
    }

    async fn sample(&mut self) -> Result<TickReport, SinkError> {
        let (system_emitted, memory) = self.export_system_stats().await?;
        let mem_total = memory.map(|m| m.mem.total);
        let (procs_seen, procs_emitted) = self.export_proc_stats(mem_total).await?;

        let report = TickReport {
            system_emitted,
            procs_emitted,
            procs_seen,
        };
        debug!(?report, tracked = self.procs.len(), "tick complete");
        Ok(report)
    }

    async fn export_system_stats(
        &mut self,
    ) -> Result<(bool, Option<MemorySnapshot>), SinkError> {
        let load = self
            .source
            .load()
            .inspect_err(|e| warn!(error = %e, "getting load statistics"))
            .ok();
        let cpu = self
            .source
            .cpu_times()
            .inspect_err(|e| warn!(error = %e, "getting cpu times"))
            .ok()
            .map(|times| (times, self.system.cpu_percent(times)));
        let memory = self
            .source
            .memory()
            .inspect_err(|e| warn!(error = %e, "getting memory details"))
            .ok();

        let (Some(load), Some((times, user_percent)), Some(memory)) = (load, cpu, memory) else {
            return Ok((false, memory));
        };

        let event = Event::System(SystemEvent {
            timestamp: Utc::now(),
            load,
            cpu: CpuBlock {
                times,
                user_percent,
            },
            mem: MemBlock::new(memory.mem, used_percent(memory.mem.total, memory.mem.used)),
            swap: MemBlock::new(
                memory.swap,
                used_percent(memory.swap.total, memory.swap.used),
            ),
        });
        let sent = self.emit(event).await?;
        Ok((sent, Some(memory)))
    }

    async fn export_proc_stats(
        &mut self,
        mem_total: Option<u64>,
    ) -> Result<(usize, usize), SinkError> {
        let pids = match self.source.pids() {
            Ok(pids) => pids,
            Err(e) => {
                warn!(error = %e, "getting the list of pids");
                return Ok((0, 0));
            }
        };

        let collect_garbage = self.gc_every > 0 && self.ticks % u64::from(self.gc_every) == 0;
        let mut alive = HashSet::new();
        let mut seen = 0;
        let mut emitted = 0;
        let mut warned_memory = false;

        for pid in pids {
            // A process can exit between listing and fetching it.
            let snapshot = match self.source.process(pid) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    debug!(pid, error = %e, "skip process");
                    continue;
                }
            };
            seen += 1;
            if collect_garbage {
                alive.insert(pid);
            }

            if !self.matcher.matches(&snapshot.name) {
                self.procs.observe(snapshot);
                continue;
            }

            let user_percent = self.procs.cpu_percent(&snapshot);
            let (rss_pct, warning) = rss_percent(snapshot.rss, mem_total);
            if warning.is_some() && !warned_memory {
                warn!("total physical memory unavailable, reporting rss_percent as 0");
                warned_memory = true;
            }

            let event = Event::Proc(ProcEvent::new(Utc::now(), snapshot, user_percent, rss_pct));
            if self.emit(event).await? {
                emitted += 1;
            }
        }

        if collect_garbage {
            let before = self.procs.len();
            self.procs.retain_alive(&alive);
            debug!(evicted = before - self.procs.len(), "evicted stale process baselines");
        }
        Ok((seen, emitted))
    }

    /// Send one event. Only a closed sink is an error; anything else is
    /// logged and the event dropped.
    async fn emit(&mut self, event: Event) -> Result<bool, SinkError> {
        match self.sink.send(event).await {
            Ok(()) => Ok(true),
            Err(SinkError::Closed) => Err(SinkError::Closed),
            Err(e) => {
                warn!(error = %e, "publishing event");
                Ok(false)
            }
        }
    }
}
