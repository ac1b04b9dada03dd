use std::io;
use std::sync::OnceLock;

use crate::error::ProviderError;
use crate::system::snapshot::{CpuTimes, LoadStats, ProcCpuTimes};

use super::PlatformExtensions;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn cpu_times() -> Result<CpuTimes, ProviderError> {
        let contents =
            std::fs::read_to_string("/proc/stat").map_err(|source| ProviderError::Io {
                what: "/proc/stat",
                source,
            })?;
        parse_cpu_line(&contents)
    }

    fn load_stats() -> Option<LoadStats> {
        let contents = std::fs::read_to_string("/proc/loadavg").ok()?;
        parse_loadavg(&contents)
    }

    fn process_cpu_times(pid: u32) -> Result<ProcCpuTimes, ProviderError> {
        let path = format!("/proc/{pid}/stat");
        let contents = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound
                || source.raw_os_error() == Some(libc::ESRCH)
            {
                ProviderError::ProcessGone(pid)
            } else {
                ProviderError::Io {
                    what: "/proc/<pid>/stat",
                    source,
                }
            }
        })?;
        let (utime, stime) = parse_pid_stat_times(&contents)
            .ok_or_else(|| ProviderError::parse("/proc/<pid>/stat", "missing utime/stime"))?;
        let hz = clock_ticks_per_second();
        Ok(ProcCpuTimes {
            user: ticks_to_ms(utime, hz),
            system: ticks_to_ms(stime, hz),
        })
    }
}

fn clock_ticks_per_second() -> u64 {
    static HZ: OnceLock<u64> = OnceLock::new();
    *HZ.get_or_init(|| {
        // SAFETY: sysconf has no preconditions and only reads a constant.
        let hz = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        if hz > 0 { hz as u64 } else { 100 }
    })
}

fn ticks_to_ms(ticks: u64, hz: u64) -> u64 {
    ticks.saturating_mul(1000) / hz.max(1)
}

/// Parse the aggregate `cpu ` line. Kernels older than 2.6.11 omit `steal`.
fn parse_cpu_line(contents: &str) -> Result<CpuTimes, ProviderError> {
    let line = contents
        .lines()
        .find(|l| l.starts_with("cpu "))
        .ok_or_else(|| ProviderError::parse("/proc/stat", "no aggregate cpu line"))?;

    let fields = line
        .split_whitespace()
        .skip(1)
        .take(8)
        .map(|v| {
            v.parse::<u64>()
                .map_err(|e| ProviderError::parse("/proc/stat", format!("{v:?}: {e}")))
        })
        .collect::<Result<Vec<u64>, _>>()?;
    if fields.len() < 4 {
        return Err(ProviderError::parse(
            "/proc/stat",
            format!("expected at least 4 cpu fields, got {}", fields.len()),
        ));
    }
    let field = |i: usize| fields.get(i).copied().unwrap_or(0);

    Ok(CpuTimes {
        user: field(0),
        nice: field(1),
        system: field(2),
        idle: field(3),
        iowait: field(4),
        irq: field(5),
        softirq: field(6),
        steal: field(7),
    })
}

/// `/proc/loadavg`: "0.20 0.18 0.12 1/80 11206"
fn parse_loadavg(contents: &str) -> Option<LoadStats> {
    let mut parts = contents.split_whitespace();
    let load1 = parts.next()?.parse().ok()?;
    let load5 = parts.next()?.parse().ok()?;
    let load15 = parts.next()?.parse().ok()?;
    let (running, total) = parts.next()?.split_once('/')?;
    Some(LoadStats {
        load1,
        load5,
        load15,
        procs_running: running.parse().ok()?,
        procs_total: total.parse().ok()?,
    })
}

/// Extract utime and stime (in ticks) from `/proc/<pid>/stat`.
fn parse_pid_stat_times(contents: &str) -> Option<(u64, u64)> {
    // comm field may contain spaces and parens, so find the closing )
    let after_comm = contents.rfind(')')? + 1;
    let fields: Vec<&str> = contents[after_comm..].split_whitespace().collect();
    // Fields after comm: state(0) ppid(1) pgrp(2) session(3) tty_nr(4)
    // tpgid(5) flags(6) minflt(7) cminflt(8) majflt(9) cmajflt(10)
    // utime(11) stime(12)
    let utime = fields.get(11)?.parse().ok()?;
    let stime = fields.get(12)?.parse().ok()?;
    Some((utime, stime))
}
