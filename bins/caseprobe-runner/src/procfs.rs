//! Process Accounting Reader
//!
//! **Responsibility:**
//! Read the process's own accounting records from procfs:
//! - `stat`: cumulative user/system scheduler ticks (fields 14 and 15, 1-indexed)
//! - `status`: peak resident set size, the `VmHWM` line (kB)
//!
//! Accounting is best-effort telemetry. A missing or malformed record reads
//! as zero and is never reported as an error.
//!
//! Ticks are not converted to seconds here; consumers divide by
//! [`clock_ticks_per_second`] if they need to.

use caseprobe_common::types::CpuTicks;
use std::fs;
use std::path::{Path, PathBuf};

/// 1-indexed position of `utime` in the stat record; `stime` follows it
const STAT_UTIME_FIELD: usize = 14;
const PEAK_MEMORY_LABEL: &str = "VmHWM:";

/// Source of per-process resource counters
pub trait MetricsSource: Send + Sync {
    /// Cumulative ticks since process start, `(0, 0)` when unavailable
    fn cpu_ticks(&self) -> CpuTicks;

    /// Peak resident set (kB) since process start, `0` when unavailable
    fn peak_memory(&self) -> u64;
}

/// procfs-backed [`MetricsSource`]
#[derive(Debug, Clone)]
pub struct ProcfsReader {
    stat_path: PathBuf,
    status_path: PathBuf,
}

impl ProcfsReader {
    /// Reader for the calling process (`/proc/self`)
    pub fn current_process() -> Self {
        Self::with_root("/proc/self")
    }

    /// Reader for any directory laid out like `/proc/<pid>`
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            stat_path: root.join("stat"),
            status_path: root.join("status"),
        }
    }
}

impl Default for ProcfsReader {
    fn default() -> Self {
        Self::current_process()
    }
}

impl MetricsSource for ProcfsReader {
    fn cpu_ticks(&self) -> CpuTicks {
        fs::read_to_string(&self.stat_path)
            .ok()
            .and_then(|content| parse_cpu_ticks(&content))
            .unwrap_or_default()
    }

    fn peak_memory(&self) -> u64 {
        fs::read_to_string(&self.status_path)
            .ok()
            .and_then(|content| parse_peak_memory(&content))
            .unwrap_or(0)
    }
}

/// Extract `(utime, stime)` from a stat record.
///
/// The command name (field 2) is parenthesised and may itself contain
/// whitespace, so counting restarts after the last `)` when there is one.
pub fn parse_cpu_ticks(stat: &str) -> Option<CpuTicks> {
    let (rest, first_field) = match stat.rfind(')') {
        Some(end) => (&stat[end + 1..], 3),
        None => (stat, 1),
    };

    let mut fields = rest.split_whitespace();
    let utime = fields.nth(STAT_UTIME_FIELD - first_field)?.parse().ok()?;
    let stime = fields.next()?.parse().ok()?;
    Some(CpuTicks::new(utime, stime))
}

/// Extract the `VmHWM` value from a status record
pub fn parse_peak_memory(status: &str) -> Option<u64> {
    status
        .lines()
        .find_map(|line| line.strip_prefix(PEAK_MEMORY_LABEL))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|value| value.parse().ok())
}

/// Scheduler clock ticks per second, if the platform reports it
pub fn clock_ticks_per_second() -> Option<u64> {
    // SAFETY: sysconf only reads a configuration value.
    let hz = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    (hz > 0).then_some(hz as u64)
}
