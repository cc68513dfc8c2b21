//! Linux metric source backed by the /proc filesystem.
//!
//! This module implements [`MetricSource`] and [`ProcessHandle`] by parsing
//! `/proc/<pid>/{stat,comm,cmdline,io}`, `/proc/meminfo` and `/proc/stat`.
//! The proc root is configurable so parser tests can run against a fake tree.

use super::{IoCounters, MemoryFigures, MetricSource, ProcessHandle, RawStatus, SourceError};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use once_cell::sync::Lazy;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Poll step for liveness waits during termination.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Get system clock ticks per second (usually 100, but can vary).
fn get_clk_tck() -> f64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_CLK_TCK
        // Returns -1 on error, 0 if undefined - both are handled by the > 0 check
        unsafe {
            let tck = libc::sysconf(libc::_SC_CLK_TCK);
            if tck > 0 {
                return tck as f64;
            }
        }
    }
    // Fallback to common default for error cases or non-Unix platforms
    100.0
}

/// System clock ticks per second (for CPU time calculation).
pub static CLK_TCK: Lazy<f64> = Lazy::new(get_clk_tck);

/// System page size in bytes (for RSS calculation from stat pages).
pub static PAGE_SIZE: Lazy<u64> = Lazy::new(|| {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_PAGESIZE
        unsafe {
            let sz = libc::sysconf(libc::_SC_PAGESIZE);
            if sz > 0 {
                return sz as u64;
            }
        }
    }
    4096
});

/// Parsed fields of /proc/<pid>/stat that the snapshot pipeline consumes.
#[derive(Debug, Clone, Copy)]
pub struct ProcStat {
    pub state: char,
    pub ppid: i32,
    pub utime_ticks: u64,
    pub stime_ticks: u64,
    pub nice: i64,
    pub num_threads: u32,
    pub starttime_ticks: u64,
    pub rss_pages: u64,
}

/// Parses /proc/<pid>/stat content.
///
/// The comm field is enclosed in parentheses and may itself contain spaces
/// and parentheses, so the split starts after the *last* closing paren.
pub fn parse_proc_stat(content: &str) -> Result<ProcStat, SourceError> {
    let comm_end = content
        .rfind(')')
        .ok_or_else(|| SourceError::Io(std::io::Error::other("stat missing comm field")))?;
    let rest = content[comm_end + 1..].trim_start();
    let fields: Vec<&str> = rest.split_whitespace().collect();
    if fields.len() < 22 {
        return Err(SourceError::Io(std::io::Error::other(
            "stat has too few fields",
        )));
    }

    Ok(ProcStat {
        state: fields[0].chars().next().unwrap_or('?'),
        ppid: fields[1].parse().unwrap_or(0),
        utime_ticks: fields[11].parse().unwrap_or(0),
        stime_ticks: fields[12].parse().unwrap_or(0),
        nice: fields[16].parse().unwrap_or(0),
        num_threads: fields[17].parse().unwrap_or(1),
        starttime_ticks: fields[19].parse().unwrap_or(0),
        rss_pages: fields[21].parse().unwrap_or(0),
    })
}

/// Reads process name from comm file or extracts it from cmdline.
pub fn read_process_name(proc_path: &Path) -> Option<String> {
    let comm = proc_path.join("comm");
    if let Ok(s) = fs::read_to_string(&comm) {
        let t = s.trim();
        if !t.is_empty() {
            return Some(t.into());
        }
    }

    let cmd = proc_path.join("cmdline");
    if let Ok(content) = fs::read(&cmd) {
        if !content.is_empty() {
            let parts: Vec<&str> = content
                .split(|&b| b == 0u8)
                .filter_map(|s| std::str::from_utf8(s).ok())
                .collect();
            if !parts.is_empty() {
                if let Some(name) = Path::new(parts[0]).file_name() {
                    return name.to_str().map(|s| s.to_string());
                }
            }
        }
    }
    None
}

/// Parses cumulative IO syscall counts from /proc/<pid>/io content.
pub fn parse_io_counters(content: &str) -> IoCounters {
    let mut io = IoCounters::default();
    for line in content.lines() {
        if let Some(val) = line.strip_prefix("syscr:") {
            io.read_ops = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("syscw:") {
            io.write_ops = val.trim().parse().unwrap_or(0);
        }
    }
    io
}

/// Reads system boot time (btime, seconds since epoch) from a /proc/stat file.
fn read_boot_time(proc_root: &Path) -> u64 {
    let content = fs::read_to_string(proc_root.join("stat")).unwrap_or_default();
    for line in content.lines() {
        if let Some(value_str) = line.strip_prefix("btime ") {
            return value_str.trim().parse().unwrap_or(0);
        }
    }
    0
}

/// Aggregate or per-core CPU time sample from one /proc/stat cpu row.
#[derive(Debug, Clone, Copy, Default)]
struct CpuTimes {
    total: u64,
    idle: u64,
}

/// Parses the cpu rows of /proc/stat content.
///
/// Returns (aggregate, per-core ordered by core index). Non-active time is
/// idle + iowait, matching the usage-ratio convention for "current load".
fn parse_cpu_times(content: &str) -> (CpuTimes, Vec<CpuTimes>) {
    let mut aggregate = CpuTimes::default();
    let mut cores: Vec<(usize, CpuTimes)> = Vec::new();

    for line in content.lines() {
        if !line.starts_with("cpu") {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 5 {
            continue;
        }
        let values: Vec<u64> = parts[1..]
            .iter()
            .filter_map(|s| s.parse::<u64>().ok())
            .collect();
        let total: u64 = values.iter().sum();
        let idle = values.get(3).copied().unwrap_or(0) + values.get(4).copied().unwrap_or(0);
        let times = CpuTimes { total, idle };

        if parts[0] == "cpu" {
            aggregate = times;
        } else if let Ok(index) = parts[0][3..].parse::<usize>() {
            cores.push((index, times));
        }
    }

    cores.sort_by_key(|(index, _)| *index);
    (aggregate, cores.into_iter().map(|(_, t)| t).collect())
}

fn usage_percent(prev: CpuTimes, curr: CpuTimes) -> f64 {
    let delta_total = curr.total.saturating_sub(prev.total);
    if delta_total == 0 {
        return 0.0;
    }
    let delta_idle = curr.idle.saturating_sub(prev.idle);
    (delta_total - delta_idle.min(delta_total)) as f64 / delta_total as f64 * 100.0
}

/// Maps a per-process filesystem error to the source error taxonomy.
fn map_proc_io(pid: i32, e: std::io::Error) -> SourceError {
    match e.kind() {
        std::io::ErrorKind::NotFound => SourceError::NoSuchProcess(pid),
        std::io::ErrorKind::PermissionDenied => SourceError::AccessDenied(pid),
        _ => SourceError::Io(e),
    }
}

fn map_signal_errno(pid: i32, errno: nix::errno::Errno) -> SourceError {
    match errno {
        nix::errno::Errno::ESRCH => SourceError::NoSuchProcess(pid),
        nix::errno::Errno::EPERM => SourceError::AccessDenied(pid),
        e => SourceError::Io(std::io::Error::from_raw_os_error(e as i32)),
    }
}

/// Handle on one live process under a proc root.
pub struct ProcfsHandle {
    pid: i32,
    proc_path: PathBuf,
    boot_time: u64,
    last_cpu_sample: Option<(f64, Instant)>,
}

impl ProcfsHandle {
    fn new(pid: i32, proc_path: PathBuf, boot_time: u64) -> Self {
        Self {
            pid,
            proc_path,
            boot_time,
            last_cpu_sample: None,
        }
    }

    fn stat(&self) -> Result<ProcStat, SourceError> {
        let content = fs::read_to_string(self.proc_path.join("stat"))
            .map_err(|e| map_proc_io(self.pid, e))?;
        parse_proc_stat(&content)
    }

    fn cpu_time_seconds(&self) -> Result<f64, SourceError> {
        let stat = self.stat()?;
        Ok((stat.utime_ticks + stat.stime_ticks) as f64 / *CLK_TCK)
    }

    /// Whether the process still occupies a runnable process-table slot.
    /// A zombie or dead entry counts as exited for termination purposes.
    fn is_gone(&self) -> bool {
        match self.stat() {
            Ok(stat) => matches!(
                RawStatus::from_proc_char(stat.state),
                RawStatus::Zombie | RawStatus::Dead
            ),
            Err(_) => true,
        }
    }
}

impl ProcessHandle for ProcfsHandle {
    fn pid(&self) -> i32 {
        self.pid
    }

    fn name(&self) -> Result<String, SourceError> {
        read_process_name(&self.proc_path).ok_or(SourceError::NoSuchProcess(self.pid))
    }

    fn raw_status(&self) -> Result<RawStatus, SourceError> {
        Ok(RawStatus::from_proc_char(self.stat()?.state))
    }

    fn rss_bytes(&self) -> Result<u64, SourceError> {
        Ok(self.stat()?.rss_pages * *PAGE_SIZE)
    }

    fn cpu_percent(&mut self) -> Result<f64, SourceError> {
        let now = Instant::now();
        let cpu_seconds = self.cpu_time_seconds()?;

        let percent = match self.last_cpu_sample {
            Some((prev_seconds, prev_at)) => {
                let dt = now.duration_since(prev_at).as_secs_f64();
                let delta = cpu_seconds - prev_seconds;
                if dt > 0.0 && delta > 0.0 {
                    (delta / dt) * 100.0
                } else {
                    0.0
                }
            }
            // First sample establishes the baseline only.
            None => 0.0,
        };

        self.last_cpu_sample = Some((cpu_seconds, now));
        Ok(percent)
    }

    fn thread_count(&self) -> Result<u32, SourceError> {
        Ok(self.stat()?.num_threads.max(1))
    }

    fn niceness(&self) -> Result<i64, SourceError> {
        Ok(self.stat()?.nice)
    }

    fn create_time(&self) -> Result<SystemTime, SourceError> {
        let stat = self.stat()?;
        let since_boot = stat.starttime_ticks as f64 / *CLK_TCK;
        Ok(UNIX_EPOCH + Duration::from_secs_f64(self.boot_time as f64 + since_boot))
    }

    fn parent_pid(&self) -> Result<i32, SourceError> {
        Ok(self.stat()?.ppid)
    }

    fn io_counters(&self) -> Result<IoCounters, SourceError> {
        let content = fs::read_to_string(self.proc_path.join("io"))
            .map_err(|e| map_proc_io(self.pid, e))?;
        Ok(parse_io_counters(&content))
    }

    fn terminate(&self) -> Result<(), SourceError> {
        kill(Pid::from_raw(self.pid), Signal::SIGTERM)
            .map_err(|errno| map_signal_errno(self.pid, errno))
    }

    fn kill(&self) -> Result<(), SourceError> {
        kill(Pid::from_raw(self.pid), Signal::SIGKILL)
            .map_err(|errno| map_signal_errno(self.pid, errno))
    }

    fn wait_exit(&self, timeout: Duration) -> Result<bool, SourceError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_gone() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            thread::sleep(WAIT_POLL_INTERVAL);
        }
    }
}

/// Metric source over a /proc mount.
pub struct ProcfsSource {
    root: PathBuf,
    boot_time: u64,
}

impl ProcfsSource {
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    /// Source over an alternate proc root, for tests.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let boot_time = read_boot_time(&root);
        Self { root, boot_time }
    }

    /// Scans the proc root for numeric PID entries.
    fn scan_pids(&self) -> Result<Vec<i32>, SourceError> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| SourceError::Unavailable(format!("cannot read {:?}: {}", self.root, e)))?;

        let mut pids = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = match name.to_str() {
                Some(v) => v,
                None => continue,
            };
            if !name.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            if let Ok(pid) = name.parse::<i32>() {
                pids.push(pid);
            }
        }
        Ok(pids)
    }
}

impl Default for ProcfsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSource for ProcfsSource {
    fn processes(&self) -> Result<Vec<Box<dyn ProcessHandle>>, SourceError> {
        let pids = self.scan_pids()?;
        let mut handles: Vec<Box<dyn ProcessHandle>> = Vec::with_capacity(pids.len());
        for pid in pids {
            let proc_path = self.root.join(pid.to_string());
            // Skip anything that vanished between scan and open.
            if !proc_path.join("stat").exists() {
                debug!("pid {} vanished during enumeration", pid);
                continue;
            }
            handles.push(Box::new(ProcfsHandle::new(pid, proc_path, self.boot_time)));
        }
        Ok(handles)
    }

    fn process(&self, pid: i32) -> Result<Box<dyn ProcessHandle>, SourceError> {
        let proc_path = self.root.join(pid.to_string());
        if !proc_path.exists() {
            return Err(SourceError::NoSuchProcess(pid));
        }
        Ok(Box::new(ProcfsHandle::new(pid, proc_path, self.boot_time)))
    }

    fn pid_exists(&self, pid: i32) -> bool {
        self.root.join(pid.to_string()).exists()
    }

    fn pid_count(&self) -> Result<usize, SourceError> {
        Ok(self.scan_pids()?.len())
    }

    fn memory(&self) -> Result<MemoryFigures, SourceError> {
        let content = fs::read_to_string(self.root.join("meminfo"))
            .map_err(|e| SourceError::Unavailable(format!("cannot read meminfo: {}", e)))?;

        let mut total_bytes: Option<u64> = None;
        let mut available_bytes: Option<u64> = None;

        for line in content.lines() {
            let (target, rest) = if let Some(rest) = line.strip_prefix("MemTotal:") {
                (&mut total_bytes, rest)
            } else if let Some(rest) = line.strip_prefix("MemAvailable:") {
                (&mut available_bytes, rest)
            } else {
                continue;
            };
            if let Some(kb) = rest.split_whitespace().next() {
                if let Ok(kb) = kb.parse::<u64>() {
                    *target = Some(kb * 1024);
                }
            }
            if total_bytes.is_some() && available_bytes.is_some() {
                break;
            }
        }

        match (total_bytes, available_bytes) {
            (Some(total), Some(available)) => {
                let used = total.saturating_sub(available);
                let percent = if total > 0 {
                    used as f64 / total as f64 * 100.0
                } else {
                    0.0
                };
                Ok(MemoryFigures {
                    total_bytes: total,
                    available_bytes: available,
                    used_bytes: used,
                    percent,
                })
            }
            _ => Err(SourceError::Unavailable(
                "failed to parse required fields from meminfo".into(),
            )),
        }
    }

    fn cpu_percent(&self, interval: Duration) -> Result<f64, SourceError> {
        let stat_path = self.root.join("stat");
        let before = fs::read_to_string(&stat_path)
            .map_err(|e| SourceError::Unavailable(format!("cannot read stat: {}", e)))?;
        thread::sleep(interval);
        let after = fs::read_to_string(&stat_path)
            .map_err(|e| SourceError::Unavailable(format!("cannot read stat: {}", e)))?;

        let (prev, _) = parse_cpu_times(&before);
        let (curr, _) = parse_cpu_times(&after);
        Ok(usage_percent(prev, curr))
    }

    fn cpu_percent_per_core(&self, interval: Duration) -> Result<Vec<f64>, SourceError> {
        let stat_path = self.root.join("stat");
        let before = fs::read_to_string(&stat_path)
            .map_err(|e| SourceError::Unavailable(format!("cannot read stat: {}", e)))?;
        thread::sleep(interval);
        let after = fs::read_to_string(&stat_path)
            .map_err(|e| SourceError::Unavailable(format!("cannot read stat: {}", e)))?;

        let (_, prev_cores) = parse_cpu_times(&before);
        let (_, curr_cores) = parse_cpu_times(&after);
        Ok(prev_cores
            .into_iter()
            .zip(curr_cores)
            .map(|(prev, curr)| usage_percent(prev, curr))
            .collect())
    }

    fn cpu_count(&self) -> usize {
        #[cfg(unix)]
        {
            // SAFETY: sysconf is safe to call with _SC_NPROCESSORS_ONLN
            unsafe {
                let n = libc::sysconf(libc::_SC_NPROCESSORS_ONLN);
                if n > 0 {
                    return n as usize;
                }
            }
        }
        1
    }
}
