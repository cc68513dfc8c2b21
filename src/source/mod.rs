//! The metric source capability: the OS process table and performance
//! counters behind a trait seam.
//!
//! The collector and the termination controller only ever talk to
//! [`MetricSource`] and [`ProcessHandle`], so tests can drive them with a
//! scripted source instead of a live /proc.

pub mod procfs;

use std::time::{Duration, SystemTime};
use thiserror::Error;

pub use procfs::ProcfsSource;

/// Why a per-process read or signal failed.
///
/// Per-process variants are recovered locally during collection (the process
/// is dropped from the result); `Unavailable` means the source itself cannot
/// be queried and fails the whole call.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no such process: {0}")]
    NoSuchProcess(i32),

    #[error("access denied for pid {0}")]
    AccessDenied(i32),

    #[error("pid {0} is a zombie")]
    ZombieProcess(i32),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metric source unavailable: {0}")]
    Unavailable(String),
}

/// Raw OS process status, before coarse-state classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawStatus {
    Running,
    Sleeping,
    DiskSleep,
    Stopped,
    TracingStop,
    Zombie,
    Dead,
    Idle,
    Locked,
    Waiting,
    Waking,
    Parked,
    Unknown,
}

impl RawStatus {
    /// Maps a /proc/<pid>/stat state letter.
    pub fn from_proc_char(c: char) -> Self {
        match c {
            'R' => RawStatus::Running,
            'S' => RawStatus::Sleeping,
            'D' => RawStatus::DiskSleep,
            'T' => RawStatus::Stopped,
            't' => RawStatus::TracingStop,
            'Z' => RawStatus::Zombie,
            'X' | 'x' => RawStatus::Dead,
            'I' => RawStatus::Idle,
            'L' => RawStatus::Locked,
            'W' => RawStatus::Waking,
            'P' => RawStatus::Parked,
            _ => RawStatus::Unknown,
        }
    }
}

/// Cumulative IO operation counts for one process.
#[derive(Debug, Clone, Copy, Default)]
pub struct IoCounters {
    pub read_ops: u64,
    pub write_ops: u64,
}

/// System-wide memory figures.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryFigures {
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub used_bytes: u64,
    pub percent: f64,
}

/// A handle on one live process.
///
/// `cpu_percent` is stateful: the first call establishes a baseline and
/// returns 0.0; later calls return the usage rate over the elapsed interval.
/// Handles are owned by exactly one caller and discarded after use.
pub trait ProcessHandle {
    fn pid(&self) -> i32;
    fn name(&self) -> Result<String, SourceError>;
    fn raw_status(&self) -> Result<RawStatus, SourceError>;
    fn rss_bytes(&self) -> Result<u64, SourceError>;
    fn cpu_percent(&mut self) -> Result<f64, SourceError>;
    fn thread_count(&self) -> Result<u32, SourceError>;
    fn niceness(&self) -> Result<i64, SourceError>;
    fn create_time(&self) -> Result<SystemTime, SourceError>;
    fn parent_pid(&self) -> Result<i32, SourceError>;
    fn io_counters(&self) -> Result<IoCounters, SourceError>;

    /// Cooperative exit request (SIGTERM-class) the target may ignore.
    fn terminate(&self) -> Result<(), SourceError>;

    /// Unconditional OS-enforced termination (SIGKILL-class).
    fn kill(&self) -> Result<(), SourceError>;

    /// Waits up to `timeout` for the process to exit. Returns `true` if it
    /// exited within the window, `false` if it is still alive.
    fn wait_exit(&self, timeout: Duration) -> Result<bool, SourceError>;
}

/// The OS process table and performance counters.
pub trait MetricSource {
    /// One handle per currently-alive, enumerable process. PIDs that vanish
    /// or are inaccessible during enumeration are silently skipped.
    fn processes(&self) -> Result<Vec<Box<dyn ProcessHandle>>, SourceError>;

    fn process(&self, pid: i32) -> Result<Box<dyn ProcessHandle>, SourceError>;

    fn pid_exists(&self, pid: i32) -> bool;

    /// Count of all PIDs in the process table right now.
    fn pid_count(&self) -> Result<usize, SourceError>;

    fn memory(&self) -> Result<MemoryFigures, SourceError>;

    /// System-wide CPU percent sampled over `interval` (blocking).
    fn cpu_percent(&self, interval: Duration) -> Result<f64, SourceError>;

    /// Per-core CPU percent breakdown sampled over `interval` (blocking).
    fn cpu_percent_per_core(&self, interval: Duration) -> Result<Vec<f64>, SourceError>;

    fn cpu_count(&self) -> usize;
}
