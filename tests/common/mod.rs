//! Scripted metric source shared by the integration tests.
//!
//! The mock implements the same traits the Linux /proc source implements, so
//! the collection pipeline and the termination controller run unmodified
//! against fully controlled process tables. Signal deliveries are recorded
//! so tests can assert exactly which signals were (or were not) sent.

// Not every test binary uses every helper.
#![allow(dead_code)]

use procsnap::source::{
    IoCounters, MemoryFigures, MetricSource, ProcessHandle, RawStatus, SourceError,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

/// One scripted process table entry.
#[derive(Debug, Clone)]
pub struct MockProcess {
    pub pid: i32,
    pub parent_pid: i32,
    pub name: String,
    pub status: RawStatus,
    pub rss_bytes: u64,
    /// CPU percent reported by the measurement pass (the priming pass
    /// always reports 0.0).
    pub cpu_percent: f64,
    pub thread_count: u32,
    pub niceness: i64,
    pub io: IoCounters,
    pub uptime_secs: u64,
    /// Whether a graceful terminate makes the process exit.
    pub dies_on_terminate: bool,
    /// Whether a forceful kill makes the process exit.
    pub dies_on_kill: bool,
    /// Signals are rejected with AccessDenied.
    pub deny_signal: bool,
    /// The process exits on its own the moment a signal is attempted,
    /// before delivery (simulates a race with natural exit).
    pub vanishes_before_signal: bool,
}

impl MockProcess {
    pub fn new(pid: i32, name: &str) -> Self {
        Self {
            pid,
            parent_pid: 1,
            name: name.to_string(),
            status: RawStatus::Sleeping,
            rss_bytes: 1_048_576,
            cpu_percent: 0.0,
            thread_count: 1,
            niceness: 0,
            io: IoCounters::default(),
            uptime_secs: 60,
            dies_on_terminate: true,
            dies_on_kill: true,
            deny_signal: false,
            vanishes_before_signal: false,
        }
    }

    pub fn with_memory_mb(mut self, mb: f64) -> Self {
        self.rss_bytes = (mb * 1_048_576.0) as u64;
        self
    }

    pub fn with_cpu(mut self, percent: f64) -> Self {
        self.cpu_percent = percent;
        self
    }

    pub fn with_status(mut self, status: RawStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_io(mut self, read_ops: u64, write_ops: u64) -> Self {
        self.io = IoCounters {
            read_ops,
            write_ops,
        };
        self
    }

    pub fn with_niceness(mut self, nice: i64) -> Self {
        self.niceness = nice;
        self
    }

    pub fn with_threads(mut self, threads: u32) -> Self {
        self.thread_count = threads;
        self
    }
}

struct MockHandle {
    spec: MockProcess,
    alive: Arc<Mutex<HashSet<i32>>>,
    signals: Arc<Mutex<Vec<String>>>,
    primed: bool,
}

impl MockHandle {
    fn is_alive(&self) -> bool {
        self.alive.lock().unwrap().contains(&self.spec.pid)
    }

    fn ensure_alive(&self) -> Result<(), SourceError> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(SourceError::NoSuchProcess(self.spec.pid))
        }
    }
}

impl ProcessHandle for MockHandle {
    fn pid(&self) -> i32 {
        self.spec.pid
    }

    fn name(&self) -> Result<String, SourceError> {
        self.ensure_alive()?;
        Ok(self.spec.name.clone())
    }

    fn raw_status(&self) -> Result<RawStatus, SourceError> {
        self.ensure_alive()?;
        Ok(self.spec.status)
    }

    fn rss_bytes(&self) -> Result<u64, SourceError> {
        self.ensure_alive()?;
        Ok(self.spec.rss_bytes)
    }

    fn cpu_percent(&mut self) -> Result<f64, SourceError> {
        self.ensure_alive()?;
        if self.primed {
            Ok(self.spec.cpu_percent)
        } else {
            self.primed = true;
            Ok(0.0)
        }
    }

    fn thread_count(&self) -> Result<u32, SourceError> {
        self.ensure_alive()?;
        Ok(self.spec.thread_count)
    }

    fn niceness(&self) -> Result<i64, SourceError> {
        self.ensure_alive()?;
        Ok(self.spec.niceness)
    }

    fn create_time(&self) -> Result<SystemTime, SourceError> {
        self.ensure_alive()?;
        Ok(SystemTime::now() - Duration::from_secs(self.spec.uptime_secs))
    }

    fn parent_pid(&self) -> Result<i32, SourceError> {
        self.ensure_alive()?;
        Ok(self.spec.parent_pid)
    }

    fn io_counters(&self) -> Result<IoCounters, SourceError> {
        self.ensure_alive()?;
        Ok(self.spec.io)
    }

    fn terminate(&self) -> Result<(), SourceError> {
        if self.spec.deny_signal {
            return Err(SourceError::AccessDenied(self.spec.pid));
        }
        if self.spec.vanishes_before_signal {
            self.alive.lock().unwrap().remove(&self.spec.pid);
            return Err(SourceError::NoSuchProcess(self.spec.pid));
        }
        self.ensure_alive()?;
        self.signals
            .lock()
            .unwrap()
            .push(format!("TERM {}", self.spec.pid));
        if self.spec.dies_on_terminate {
            self.alive.lock().unwrap().remove(&self.spec.pid);
        }
        Ok(())
    }

    fn kill(&self) -> Result<(), SourceError> {
        if self.spec.deny_signal {
            return Err(SourceError::AccessDenied(self.spec.pid));
        }
        self.ensure_alive()?;
        self.signals
            .lock()
            .unwrap()
            .push(format!("KILL {}", self.spec.pid));
        if self.spec.dies_on_kill {
            self.alive.lock().unwrap().remove(&self.spec.pid);
        }
        Ok(())
    }

    fn wait_exit(&self, _timeout: Duration) -> Result<bool, SourceError> {
        Ok(!self.is_alive())
    }
}

/// Scripted metric source.
pub struct MockSource {
    procs: Vec<MockProcess>,
    alive: Arc<Mutex<HashSet<i32>>>,
    signals: Arc<Mutex<Vec<String>>>,
    pub memory: MemoryFigures,
    pub system_cpu_percent: f64,
    pub per_core_percent: Vec<f64>,
    pub fail_enumeration: bool,
}

impl MockSource {
    pub fn new(procs: Vec<MockProcess>) -> Self {
        let alive: HashSet<i32> = procs.iter().map(|p| p.pid).collect();
        Self {
            procs,
            alive: Arc::new(Mutex::new(alive)),
            signals: Arc::new(Mutex::new(Vec::new())),
            memory: MemoryFigures {
                total_bytes: 8 << 30,
                available_bytes: 6 << 30,
                used_bytes: 2 << 30,
                percent: 25.0,
            },
            system_cpu_percent: 12.5,
            per_core_percent: vec![10.0, 15.0],
            fail_enumeration: false,
        }
    }

    /// Signals delivered so far, e.g. `["TERM 42", "KILL 42"]`.
    pub fn signals_sent(&self) -> Vec<String> {
        self.signals.lock().unwrap().clone()
    }

    /// Removes a PID from the scripted process table.
    pub fn reap(&self, pid: i32) {
        self.alive.lock().unwrap().remove(&pid);
    }

    fn handle_for(&self, spec: &MockProcess) -> Box<dyn ProcessHandle> {
        Box::new(MockHandle {
            spec: spec.clone(),
            alive: Arc::clone(&self.alive),
            signals: Arc::clone(&self.signals),
            primed: false,
        })
    }
}

impl MetricSource for MockSource {
    fn processes(&self) -> Result<Vec<Box<dyn ProcessHandle>>, SourceError> {
        if self.fail_enumeration {
            return Err(SourceError::Unavailable("process table unreachable".into()));
        }
        let alive = self.alive.lock().unwrap();
        Ok(self
            .procs
            .iter()
            .filter(|p| alive.contains(&p.pid))
            .map(|p| self.handle_for(p))
            .collect())
    }

    fn process(&self, pid: i32) -> Result<Box<dyn ProcessHandle>, SourceError> {
        if !self.pid_exists(pid) {
            return Err(SourceError::NoSuchProcess(pid));
        }
        self.procs
            .iter()
            .find(|p| p.pid == pid)
            .map(|p| self.handle_for(p))
            .ok_or(SourceError::NoSuchProcess(pid))
    }

    fn pid_exists(&self, pid: i32) -> bool {
        self.alive.lock().unwrap().contains(&pid)
    }

    fn pid_count(&self) -> Result<usize, SourceError> {
        Ok(self.alive.lock().unwrap().len())
    }

    fn memory(&self) -> Result<MemoryFigures, SourceError> {
        Ok(self.memory)
    }

    fn cpu_percent(&self, _interval: Duration) -> Result<f64, SourceError> {
        Ok(self.system_cpu_percent)
    }

    fn cpu_percent_per_core(&self, _interval: Duration) -> Result<Vec<f64>, SourceError> {
        Ok(self.per_core_percent.clone())
    }

    fn cpu_count(&self) -> usize {
        self.per_core_percent.len().max(1)
    }
}

/// Config with a millisecond sampling interval so tests stay fast.
pub fn fast_config() -> procsnap::Config {
    procsnap::Config {
        sample_interval_ms: Some(1),
        system_cpu_interval_ms: Some(1),
        per_core_interval_ms: Some(1),
        ..Default::default()
    }
}
