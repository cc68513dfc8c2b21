//! Result records produced by the collection and termination operations.
//!
//! Everything here is created fresh per invocation and serialized by the
//! caller; nothing carries identity across calls.

use serde::Serialize;

/// Coarse OS-state classification of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProcState {
    Running,
    Waiting,
    Ready,
    Finished,
    Unknown,
}

/// Coarse scheduling-priority bucket.
///
/// The Windows policy uses RealTime/High/Normal/BelowNormal/Low; the POSIX
/// policy uses VeryHigh/High/Normal/Low/VeryLow. One enum covers both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PriorityBucket {
    RealTime,
    VeryHigh,
    High,
    Normal,
    BelowNormal,
    Low,
    VeryLow,
}

/// Functional category derived from the process name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    System,
    Browser,
    DevelopmentTool,
    Application,
}

/// One process observed at one instant.
///
/// The `group_*` fields are only populated when this snapshot stands as the
/// representative of a multi-member name group; they are omitted from the
/// serialized form otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessSnapshot {
    pub pid: i32,
    pub parent_pid: i32,
    pub name: String,
    pub state: ProcState,
    pub memory_mb: f64,
    pub cpu_percent: f64,
    pub thread_count: u32,
    pub priority_bucket: PriorityBucket,
    pub uptime_seconds: u64,
    pub category: Category,
    pub killable: bool,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_group_representative: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_member_pids: Option<Vec<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_total_memory_mb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_total_cpu_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_total_threads: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_label: Option<String>,
}

impl ProcessSnapshot {
    /// Effective memory for ordering: the group total when aggregated,
    /// otherwise the process's own resident memory.
    pub fn effective_memory_mb(&self) -> f64 {
        self.group_total_memory_mb.unwrap_or(self.memory_mb)
    }
}

/// Host-wide figures computed once per collection call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemStatistics {
    /// Count of all PIDs currently in the OS process table, independent of
    /// any grouping or truncation applied to the listed sequence.
    pub total_processes: usize,
    pub total_processes_listed: usize,
    pub running_count: usize,
    pub waiting_count: usize,
    pub memory_used_gb: f64,
    pub memory_total_gb: f64,
    pub memory_usage_percent: f64,
    pub cpu_percent: f64,
    pub cpu_per_core: Vec<f64>,
    pub cpu_count: usize,
}

/// The single value returned by a collection call.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: i64,
    pub datetime: String,
    pub execution_time_ms: f64,
    pub processes: Vec<ProcessSnapshot>,
    pub stats: SystemStatistics,
}

impl CollectionResult {
    /// Total-failure record: `success: false` with a descriptive message and
    /// empty/zeroed fields, never a partial structure.
    pub fn failure(message: impl Into<String>) -> Self {
        let now = chrono::Local::now();
        Self {
            success: false,
            error: Some(message.into()),
            timestamp: now.timestamp(),
            datetime: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            execution_time_ms: 0.0,
            processes: Vec::new(),
            stats: SystemStatistics::default(),
        }
    }
}

/// Machine-readable classification of a termination outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TerminationKind {
    /// The process was signaled and exited.
    Terminated,
    /// The PID was not in the process table, or the process exited on its
    /// own mid-flight. Reported as success: killing an already-gone process
    /// is not an error.
    AlreadyGone,
    /// The target matched the critical-process denylist and was left alive.
    Refused,
    /// The OS rejected the signal; elevated privileges are required.
    PermissionDenied,
    /// Malformed PID.
    Invalid,
    /// Unexpected fault (source unavailable, survived SIGKILL, ...).
    Fault,
}

/// The single value returned by a termination call.
#[derive(Debug, Clone, Serialize)]
pub struct TerminationResult {
    pub success: bool,
    pub kind: TerminationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub pid: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl TerminationResult {
    pub fn ok(kind: TerminationKind, pid: i32, name: Option<String>, message: String) -> Self {
        Self {
            success: true,
            kind,
            message: Some(message),
            error: None,
            pid,
            name,
        }
    }

    pub fn err(kind: TerminationKind, pid: i32, name: Option<String>, error: String) -> Self {
        Self {
            success: false,
            kind,
            message: None,
            error: Some(error),
            pid,
            name,
        }
    }
}

/// Rounds to one decimal place, the precision used for every figure the
/// caller displays (memory MB/GB, CPU percent).
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
