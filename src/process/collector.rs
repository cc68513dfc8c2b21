//! Snapshot collection: two-pass CPU sampling across the process table.
//!
//! The prime/wait/measure ordering is a timing protocol, not incidental
//! delay. A single CPU sample of a point-in-time counter reads as
//! accumulated-since-process-start; only the second sample, taken after the
//! sleep, reflects usage during the interval.

use crate::config::Config;
use crate::model::{round1, CollectionResult, ProcessSnapshot};
use crate::process::category::CategoryRules;
use crate::process::grouping::{expand_group, group_by_name};
use crate::process::priority::PriorityPolicy;
use crate::process::state::classify_state;
use crate::source::{MetricSource, ProcessHandle, SourceError};
use crate::system::build_statistics;
use std::thread;
use std::time::{Instant, SystemTime};
use tracing::debug;

/// Placeholder when a process name cannot be resolved.
pub const UNKNOWN_NAME: &str = "unknown";

/// Lowest PID considered killable; PIDs at or below this are reserved for
/// core OS processes.
const MIN_KILLABLE_PID: i32 = 5;

/// Assembles one snapshot from a handle during the measurement pass.
///
/// Any failure of the stat-backed reads drops the whole process: collection
/// is best-effort over a racing process table, and a snapshot is never
/// reported with partial data.
fn read_snapshot(
    handle: &mut dyn ProcessHandle,
    policy: PriorityPolicy,
    rules: &CategoryRules,
    now: SystemTime,
) -> Result<ProcessSnapshot, SourceError> {
    let pid = handle.pid();
    let parent_pid = handle.parent_pid()?;
    let rss_bytes = handle.rss_bytes()?;
    let thread_count = handle.thread_count()?;

    // Second CPU query; reflects usage since the priming pass.
    let cpu_percent = handle.cpu_percent()?;

    // These reads degrade instead of dropping the snapshot: an unqueryable
    // status classifies as Unknown, unreadable IO skips the idle downgrade,
    // unreadable niceness falls back to Normal, and an unreadable creation
    // time yields uptime 0.
    let raw_status = handle.raw_status().ok();
    let io = handle.io_counters().ok();
    let niceness = handle.niceness().ok();
    let create_time = handle.create_time().unwrap_or(now);

    let name = handle
        .name()
        .unwrap_or_else(|_| UNKNOWN_NAME.to_string());

    let state = classify_state(raw_status, cpu_percent, io);
    let priority_bucket = niceness
        .map(|n| policy.classify(n))
        .unwrap_or_else(|| policy.default_bucket());
    let category = rules.classify(&name);

    let uptime_seconds = now
        .duration_since(create_time)
        .unwrap_or_default()
        .as_secs();

    Ok(ProcessSnapshot {
        pid,
        parent_pid,
        name,
        state,
        memory_mb: round1(rss_bytes as f64 / 1_048_576.0),
        cpu_percent: round1(cpu_percent),
        thread_count: thread_count.max(1),
        priority_bucket,
        uptime_seconds,
        category,
        killable: pid >= MIN_KILLABLE_PID,
        is_group_representative: false,
        group_member_pids: None,
        group_total_memory_mb: None,
        group_total_cpu_percent: None,
        group_total_threads: None,
        group_label: None,
    })
}

/// Produces the full set of currently-alive, readable snapshots.
///
/// Ordering matters: enumerate once, prime the CPU counters (the returned
/// value of the first query is meaningless and discarded), sleep the
/// sampling interval, then measure. Handles that fail at any stage are
/// dropped silently.
pub fn collect_snapshots(
    source: &dyn MetricSource,
    config: &Config,
    rules: &CategoryRules,
    policy: PriorityPolicy,
) -> Result<Vec<ProcessSnapshot>, SourceError> {
    let mut handles = source.processes()?;

    // Priming pass: establish the per-handle CPU baseline.
    for handle in handles.iter_mut() {
        if let Err(e) = handle.cpu_percent() {
            debug!("cpu priming failed for pid {}: {}", handle.pid(), e);
        }
    }

    thread::sleep(config.sample_interval());

    // Measurement pass.
    let now = SystemTime::now();
    let mut snapshots = Vec::with_capacity(handles.len());
    for mut handle in handles {
        let pid = handle.pid();
        match read_snapshot(handle.as_mut(), policy, rules, now) {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(e) => debug!("dropping pid {} from collection: {}", pid, e),
        }
    }

    Ok(snapshots)
}

/// The collection operation: snapshots, grouped or expanded, plus host-wide
/// statistics.
///
/// Per-process read failures never surface to the caller; only a source-level
/// fault (the process table or performance counters entirely unavailable)
/// yields a `success: false` record, and that record is fully zeroed rather
/// than partial.
pub fn collect(
    source: &dyn MetricSource,
    config: &Config,
    rules: &CategoryRules,
    policy: PriorityPolicy,
    expand_target: Option<i32>,
) -> CollectionResult {
    let started = Instant::now();

    let snapshots = match collect_snapshots(source, config, rules, policy) {
        Ok(s) => s,
        Err(e) => return CollectionResult::failure(e.to_string()),
    };

    let listed = match expand_target {
        Some(target_pid) => expand_group(snapshots, target_pid),
        None => group_by_name(snapshots, config.max_results()),
    };

    let stats = match build_statistics(source, config, &listed) {
        Ok(s) => s,
        Err(e) => return CollectionResult::failure(e.to_string()),
    };

    let now = chrono::Local::now();
    CollectionResult {
        success: true,
        error: None,
        timestamp: now.timestamp(),
        datetime: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        execution_time_ms: (started.elapsed().as_secs_f64() * 100_000.0).round() / 100.0,
        processes: listed,
        stats,
    }
}
