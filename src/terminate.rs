//! Safe process termination: a graceful-then-forced kill sequence guarded by
//! a denylist of critical system processes.
//!
//! Termination is idempotent: a PID that is already gone, either before the
//! request or because the target exited on its own mid-flight, reports
//! success rather than failure.

use crate::config::Config;
use crate::model::{TerminationKind, TerminationResult};
use crate::process::category::CategoryRules;
use crate::source::{MetricSource, ProcessHandle, SourceError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Internal failure classification; mapped onto [`TerminationResult`] at the
/// controller boundary.
#[derive(Debug, Error)]
enum TerminateError {
    #[error("access denied for PID {0}. Run with elevated privileges")]
    PermissionDenied(i32),

    #[error("{0}")]
    Fault(String),
}

/// Outcome of one signal-and-wait stage.
enum StageOutcome {
    Exited,
    StillAlive,
    /// The process vanished between steps (race with natural exit).
    Vanished,
}

fn signal_and_wait(
    handle: &dyn ProcessHandle,
    forceful: bool,
    config: &Config,
) -> Result<StageOutcome, TerminateError> {
    let pid = handle.pid();
    let sent = if forceful {
        handle.kill()
    } else {
        handle.terminate()
    };

    match sent {
        Ok(()) => {}
        Err(SourceError::NoSuchProcess(_)) => return Ok(StageOutcome::Vanished),
        Err(SourceError::AccessDenied(_)) => return Err(TerminateError::PermissionDenied(pid)),
        Err(e) => return Err(TerminateError::Fault(e.to_string())),
    }

    match handle.wait_exit(config.kill_timeout()) {
        Ok(true) => Ok(StageOutcome::Exited),
        Ok(false) => Ok(StageOutcome::StillAlive),
        Err(SourceError::NoSuchProcess(_)) => Ok(StageOutcome::Vanished),
        Err(e) => Err(TerminateError::Fault(e.to_string())),
    }
}

/// The termination operation.
///
/// Sequence: validate the PID, report success for an already-absent target,
/// refuse critical system processes, request graceful termination and wait,
/// then escalate once to forceful termination and wait again. Insufficient
/// OS permission stops the sequence immediately; no further escalation is
/// attempted.
pub fn terminate(
    source: &dyn MetricSource,
    rules: &CategoryRules,
    config: &Config,
    pid: i32,
) -> TerminationResult {
    if pid <= 0 {
        return TerminationResult::err(
            TerminationKind::Invalid,
            pid,
            None,
            "PID must be a positive integer".into(),
        );
    }

    if !source.pid_exists(pid) {
        return TerminationResult::ok(
            TerminationKind::AlreadyGone,
            pid,
            None,
            format!("Process with PID {} does not exist; nothing to do", pid),
        );
    }

    let handle = match source.process(pid) {
        Ok(h) => h,
        Err(SourceError::NoSuchProcess(_)) => {
            return TerminationResult::ok(
                TerminationKind::AlreadyGone,
                pid,
                None,
                format!("Process with PID {} already finished", pid),
            );
        }
        Err(SourceError::AccessDenied(_)) => {
            return TerminationResult::err(
                TerminationKind::PermissionDenied,
                pid,
                None,
                format!("Access denied for PID {}. Run with elevated privileges", pid),
            );
        }
        Err(e) => {
            return TerminationResult::err(TerminationKind::Fault, pid, None, e.to_string());
        }
    };

    let name = match handle.name() {
        Ok(n) => n,
        Err(SourceError::NoSuchProcess(_)) => {
            return TerminationResult::ok(
                TerminationKind::AlreadyGone,
                pid,
                None,
                format!("Process with PID {} already finished", pid),
            );
        }
        Err(SourceError::AccessDenied(_)) => {
            return TerminationResult::err(
                TerminationKind::PermissionDenied,
                pid,
                None,
                format!("Access denied for PID {}. Run with elevated privileges", pid),
            );
        }
        Err(e) => {
            return TerminationResult::err(TerminationKind::Fault, pid, None, e.to_string());
        }
    };

    // Denylist check happens before any signal is sent; a critical process
    // is left untouched.
    if rules.is_critical(&name) {
        warn!("refusing to terminate critical system process {} ({})", name, pid);
        return TerminationResult::err(
            TerminationKind::Refused,
            pid,
            Some(name.clone()),
            format!("Cannot terminate critical system process: {}", name),
        );
    }

    debug!("sending graceful termination to {} ({})", name, pid);
    let outcome = match signal_and_wait(handle.as_ref(), false, config) {
        Ok(StageOutcome::StillAlive) => {
            // Escalate once.
            info!(
                "{} ({}) still alive after graceful termination, escalating",
                name, pid
            );
            signal_and_wait(handle.as_ref(), true, config)
        }
        other => other,
    };

    match outcome {
        Ok(StageOutcome::Exited) => TerminationResult::ok(
            TerminationKind::Terminated,
            pid,
            Some(name.clone()),
            format!("Process {} (PID: {}) terminated successfully", name, pid),
        ),
        Ok(StageOutcome::Vanished) => TerminationResult::ok(
            TerminationKind::AlreadyGone,
            pid,
            Some(name.clone()),
            format!("Process {} (PID: {}) already finished", name, pid),
        ),
        Ok(StageOutcome::StillAlive) => TerminationResult::err(
            TerminationKind::Fault,
            pid,
            Some(name.clone()),
            format!(
                "Process {} (PID: {}) did not exit after forced termination",
                name, pid
            ),
        ),
        Err(TerminateError::PermissionDenied(_)) => TerminationResult::err(
            TerminationKind::PermissionDenied,
            pid,
            Some(name.clone()),
            format!("Access denied for PID {}. Run with elevated privileges", pid),
        ),
        Err(TerminateError::Fault(msg)) => {
            TerminationResult::err(TerminationKind::Fault, pid, Some(name), msg)
        }
    }
}
