//! Coarse state classification from raw OS process status.

use crate::model::ProcState;
use crate::source::{IoCounters, RawStatus};

/// Direct table lookup from raw status to coarse state.
///
/// Unrecognized statuses map to Ready as a conservative default.
pub fn map_raw_status(status: RawStatus) -> ProcState {
    match status {
        RawStatus::Running => ProcState::Running,
        RawStatus::Sleeping
        | RawStatus::DiskSleep
        | RawStatus::Locked
        | RawStatus::Waiting => ProcState::Waiting,
        RawStatus::Stopped | RawStatus::TracingStop | RawStatus::Zombie | RawStatus::Dead => {
            ProcState::Finished
        }
        RawStatus::Idle => ProcState::Ready,
        RawStatus::Waking | RawStatus::Parked | RawStatus::Unknown => ProcState::Ready,
    }
}

/// Classifies a process state from its raw status plus a CPU/IO heuristic.
///
/// A process reported as Running but with exactly 0.0 instantaneous CPU and
/// zero read and write IO operations so far is downgraded to Ready: it is
/// scheduled but not actually doing work. An unqueryable status (process
/// vanished mid-read or access denied) yields Unknown.
pub fn classify_state(
    status: Option<RawStatus>,
    cpu_percent: f64,
    io: Option<IoCounters>,
) -> ProcState {
    let status = match status {
        Some(s) => s,
        None => return ProcState::Unknown,
    };

    let mapped = map_raw_status(status);
    if mapped == ProcState::Running && cpu_percent == 0.0 {
        if let Some(io) = io {
            if io.read_ops == 0 && io.write_ops == 0 {
                return ProcState::Ready;
            }
        }
    }
    mapped
}
