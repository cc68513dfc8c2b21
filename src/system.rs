//! Host-wide statistics assembly.
//!
//! Listed-count figures come from the final (grouped, possibly truncated)
//! sequence; system-wide figures come from the raw OS state, independent of
//! any truncation applied to the listing.

use crate::config::Config;
use crate::model::{round1, ProcState, ProcessSnapshot, SystemStatistics};
use crate::source::{MetricSource, SourceError};

const BYTES_PER_GB: f64 = (1u64 << 30) as f64;

/// Computes the statistics record for one collection call.
pub fn build_statistics(
    source: &dyn MetricSource,
    config: &Config,
    listed: &[ProcessSnapshot],
) -> Result<SystemStatistics, SourceError> {
    let total_processes = source.pid_count()?;
    let memory = source.memory()?;

    // Coarse interval for the headline CPU figure, a shorter one for the
    // per-core breakdown. Both block for their sampling window.
    let cpu_percent = source.cpu_percent(config.system_cpu_interval())?;
    let cpu_per_core = source.cpu_percent_per_core(config.per_core_interval())?;

    let running_count = listed
        .iter()
        .filter(|s| s.state == ProcState::Running)
        .count();

    Ok(SystemStatistics {
        total_processes,
        total_processes_listed: listed.len(),
        running_count,
        waiting_count: listed.len() - running_count,
        memory_used_gb: round1(memory.total_bytes.saturating_sub(memory.available_bytes) as f64 / BYTES_PER_GB),
        memory_total_gb: round1(memory.total_bytes as f64 / BYTES_PER_GB),
        memory_usage_percent: round1(memory.percent),
        cpu_percent: round1(cpu_percent),
        cpu_per_core: cpu_per_core.into_iter().map(round1).collect(),
        cpu_count: source.cpu_count(),
    })
}
