//! Grouping and aggregation of same-named processes.
//!
//! Group mode collapses every name partition into one representative record
//! carrying aggregated totals, the way a task manager lists applications.
//! Expand mode returns the ungrouped members of a single named group.

use crate::model::{round1, ProcessSnapshot};
use ahash::AHashMap as HashMap;

/// Per-name aggregation accumulator. The first-encountered snapshot (by
/// original enumeration order) is the representative; siblings fold into it.
struct GroupAccumulator {
    representative: ProcessSnapshot,
    member_pids: Vec<i32>,
    total_memory_mb: f64,
    total_cpu_percent: f64,
    total_threads: u64,
}

impl GroupAccumulator {
    fn new(representative: ProcessSnapshot) -> Self {
        Self {
            total_memory_mb: representative.memory_mb,
            total_cpu_percent: representative.cpu_percent,
            total_threads: representative.thread_count as u64,
            member_pids: Vec::new(),
            representative,
        }
    }

    fn fold(&mut self, sibling: ProcessSnapshot) {
        self.total_memory_mb += sibling.memory_mb;
        self.total_cpu_percent += sibling.cpu_percent;
        self.total_threads += sibling.thread_count as u64;
        self.member_pids.push(sibling.pid);
    }

    fn finish(self) -> ProcessSnapshot {
        let mut rep = self.representative;
        rep.is_group_representative = true;
        if !self.member_pids.is_empty() {
            rep.group_label = Some(format!(
                "{} ({} processes)",
                rep.name,
                self.member_pids.len() + 1
            ));
            rep.group_total_memory_mb = Some(round1(self.total_memory_mb));
            rep.group_total_cpu_percent = Some(round1(self.total_cpu_percent));
            rep.group_total_threads = Some(self.total_threads);
            rep.group_member_pids = Some(self.member_pids);
        }
        rep
    }
}

/// Partitions snapshots by case-insensitive name and collapses each
/// partition into its representative, ordered by descending effective
/// memory (group total when aggregated, own memory otherwise) with ties
/// keeping their prior relative order. A `max_results > 0` keeps only the
/// first that many representatives; anything else means unlimited.
pub fn group_by_name(snapshots: Vec<ProcessSnapshot>, max_results: i64) -> Vec<ProcessSnapshot> {
    let mut accumulators: Vec<GroupAccumulator> = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();

    for snapshot in snapshots {
        let key = snapshot.name.to_lowercase();
        match index_by_name.get(&key) {
            Some(&i) => accumulators[i].fold(snapshot),
            None => {
                index_by_name.insert(key, accumulators.len());
                accumulators.push(GroupAccumulator::new(snapshot));
            }
        }
    }

    let mut representatives: Vec<ProcessSnapshot> =
        accumulators.into_iter().map(GroupAccumulator::finish).collect();

    // Stable sort: equal keys keep insertion order.
    representatives.sort_by(|a, b| {
        b.effective_memory_mb()
            .partial_cmp(&a.effective_memory_mb())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if max_results > 0 {
        representatives.truncate(max_results as usize);
    }
    representatives
}

/// Returns the ungrouped members of the group the target PID belongs to,
/// sorted ascending by PID. An unknown target yields an empty sequence.
/// No aggregation and no truncation apply here.
pub fn expand_group(snapshots: Vec<ProcessSnapshot>, target_pid: i32) -> Vec<ProcessSnapshot> {
    let target_name = match snapshots.iter().find(|s| s.pid == target_pid) {
        Some(s) => s.name.to_lowercase(),
        None => return Vec::new(),
    };

    let mut members: Vec<ProcessSnapshot> = snapshots
        .into_iter()
        .filter(|s| s.name.to_lowercase() == target_name)
        .collect();
    members.sort_by_key(|s| s.pid);
    members
}
