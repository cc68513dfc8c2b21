//! End-to-end tests for the collection operation over a scripted source.

mod common;

use common::{fast_config, MockProcess, MockSource};
use procsnap::model::{Category, PriorityBucket, ProcState};
use procsnap::process::{collect, PriorityPolicy};
use procsnap::CategoryRules;

fn no_rules() -> CategoryRules {
    CategoryRules::default()
}

fn test_rules() -> CategoryRules {
    CategoryRules {
        system: vec!["systemd".into()],
        browsers: vec!["chrome".into()],
        dev_tools: vec!["code".into()],
        critical: vec!["systemd".into()],
    }
}

// -------------------------------------------------------------------------
// Group mode
// -------------------------------------------------------------------------

#[test]
fn test_collect_groups_and_orders_by_aggregated_memory() {
    let source = MockSource::new(vec![
        MockProcess::new(10, "x").with_memory_mb(5.0),
        MockProcess::new(11, "x").with_memory_mb(7.0),
        MockProcess::new(12, "y").with_memory_mb(3.0),
    ]);

    let result = collect(&source, &fast_config(), &no_rules(), PriorityPolicy::Posix, None);
    assert!(result.success);
    assert!(result.error.is_none());
    assert_eq!(result.processes.len(), 2);

    let x = &result.processes[0];
    assert_eq!(x.name, "x");
    assert_eq!(x.pid, 10, "first-enumerated snapshot is the representative");
    assert!(x.is_group_representative);
    assert_eq!(x.group_total_memory_mb, Some(12.0));
    assert_eq!(x.group_member_pids.as_deref(), Some(&[11][..]));
    assert_eq!(x.group_total_threads, Some(2));
    assert_eq!(x.group_label.as_deref(), Some("x (2 processes)"));
    assert_eq!(x.memory_mb, 5.0, "representative's own figure is untouched");

    let y = &result.processes[1];
    assert_eq!(y.name, "y");
    assert!(y.is_group_representative);
    assert!(y.group_member_pids.is_none());
    assert!(y.group_label.is_none());
}

#[test]
fn test_collect_truncates_listing_but_not_table_count() {
    let source = MockSource::new(vec![
        MockProcess::new(1, "a").with_memory_mb(1.0),
        MockProcess::new(2, "b").with_memory_mb(3.0),
        MockProcess::new(3, "c").with_memory_mb(2.0),
    ]);

    let mut config = fast_config();
    config.max_results = Some(2);

    let result = collect(&source, &config, &no_rules(), PriorityPolicy::Posix, None);
    assert!(result.success);
    assert_eq!(result.processes.len(), 2);
    assert_eq!(result.processes[0].name, "b");
    assert_eq!(result.processes[1].name, "c");
    // The OS table count ignores the truncation.
    assert_eq!(result.stats.total_processes, 3);
    assert_eq!(result.stats.total_processes_listed, 2);
}

#[test]
fn test_collect_non_positive_max_means_unlimited() {
    let procs: Vec<MockProcess> = (1..=60)
        .map(|pid| MockProcess::new(pid, &format!("p{}", pid)))
        .collect();
    let source = MockSource::new(procs);

    let mut config = fast_config();
    config.max_results = Some(0);

    let result = collect(&source, &config, &no_rules(), PriorityPolicy::Posix, None);
    assert_eq!(result.processes.len(), 60);
}

// -------------------------------------------------------------------------
// Expand mode
// -------------------------------------------------------------------------

#[test]
fn test_collect_expand_lists_group_members_by_pid() {
    let source = MockSource::new(vec![
        MockProcess::new(30, "x"),
        MockProcess::new(12, "y"),
        MockProcess::new(10, "x"),
        MockProcess::new(20, "x"),
    ]);

    let result = collect(
        &source,
        &fast_config(),
        &no_rules(),
        PriorityPolicy::Posix,
        Some(20),
    );
    assert!(result.success);
    let pids: Vec<i32> = result.processes.iter().map(|p| p.pid).collect();
    assert_eq!(pids, vec![10, 20, 30]);
    assert!(result.processes.iter().all(|p| !p.is_group_representative));
    assert!(result
        .processes
        .iter()
        .all(|p| p.group_total_memory_mb.is_none()));
    assert_eq!(result.stats.total_processes_listed, 3);
    assert_eq!(result.stats.total_processes, 4);
}

#[test]
fn test_collect_expand_unknown_pid_is_empty_success() {
    let source = MockSource::new(vec![MockProcess::new(10, "x")]);
    let result = collect(
        &source,
        &fast_config(),
        &no_rules(),
        PriorityPolicy::Posix,
        Some(999),
    );
    assert!(result.success);
    assert!(result.processes.is_empty());
    assert_eq!(result.stats.total_processes_listed, 0);
}

// -------------------------------------------------------------------------
// Per-process figures and classification
// -------------------------------------------------------------------------

#[test]
fn test_collect_reports_second_pass_cpu_reading() {
    // The scripted handle reports 0.0 on the first query and the real figure
    // on the second; a single-pass collector would report 0.0 here.
    let source = MockSource::new(vec![MockProcess::new(10, "worker").with_cpu(42.5)]);

    let result = collect(&source, &fast_config(), &no_rules(), PriorityPolicy::Posix, None);
    assert_eq!(result.processes[0].cpu_percent, 42.5);
}

#[test]
fn test_collect_state_classification() {
    use procsnap::source::RawStatus;

    let source = MockSource::new(vec![
        MockProcess::new(10, "busy")
            .with_status(RawStatus::Running)
            .with_cpu(5.0)
            .with_io(100, 20),
        MockProcess::new(11, "idle-runnable").with_status(RawStatus::Running),
        MockProcess::new(12, "sleeper").with_status(RawStatus::Sleeping),
        MockProcess::new(13, "zombie").with_status(RawStatus::Zombie),
    ]);

    let result = collect(&source, &fast_config(), &no_rules(), PriorityPolicy::Posix, None);
    let state_of = |name: &str| {
        result
            .processes
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.state)
            .unwrap()
    };

    assert_eq!(state_of("busy"), ProcState::Running);
    // Runnable but with no CPU use and no IO demotes to Ready.
    assert_eq!(state_of("idle-runnable"), ProcState::Ready);
    assert_eq!(state_of("sleeper"), ProcState::Waiting);
    assert_eq!(state_of("zombie"), ProcState::Finished);

    assert_eq!(result.stats.running_count, 1);
    assert_eq!(result.stats.waiting_count, 3);
}

#[test]
fn test_collect_category_and_priority_classification() {
    let source = MockSource::new(vec![
        MockProcess::new(10, "chrome").with_niceness(-15),
        MockProcess::new(11, "code"),
        MockProcess::new(12, "systemd-journald").with_niceness(5),
        MockProcess::new(13, "spotify"),
    ]);

    let result = collect(&source, &fast_config(), &test_rules(), PriorityPolicy::Posix, None);
    let find = |name: &str| result.processes.iter().find(|p| p.name == name).unwrap();

    assert_eq!(find("chrome").category, Category::Browser);
    assert_eq!(find("chrome").priority_bucket, PriorityBucket::VeryHigh);
    assert_eq!(find("code").category, Category::DevelopmentTool);
    assert_eq!(find("code").priority_bucket, PriorityBucket::Normal);
    assert_eq!(find("systemd-journald").category, Category::System);
    assert_eq!(find("systemd-journald").priority_bucket, PriorityBucket::Low);
    assert_eq!(find("spotify").category, Category::Application);
}

#[test]
fn test_collect_killable_pid_threshold() {
    let source = MockSource::new(vec![
        MockProcess::new(4, "kthreadd"),
        MockProcess::new(5, "daemon"),
    ]);

    let result = collect(&source, &fast_config(), &no_rules(), PriorityPolicy::Posix, None);
    let find = |pid: i32| result.processes.iter().find(|p| p.pid == pid).unwrap();
    assert!(!find(4).killable);
    assert!(find(5).killable);
}

#[test]
fn test_collect_memory_and_uptime_figures() {
    let source = MockSource::new(vec![{
        let mut p = MockProcess::new(10, "app").with_memory_mb(37.25);
        p.uptime_secs = 3_600;
        p.thread_count = 8;
        p
    }]);

    let result = collect(&source, &fast_config(), &no_rules(), PriorityPolicy::Posix, None);
    let app = &result.processes[0];
    assert_eq!(app.memory_mb, 37.3, "rounded to one decimal");
    assert_eq!(app.thread_count, 8);
    // The mock created the process an hour ago; allow for scheduling slack.
    assert!((3_599..=3_601).contains(&app.uptime_seconds));
}

// -------------------------------------------------------------------------
// Host-wide statistics and failure handling
// -------------------------------------------------------------------------

#[test]
fn test_collect_system_statistics() {
    let mut source = MockSource::new(vec![MockProcess::new(10, "app")]);
    source.system_cpu_percent = 33.33;
    source.per_core_percent = vec![10.04, 56.66, 33.29, 12.5];

    let result = collect(&source, &fast_config(), &no_rules(), PriorityPolicy::Posix, None);
    let stats = &result.stats;

    assert_eq!(stats.total_processes, 1);
    // 8 GiB total, 6 GiB available.
    assert_eq!(stats.memory_total_gb, 8.0);
    assert_eq!(stats.memory_used_gb, 2.0);
    assert_eq!(stats.memory_usage_percent, 25.0);
    assert_eq!(stats.cpu_percent, 33.3);
    assert_eq!(stats.cpu_per_core, vec![10.0, 56.7, 33.3, 12.5]);
    assert_eq!(stats.cpu_count, 4);
}

#[test]
fn test_collect_source_failure_yields_zeroed_failure_record() {
    let mut source = MockSource::new(vec![MockProcess::new(10, "app")]);
    source.fail_enumeration = true;

    let result = collect(&source, &fast_config(), &no_rules(), PriorityPolicy::Posix, None);
    assert!(!result.success);
    assert!(result.error.as_deref().unwrap().contains("unavailable"));
    assert!(result.processes.is_empty());
    assert_eq!(result.stats.total_processes, 0);
    assert_eq!(result.stats.cpu_percent, 0.0);
}

#[test]
fn test_collect_result_envelope() {
    let source = MockSource::new(vec![MockProcess::new(10, "app")]);
    let result = collect(&source, &fast_config(), &no_rules(), PriorityPolicy::Posix, None);

    assert!(result.success);
    assert!(result.timestamp > 0);
    assert_eq!(result.datetime.len(), "2026-01-01 00:00:00".len());
    assert!(result.execution_time_ms > 0.0);
}
