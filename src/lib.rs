//! procsnap - task-manager style process snapshots.
//!
//! The core of the crate is the snapshot collection, classification, and
//! grouping/aggregation pipeline plus a safe termination state machine. The
//! library exposes two operations:
//!
//! - [`collect`]: one point-in-time reading of every process on the host,
//!   classified (state, priority bucket, functional category), collapsed
//!   into name-based groups (or expanded for one group), with host-wide
//!   statistics attached.
//! - [`terminate`]: a graceful-then-forced kill sequence with a built-in
//!   denylist of critical system processes.
//!
//! The OS process table is consumed through the [`source::MetricSource`]
//! trait; [`source::ProcfsSource`] is the Linux implementation over /proc,
//! and tests drive the pipeline with scripted sources.
//!
//! # Usage
//!
//! ```no_run
//! use procsnap::config::Config;
//! use procsnap::process::{collect, PriorityPolicy, DEFAULT_RULES};
//! use procsnap::source::ProcfsSource;
//!
//! let source = ProcfsSource::new();
//! let config = Config::default();
//! let result = collect(&source, &config, &DEFAULT_RULES, PriorityPolicy::detect(), None);
//! println!("{} processes listed", result.stats.total_processes_listed);
//! ```

pub mod cli;
pub mod config;
pub mod model;
pub mod process;
pub mod source;
pub mod system;
pub mod terminate;

// Re-export main types for convenience
pub use config::Config;
pub use model::{
    Category, CollectionResult, PriorityBucket, ProcState, ProcessSnapshot, SystemStatistics,
    TerminationKind, TerminationResult,
};
pub use process::{collect, CategoryRules, PriorityPolicy, DEFAULT_RULES};
pub use source::{MetricSource, ProcessHandle, ProcfsSource, SourceError};
pub use terminate::terminate;
