//! Process-related modules for snapshot collection and classification.
//!
//! This module provides:
//! - `state`: Coarse state classification from raw OS status
//! - `priority`: Priority bucketing with platform-dependent policies
//! - `category`: Functional categorization by curated name lists
//! - `collector`: Two-pass snapshot collection across the process table
//! - `grouping`: Name-based grouping, aggregation, and expansion

pub mod category;
pub mod collector;
pub mod grouping;
pub mod priority;
pub mod state;

// Re-export commonly used types
pub use category::{CategoryRules, DEFAULT_RULES};
pub use collector::{collect, collect_snapshots, UNKNOWN_NAME};
pub use grouping::{expand_group, group_by_name};
pub use priority::PriorityPolicy;
pub use state::{classify_state, map_raw_status};
