//! Priority bucketing from raw scheduling-priority values.
//!
//! Two platform policies exist: Windows maps onto its five fixed priority
//! classes by nearest reference point, POSIX niceness maps onto five ordered
//! bands. The policy is selected once at startup, not per call.

use crate::model::PriorityBucket;

/// Windows priority-class reference points, in ascending key order.
/// Ties in distance resolve to the first (lower) reference point scanned.
const WINDOWS_REFERENCE_POINTS: [(i64, PriorityBucket); 5] = [
    (-20, PriorityBucket::RealTime),
    (-10, PriorityBucket::High),
    (0, PriorityBucket::Normal),
    (10, PriorityBucket::BelowNormal),
    (20, PriorityBucket::Low),
];

/// Platform-dependent priority mapping policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityPolicy {
    Windows,
    Posix,
}

impl PriorityPolicy {
    /// Selects the policy for the platform this binary runs on.
    pub fn detect() -> Self {
        if cfg!(target_os = "windows") {
            PriorityPolicy::Windows
        } else {
            PriorityPolicy::Posix
        }
    }

    /// Maps a raw niceness/priority value to a coarse bucket.
    pub fn classify(self, raw: i64) -> PriorityBucket {
        match self {
            PriorityPolicy::Windows => {
                let mut best = WINDOWS_REFERENCE_POINTS[0];
                for candidate in WINDOWS_REFERENCE_POINTS {
                    if (raw - candidate.0).abs() < (raw - best.0).abs() {
                        best = candidate;
                    }
                }
                best.1
            }
            PriorityPolicy::Posix => {
                if raw < -10 {
                    PriorityBucket::VeryHigh
                } else if raw < 0 {
                    PriorityBucket::High
                } else if raw == 0 {
                    PriorityBucket::Normal
                } else if raw < 10 {
                    PriorityBucket::Low
                } else {
                    PriorityBucket::VeryLow
                }
            }
        }
    }

    /// Bucket used when the raw value cannot be read.
    pub fn default_bucket(self) -> PriorityBucket {
        PriorityBucket::Normal
    }
}
