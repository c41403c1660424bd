/// Total weight distributed across regions under the proportional rule.
/// Mirrors the 538 electoral votes of the US college.
pub const DEFAULT_TOTAL_WEIGHT: u32 = 538;

/// Sentinel used by initialization for "not yet assigned".
pub const UNASSIGNED: u32 = u32::MAX;

/// Name given to the worker thread that drives a run.
pub const WORKER_THREAD_NAME: &str = "borderforge-run";

/// Default capacity of the outbound event channel.
pub const DEFAULT_SUMMARY_CAPACITY: usize = 64;

/// Smallest and largest synthetic unit population (half-open).
pub const SYNTHETIC_POP_MIN: u64 = 1_000;
pub const SYNTHETIC_POP_MAX: u64 = 100_000;

/// Range of the per-region base lean (in percentage points) used by
/// the state-based synthetic generator.
pub const SYNTHETIC_STATE_LEAN_RANGE: f64 = 20.0;
