//! The structs
//!
use std::path::PathBuf;
use chrono::{DateTime, Local};

/// What to do with a working set value that is missing or is not a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplePolicy {
    /// Use 0.
    #[default]
    BestEffort,
    /// Fail the server.
    Strict,
}

/// The settings for a reset run.
#[derive(Debug, Clone, Default)]
pub struct ResetSettings {
    pub host_file: PathBuf,
    pub results_file: PathBuf,
    /// The requested application pool. Empty means the user chooses.
    pub app_pool: String,
    pub stop_on_error: bool,
    pub sample_policy: SamplePolicy,
    pub isolate_host_errors: bool,
    pub clear_screen: bool,
    /// The user running the reset, recorded in the result lines.
    pub user: String,
}

/// The working set before and after the recycle, in megabytes.
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySample {
    pub before_mb: i64,
    pub after_mb: i64,
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResetStatus {
    Recycled(MemorySample),
    /// Only used with isolate_host_errors.
    Failed(String),
}

/// The result of the reset of one server.
#[derive(Debug, Clone, PartialEq)]
pub struct ResetResult {
    pub server: String,
    pub app_pool: String,
    pub user: String,
    pub status: ResetStatus,
}

/// This struct is a wrapper for the ResetResult struct.
///
/// In this way, the struct can be used with functions in the impl.
#[derive(Debug, Default)]
pub struct AllResetResults {
    pub results: Vec<ResetResult>,
}

/// How a reset run ended, when it did not end with an error.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(AllResetResults),
    /// The application pool was not found and stop on error was set, see [`crate::app_pools::PoolValidation::Aborted`].
    Aborted,
}
