//! apppool_reset
//!
//! Recycle an IIS application pool on every server in a host file,
//! and record the worker process working set before and after the recycle.
//!
#[macro_use]
extern crate serde_derive;

use clap::Parser;

pub mod utility;
pub mod hosts;
pub mod remote;
pub mod app_pools;
pub mod reset;
pub mod results;

/// The default host file name, looked up in the directory of the executable.
pub const DEFAULT_HOST_FILE: &str = "HostFile.txt";
/// The default results file name, looked up in the directory of the executable.
pub const DEFAULT_RESULTS_FILE: &str = "AppPoolResetResults.txt";
/// The powershell executable used for the remote operations.
/// `pwsh` can be used for powershell core.
pub const DEFAULT_SHELL: &str = "powershell.exe";
/// The process name of an IIS worker process.
pub const WORKER_PROCESS_NAME: &str = "w3wp.exe";

#[derive(Debug, Parser, Default, Clone)]
#[command(version, about, long_about = None)]
pub struct Opts {
    /// application pool name to recycle. If not set or not found, a list of pools is shown to choose from
    #[arg(short, long, value_name = "app pool name")]
    pub app_pool: Option<String>,
    /// stop if the application pool is not found instead of asking for a choice
    #[arg(short, long)]
    pub stop_on_error: bool,
    /// the file with the servers, one per line, # is a comment (default: HostFile.txt next to the executable)
    #[arg(long, value_name = "path")]
    pub host_file: Option<String>,
    /// the file the results are written to (default: AppPoolResetResults.txt next to the executable)
    #[arg(long, value_name = "path")]
    pub results_file: Option<String>,
    /// the powershell executable to use for remote operations
    #[arg(long, value_name = "executable")]
    pub shell: Option<String>,
    /// fail if a working set value cannot be read instead of using 0
    #[arg(long)]
    pub strict_samples: bool,
    /// record a failed server and continue with the next one
    #[arg(long)]
    pub isolate_host_errors: bool,
    /// do not clear the screen before the servers are reset
    #[arg(long)]
    pub no_clear: bool,
    /// write the host file, results file and shell settings to .env
    #[arg(long)]
    pub write_dotenv: bool,
}
