//! The structs
//!
use anyhow::Result;

/// A process as returned by the process query.
/// The field names are the names of the Win32_Process properties.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ProcessSample {
    #[serde(rename = "CommandLine")]
    pub command_line: Option<String>,
    /// The working set in bytes, as text.
    #[serde(rename = "WorkingSetSize")]
    pub working_set_size: Option<String>,
}

/// `ConvertTo-Json` returns an object for a single process, and an array for multiple processes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProcessQueryOutput {
    Many(Vec<ProcessSample>),
    One(ProcessSample),
}

/// The remote operations needed to reset an application pool.
pub trait RemoteHost {
    /// The IIS worker processes on `server`, in the order the server returns them.
    /// With `app_pool` set, only the workers with `"<app_pool>"` in the command line.
    fn query_worker_processes(&self, server: &str, app_pool: Option<&str>) -> Result<Vec<ProcessSample>>;
    /// Recycle `app_pool` on `server`, and return after the recycle has finished.
    fn recycle_app_pool(&self, server: &str, app_pool: &str) -> Result<()>;
}

/// The powershell implementation of [`RemoteHost`].
#[derive(Debug, Clone)]
pub struct PowerShellRemote {
    /// The powershell executable, `powershell.exe` or `pwsh`.
    pub shell: String,
}
