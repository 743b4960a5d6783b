//! Module for the reset of the application pool on all servers.
//!
//! The servers are processed one at a time, in the order of the host file.
//! For every server, the application pool is recycled, after which the working set of the worker processes
//! of the application pool is read. The first worker process returned is the process from before the recycle,
//! the second one is the process that was started by the recycle.
//!
//! Every result line is printed when the server is done, and all result lines are written to the results file
//! when all servers are done.
//! Any error stops the reset, and is appended to the results file together with a failure line,
//! unless `--isolate-host-errors` is set, in which case a failed server gets a failure result line.
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
