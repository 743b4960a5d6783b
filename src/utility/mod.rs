//! Module with the utility functions.
//!
//! - Setting the host file, results file and shell from the command line, `.env` or the defaults.
//! - Writing the changed settings to `.env`.
//! - The safe integer conversion and the bytes to megabytes conversion of the working set samples.
//!
mod utility;

pub use utility::*;
