//! Module for writing the results file.
//!
//! A successful run overwrites the results file with one line per server.
//! A failed run appends the error and a failure line to the results file.
//!
mod functions;

pub use functions::*;
