//! Module for reading the host file.
//!
//! The host file contains one server per line.
//! Lines starting with `#` are comments, and empty lines are skipped.
//! The first server in the file is the reference server that is used to validate the application pool name.
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
