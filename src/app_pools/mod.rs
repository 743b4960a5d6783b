//! Module for finding and validating the application pool name.
//!
//! The application pools are found by reading the command lines of the IIS worker processes (w3wp) on the reference server.
//! An IIS worker process has the application pool name as the first double quoted value in the command line:
//! `c:\windows\system32\inetsrv\w3wp.exe -ap "DefaultAppPool" -v "v4.0" ...`
//!
//! Only application pools with a running worker process are found this way.
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
