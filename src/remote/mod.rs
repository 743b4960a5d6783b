//! Module for the remote operations on the servers.
//!
//! The remote operations are:
//! - reading the processes of a server, filtered on (a part of) the command line.
//! - recycling an application pool on a server.
//!
//! [`RemoteHost`] is implemented by [`PowerShellRemote`], which executes powershell
//! with `Get-CimInstance` for the process list and `Invoke-Command` with `Restart-WebAppPool`
//! from the WebAdministration module for the recycle.
//! These use the credentials of the user running apppool_reset.
//!
mod structs;
mod functions;

pub use structs::*;
pub use functions::*;
