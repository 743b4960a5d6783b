//! The structs
//!
/// The servers from the host file, in the order of the file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HostList {
    pub hosts: Vec<String>,
}
