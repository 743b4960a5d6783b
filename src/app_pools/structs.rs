//! The structs
//!
/// The result of validating the application pool name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolValidation {
    /// The application pool name to use, either the requested one or the one chosen by the user.
    Valid(String),
    /// The application pool was not found, and stop on error was set.
    Aborted,
}
