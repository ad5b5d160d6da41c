//! Error types for the debugger transport and session

use thiserror::Error;

/// Result type for driver operations
pub type Result<T> = std::result::Result<T, DriverError>;

/// Errors raised outside of command parsing.
///
/// Parse routines never fail; they log and move on. These errors only come
/// from talking to the debugger process or loading configuration.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The debugger executable could not be started
    #[error("Failed to start debugger '{path}': {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The debugger process was not started or already stopped
    #[error("Debugger is not running")]
    NotRunning,

    /// The debugger closed its output while a reply was still expected
    #[error("Debugger closed its output while waiting for '{0}'")]
    TransportClosed(String),

    /// No complete reply arrived in time
    #[error("Timed out after {0}ms waiting for the debugger")]
    Timeout(u64),

    /// Configuration file could not be read or parsed
    #[error("Invalid configuration in {path}: {reason}")]
    Config { path: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
