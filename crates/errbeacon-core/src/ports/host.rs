//! Host runtime port
//!
//! The forwarder hooks into the host runtime's error machinery through this
//! port: it installs an error trap, consults the active error-reporting
//! mask and can read back the final recorded error.

use std::sync::Arc;

/// Callback invoked by the host runtime when an error is raised.
///
/// Arguments are the numeric error code, the message, the source file and
/// the line. The return value tells the runtime whether the error is
/// considered handled; the forwarder's trap always answers `false` so the
/// host's own handling proceeds unchanged.
pub type ErrorTrap = Arc<dyn Fn(u32, &str, &str, u32) -> bool + Send + Sync>;

/// An error recorded by the host runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostError {
    pub code: u32,
    pub message: String,
    pub file: String,
    pub line: u32,
}

/// Integration surface of the host runtime.
pub trait HostRuntime: Send + Sync {
    /// The active error-reporting bitmask. Codes outside the mask are
    /// suppressed by the host and must not be forwarded either.
    fn error_reporting_mask(&self) -> u32;

    /// The last error the runtime recorded, if any.
    fn last_error(&self) -> Option<HostError>;

    /// Installs an error trap, returning the previously installed one so
    /// the caller can chain to it.
    fn install_error_trap(&self, trap: ErrorTrap) -> Option<ErrorTrap>;
}
