//! Severity levels and host error-code classification
//!
//! The host runtime reports errors as numeric codes; the remote service
//! speaks a five-level severity scale. [`classify`] is the single place
//! where that mapping is decided (explicit caller-supplied levels aside).

use serde::{Deserialize, Serialize};

/// Severity of a report or breadcrumb.
///
/// Ordered by increasing severity so callers can filter with plain
/// comparisons (`level >= Severity::Warning`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Diagnostic detail, normally filtered out
    Debug,
    /// Expected but notable events
    Info,
    /// Something suspicious that did not fail the operation
    Warning,
    /// A failed operation
    #[default]
    Error,
    /// The process cannot continue
    Fatal,
}

impl Severity {
    /// Lowercase wire name of the level, as the remote service expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }

    /// Parses a lowercase level name (`"debug"`, `"info"`, `"warning"`,
    /// `"error"`, `"fatal"`). Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "debug" => Some(Severity::Debug),
            "info" => Some(Severity::Info),
            "warning" => Some(Severity::Warning),
            "error" => Some(Severity::Error),
            "fatal" => Some(Severity::Fatal),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Numeric error codes used by the host runtime's error-reporting mask.
///
/// The values double as bits in the `error_types` bitmask of the delivery
/// configuration.
pub mod error_code {
    pub const ERROR: u32 = 1;
    pub const WARNING: u32 = 2;
    pub const PARSE: u32 = 4;
    pub const NOTICE: u32 = 8;
    pub const CORE_ERROR: u32 = 16;
    pub const CORE_WARNING: u32 = 32;
    pub const COMPILE_ERROR: u32 = 64;
    pub const COMPILE_WARNING: u32 = 128;
    pub const USER_ERROR: u32 = 256;
    pub const USER_WARNING: u32 = 512;
    pub const USER_NOTICE: u32 = 1024;
    pub const STRICT: u32 = 2048;
    pub const RECOVERABLE_ERROR: u32 = 4096;
    pub const DEPRECATED: u32 = 8192;
    pub const USER_DEPRECATED: u32 = 16384;

    /// Every code above combined.
    pub const ALL: u32 = 32767;
}

/// Maps a host error code to a severity.
///
/// Total function: codes outside the fixed table classify as
/// [`Severity::Error`].
pub fn classify(code: u32) -> Severity {
    use error_code::*;

    match code {
        NOTICE | USER_NOTICE | DEPRECATED | USER_DEPRECATED | STRICT => Severity::Info,
        WARNING | USER_WARNING | CORE_WARNING | COMPILE_WARNING => Severity::Warning,
        ERROR | USER_ERROR | RECOVERABLE_ERROR | CORE_ERROR | COMPILE_ERROR | PARSE => {
            Severity::Error
        }
        _ => Severity::Error,
    }
}
