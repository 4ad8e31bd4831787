//! In-process host runtime adapter
//!
//! A [`ProcessHost`] models the host runtime's error machinery inside the
//! current process: it holds the error-reporting mask, remembers the last
//! recorded error and dispatches raised errors through the installed trap.

use std::sync::Mutex;

use errbeacon_core::ports::{ErrorTrap, HostError, HostRuntime};

pub struct ProcessHost {
    mask: u32,
    trap: Mutex<Option<ErrorTrap>>,
    last_error: Mutex<Option<HostError>>,
}

impl ProcessHost {
    /// Host with every error code enabled in the reporting mask.
    pub fn new() -> Self {
        ProcessHost::with_mask(u32::MAX)
    }

    pub fn with_mask(mask: u32) -> Self {
        ProcessHost {
            mask,
            trap: Mutex::new(None),
            last_error: Mutex::new(None),
        }
    }

    /// Records an error without dispatching it, as a runtime does for
    /// errors raised while no trap is installed.
    pub fn record_error(&self, error: HostError) {
        if let Ok(mut guard) = self.last_error.lock() {
            *guard = Some(error);
        }
    }

    /// Raises an error: records it and invokes the installed trap, if any.
    /// Returns the trap's verdict, or `false` when no trap is installed.
    pub fn raise(&self, code: u32, message: &str, file: &str, line: u32) -> bool {
        self.record_error(HostError {
            code,
            message: message.to_string(),
            file: file.to_string(),
            line,
        });
        let trap = match self.trap.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        };
        match trap {
            Some(trap) => trap(code, message, file, line),
            None => false,
        }
    }

    pub fn trap_installed(&self) -> bool {
        self.trap.lock().map(|g| g.is_some()).unwrap_or(false)
    }
}

impl Default for ProcessHost {
    fn default() -> Self {
        ProcessHost::new()
    }
}

impl HostRuntime for ProcessHost {
    fn error_reporting_mask(&self) -> u32 {
        self.mask
    }

    fn last_error(&self) -> Option<HostError> {
        self.last_error.lock().ok().and_then(|g| g.clone())
    }

    fn install_error_trap(&self, trap: ErrorTrap) -> Option<ErrorTrap> {
        match self.trap.lock() {
            Ok(mut guard) => guard.replace(trap),
            Err(_) => None,
        }
    }
}
