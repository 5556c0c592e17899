//! Conditional logging macros gated on a module-level `ENABLE_LOGS` const.
//!
//! High-traffic modules (the capture loop runs every tick) define
//! `const ENABLE_LOGS: bool = ...;` and use these instead of the plain `log`
//! macros, so their chatter can be silenced without touching call sites.

/// Info-level logging, active only when the calling module's `ENABLE_LOGS`
/// const is true.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Warn-level counterpart of [`log_info!`].
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Error-level counterpart of [`log_info!`].
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
