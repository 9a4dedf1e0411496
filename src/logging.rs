//! Conditional logging macros for library-level tracing.
//!
//! With the `logging` feature the macros forward to `tracing`; without it
//! they expand to nothing, so the aggregation code never needs its own
//! `cfg` attributes.
//!
//! ```rust,ignore
//! use crate::logging::{debug, info};
//!
//! debug!(path = %input.display(), "input file present");
//! info!(users = total, "online stats aggregated");
//! ```

/// Per-record decisions (skipped users, ignored fields).
macro_rules! log_trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        {
            tracing::trace!($($arg)*);
        }
    };
}

/// Branch decisions on the file level.
macro_rules! log_debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        {
            tracing::debug!($($arg)*);
        }
    };
}

/// Completed aggregations and written reports.
macro_rules! log_info {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        {
            tracing::info!($($arg)*);
        }
    };
}

/// Degenerate inputs that are handled but probably not intended.
macro_rules! log_warn {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        {
            tracing::warn!($($arg)*);
        }
    };
}

pub(crate) use log_debug as debug;
pub(crate) use log_info as info;
pub(crate) use log_trace as trace;
pub(crate) use log_warn as warn;
