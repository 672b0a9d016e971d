//! Tracing macros over the `log` crate, gated behind the `trace`/`debug`
//! cargo features. Kept verbatim from the teacher's `src/debug.rs` — this
//! decoder's natural tracing points are header reads, cache hits/misses,
//! CHOICE branch attempts and SEQUENCE field resolution, the same kind of
//! call-boundary tracing the teacher uses around its `nom` parsers.

pub(crate) mod macros {
    /// Format and log message at TRACE level, but only if feature `trace` is enabled
    #[allow(unused_macros)]
    macro_rules! log_trace {
        ($fmt: expr) => {
            #[cfg(feature = "trace")]
            {
                log::trace!($fmt);
            }
        };
        ($fmt: expr, $( $args:expr ),*) => {
            #[cfg(feature = "trace")]
            {
                log::trace!($fmt, $($args),*);
            }
        };
    }

    /// Format and log message at ERROR level, but only if feature `debug` is enabled
    #[allow(unused_macros)]
    macro_rules! log_error {
        ($fmt: expr) => {
            #[cfg(feature = "debug")]
            {
                log::error!($fmt);
            }
        };
        ($fmt: expr, $( $args:expr ),*) => {
            #[cfg(feature = "debug")]
            {
                log::error!($fmt, $($args),*);
            }
        };
    }

    /// Format and log message at the specified level, but only if feature `debug` is enabled
    #[allow(unused_macros)]
    macro_rules! debug_log {
        ($lvl: expr, $fmt: expr) => {
            #[cfg(feature = "debug")]
            {
                log::log!($lvl, $fmt);
            }
        };
        ($lvl: expr, $fmt: expr, $( $args:expr ),*) => {
            #[cfg(feature = "debug")]
            {
                log::log!($lvl, $fmt, $($args),*);
            }
        };
    }

    pub(crate) use {debug_log, log_error, log_trace};
}

pub(crate) use macros::*;
