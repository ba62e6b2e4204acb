//! Logging setup for Sift.
//!
//! Sift only emits `tracing` events; installing a subscriber is up to the
//! application. With the `tracing-subscriber` feature enabled, [`init`] wires
//! one up from the environment:
//!
//! - `SIFT_DEBUG=true|1|yes` - debug-level logging
//! - `SIFT_LOG_LEVEL=trace|debug|info|warn|error` - explicit level
//! - `SIFT_LOG_FORMAT=json|pretty|compact` - output format (default: json)
//!
//! ```rust,no_run
//! use sift_query::logging;
//!
//! logging::init();
//! ```
//!
//! Events emitted by the engine:
//!
//! | Level | Event |
//! |-------|-------|
//! | `debug` | scan start/finish with row counts, degraded clauses |
//! | `trace` | clauses on unknown columns, per-chunk progress |

use std::env;
use std::sync::Once;

use sift_schema::config::DebugConfig;

static INIT: Once = Once::new();

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Whether `SIFT_DEBUG` is set to a truthy value.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("SIFT_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// The effective log level: `SIFT_LOG_LEVEL`, else `debug` under
/// `SIFT_DEBUG`, else `warn`.
pub fn get_log_level() -> &'static str {
    resolve_level(env::var("SIFT_LOG_LEVEL").ok().as_deref(), is_debug_enabled())
}

/// The output format from `SIFT_LOG_FORMAT`, defaulting to `json`.
pub fn get_log_format() -> &'static str {
    env::var("SIFT_LOG_FORMAT")
        .map(|f| match f.to_lowercase().as_str() {
            "pretty" => "pretty",
            "compact" => "compact",
            _ => "json",
        })
        .unwrap_or("json")
}

fn resolve_level(requested: Option<&str>, debug: bool) -> &'static str {
    let fallback = if debug { "debug" } else { "warn" };
    requested
        .map(str::to_lowercase)
        .and_then(|level| LEVELS.into_iter().find(|l| *l == level))
        .unwrap_or(fallback)
}

/// Install a global subscriber from the environment.
///
/// Does nothing unless `SIFT_DEBUG` or `SIFT_LOG_LEVEL` is set; later calls
/// are no-ops.
pub fn init() {
    if !is_debug_enabled() && env::var("SIFT_LOG_LEVEL").is_err() {
        return;
    }
    install(get_log_level());
}

/// Install a global subscriber from a `[debug]` config block.
///
/// `log_level` wins over the environment; with neither set this does nothing.
pub fn init_from_config(config: &DebugConfig) {
    match config_level(config, is_debug_enabled()) {
        Some(level) => install(level),
        None => init(),
    }
}

fn config_level(config: &DebugConfig, debug: bool) -> Option<&'static str> {
    config
        .log_level
        .as_deref()
        .map(|level| resolve_level(Some(level), debug))
}

/// Install a global subscriber at `level`.
///
/// # Safety
///
/// Sets `SIFT_LOG_LEVEL`, which is unsound once other threads may be reading
/// the environment. Call it at startup.
pub fn init_with_level(level: &str) {
    // SAFETY: documented as startup-only.
    unsafe {
        env::set_var("SIFT_LOG_LEVEL", level);
    }
    init();
}

/// Install a global subscriber at debug level.
///
/// # Safety
///
/// Sets `SIFT_DEBUG`; same caveat as [`init_with_level`].
pub fn init_debug() {
    // SAFETY: documented as startup-only.
    unsafe {
        env::set_var("SIFT_DEBUG", "true");
    }
    init();
}

fn install(level: &'static str) {
    INIT.call_once(|| {
        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let directives = format!("sift={level},sift_query={level},sift_schema={level}");
            let filter = EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("warn"));
            let registry = tracing_subscriber::registry().with(filter);

            let installed = match get_log_format() {
                "compact" => registry.with(fmt::layer().compact()).try_init(),
                "pretty" => registry.with(fmt::layer().pretty()).try_init(),
                _ => registry.with(fmt::layer().json()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(level, format = get_log_format(), "sift logging initialized");
            }
        }

        #[cfg(not(feature = "tracing-subscriber"))]
        {
            let _ = level;
        }
    });
}

/// `tracing::trace!`, gated on `SIFT_DEBUG` at runtime.
#[macro_export]
macro_rules! sift_trace {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::trace!($($arg)*);
        }
    };
}
