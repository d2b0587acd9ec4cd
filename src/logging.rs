//! Tracing setup helper for binaries embedding this crate.
//!
//! The crate itself only emits `tracing` events (registration outcomes,
//! match decisions); this module gives embedders a one-call subscriber with
//! env-filter support so those events show up on stderr.
//!
//! # Usage
//!
//! ```rust,ignore
//! hotkey_bridge::logging::init();
//! // RUST_LOG=hotkey_bridge=debug shows lifecycle transitions
//! ```

use tracing_subscriber::EnvFilter;

/// Initialize a stderr subscriber with `RUST_LOG` filtering.
///
/// Defaults to `info` when `RUST_LOG` is unset. Safe to call more than once;
/// later calls are no-ops when a global subscriber is already installed.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
