//! Flow graph compiler CLI.
//!
//! Loads a JSON graph document, compiles it with [`flow_compile`], and either
//! writes the resulting unit (as a listing, JSON, or bincode) or runs it on
//! the reference machine with a scripted host.
//!
//! The binary in `main.rs` only dispatches to [`commands`].

pub mod commands;
pub mod document;
pub mod options;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing subscriber for debug output.
///
/// Call this once at startup. Uses `RUST_LOG` environment variable for
/// filtering. Example: `RUST_LOG=flow_compile=trace flowc compile graph.json`
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .with(filter)
                .init();
        }
    });
}
