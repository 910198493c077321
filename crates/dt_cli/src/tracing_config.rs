//! Tracing setup for the `detype` binary.
//!
//! ```bash
//! DETYPE_LOG=debug detype strip src/App.tsx
//! DETYPE_LOG="dt_strip=debug,dt_lexer=trace" detype convert src --dry-run
//! ```
//!
//! The subscriber is only installed when `DETYPE_LOG` (or `RUST_LOG`) is set.

use tracing_subscriber::EnvFilter;

/// Build an `EnvFilter` from `DETYPE_LOG`, falling back to `RUST_LOG`.
/// `None` when neither is set.
fn build_filter() -> Option<EnvFilter> {
    if let Ok(val) = std::env::var("DETYPE_LOG") {
        return Some(EnvFilter::builder().parse_lossy(val));
    }
    std::env::var("RUST_LOG")
        .is_ok()
        .then(EnvFilter::from_default_env)
}

/// Install the global subscriber. Output goes to stderr so it never mixes
/// with converted source or JSON on stdout.
pub fn init_tracing() {
    let Some(filter) = build_filter() else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
