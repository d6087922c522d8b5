//! Tracing and logging setup shared by the libraries and the migrator binary.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use self::tracing::{LogFormat, TracingSettings};

/// Initialize process-wide tracing with defaults (`RUST_LOG`, JSON output).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Initialize process-wide tracing from explicit settings.
///
/// Same idempotency rules as [`init`].
pub fn init_with(settings: &TracingSettings) {
    tracing::init_with(settings);
}
