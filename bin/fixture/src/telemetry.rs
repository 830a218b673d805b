//! Telemetry initializers.

/// Initialize the tracing subscriber, honoring `RUST_LOG` when provided.
pub(crate) fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
