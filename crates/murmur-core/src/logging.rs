//! Tracing setup for hosts embedding the overlay.

/// Install the global tracing subscriber.
///
/// Honors `RUST_LOG` when set, defaulting to `info`. Call once at host
/// startup; a second call is a silent no-op so embedded use and tests
/// never fight over the global subscriber.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
