//! Opt-in tracing bootstrap.
//!
//! The crate only ever emits `tracing` events; it never installs a subscriber
//! on its own. Embedders that do not bring their own subscriber can call
//! [`init_default_tracing`] once at startup.

/// Installs a compact stderr subscriber honoring `RUST_LOG`, falling back to
/// `info` for this crate and `warn` elsewhere.
///
/// Returns `false` when the `telemetry` feature is off or a global subscriber
/// is already registered, so calling it is always safe.
#[must_use]
pub fn init_default_tracing() -> bool {
    #[cfg(feature = "telemetry")]
    {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,chart_overlays=info"));
        return tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .try_init()
            .is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        false
    }
}
