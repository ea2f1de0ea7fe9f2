//! Tracing setup for `trajview` hosts.
//!
//! Ranking, flattening and session changes emit `tracing` events under the
//! `trajview` target. Nothing is printed until a subscriber is installed,
//! either by the host or through [`init_tracing`].

/// Filter used when `RUST_LOG` is unset: pipeline summaries, failures and
/// rejected fetches, nothing per sample.
pub const DEFAULT_FILTER: &str = "trajview=info";

/// Installs a compact stderr subscriber filtered by `RUST_LOG`, falling back
/// to `default_filter`. Stdout is left to JSON output.
///
/// Returns `false` without the `telemetry` feature or when the host already
/// installed a global subscriber.
#[must_use]
pub fn init_tracing(default_filter: &str) -> bool {
    #[cfg(feature = "telemetry")]
    {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .try_init()
            .is_ok()
    }

    #[cfg(not(feature = "telemetry"))]
    {
        let _ = default_filter;
        false
    }
}

/// [`init_tracing`] with [`DEFAULT_FILTER`].
#[must_use]
pub fn init_default_tracing() -> bool {
    init_tracing(DEFAULT_FILTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_refused() {
        let _ = init_default_tracing();
        assert!(!init_tracing("trajview=debug"));
    }
}
