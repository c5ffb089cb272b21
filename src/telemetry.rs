//! Log output for the `calver` binary and for hosts running batches in-process.
//!
//! Batch progress, skipped files and excluded fixations are reported through
//! `tracing` events on stderr, leaving stdout to the run summary or the
//! `--json` report. The level defaults to `info` and follows `RUST_LOG`.
//! Hosts with their own subscriber simply never call `init_default_tracing`.

/// Initializes a default `tracing` subscriber when the `telemetry` feature is enabled.
///
/// Returns `true` when initialization succeeds.
/// Returns `false` when no initialization is performed (feature disabled) or if a
/// global subscriber was already set by the host application.
#[must_use]
pub fn init_default_tracing() -> bool {
    #[cfg(feature = "telemetry")]
    {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact();

        return builder.try_init().is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::init_default_tracing;

    #[test]
    fn second_initialization_is_a_no_op() {
        let _ = init_default_tracing();
        assert!(!init_default_tracing());
    }
}
