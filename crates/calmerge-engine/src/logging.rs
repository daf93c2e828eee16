//! Tracing bootstrap.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing with an `EnvFilter` (honoring `RUST_LOG`, defaulting
/// to `info`) and fmt output.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
