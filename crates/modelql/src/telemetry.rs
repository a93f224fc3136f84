// Tracing initialization for binaries and tests embedding the schema builder.
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub fn init_tracing() {
    init_tracing_with_level("info");
}

/// Installs a fmt subscriber filtered by `RUST_LOG`, or by `level` when
/// `RUST_LOG` is unset or invalid. Does nothing if a global subscriber is
/// already installed.
pub fn init_tracing_with_level(level: &str) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_is_harmless() {
        init_tracing_with_level("debug");
        init_tracing();
        tracing::debug!("tracing initialized");
    }
}
