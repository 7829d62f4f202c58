// camchain_est/src/logging.rs

use tracing_subscriber::EnvFilter;

/// Installs a formatted `tracing` subscriber for the whole process.
///
/// `RUST_LOG` wins over `default_filter` when set. Calling this more than once
/// is harmless; only the first call installs anything.
pub fn init(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_init_is_idempotent() {
        super::init("debug");
        super::init("info");
        tracing::info!("still logging after a second init");
    }
}
