//! Tracing setup for tests.
//!
//! Honors `RUST_LOG` (default `info`) and `LOG_FORMAT=json`. Safe to call
//! from every test; only the first call installs the subscriber.

pub fn init() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();

    let result = if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
    };

    if result.is_err() {
        tracing::trace!("Tracing subscriber already installed");
    }
}
