//! Tracing subscriber setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise only this crate logs, at `level`.
/// Returns `false` if a subscriber was already installed.
pub fn init(level: &str) -> bool {
    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
        .is_ok()
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| format!("kurs={}", level)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_defaults_to_crate_level() {
        if std::env::var("RUST_LOG").is_err() {
            assert_eq!(env_filter("warn").to_string(), "kurs=warn");
        }
    }

    #[test]
    fn test_scoped_subscriber_accepts_events() {
        let subscriber = tracing_subscriber::registry()
            .with(env_filter("debug"))
            .with(tracing_subscriber::fmt::layer().with_test_writer());

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("scoped subscriber installed");
        });
    }
}
