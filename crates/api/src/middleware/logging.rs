//! Logging initialization.
//!
//! JSON output is the default so execution spans (request id, actor,
//! connection id, durations) land in the log pipeline as fields; `pretty`
//! is for local work against a dev store.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Filter directives used when `RUST_LOG` is absent. The remote-engine
/// driver and store internals are noisy at debug, so they are capped at
/// warn while this service's crates follow the configured level.
fn default_directives(level: &str) -> String {
    format!("{level},tiberius=warn,sqlx=warn,rustls=warn")
}

/// Initializes the logging subsystem based on configuration.
pub fn init_logging(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.level)));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "pretty" => {
            let pretty_layer = fmt::layer()
                .pretty()
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true);
            subscriber.with(pretty_layer).init();
        }
        _ => {
            let json_layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_current_span(true)
                .with_target(true);
            subscriber.with(json_layer).init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_cap_driver_noise() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("tiberius=warn"));
        assert!(directives.contains("sqlx=warn"));
    }

    #[test]
    fn test_default_directives_parse_as_filter() {
        assert!(EnvFilter::try_new(default_directives("info")).is_ok());
    }
}
