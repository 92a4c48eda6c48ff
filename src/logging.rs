use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the crate's log level when `RUST_LOG` is unset
pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";

/// Filter directive used when `RUST_LOG` is not set
pub fn default_directive(level: Option<&str>) -> String {
    let level = level
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or("info")
        .to_lowercase();
    format!("chatpilot={}", level)
}

/// Install the process-wide subscriber
///
/// Logs go to stderr so stdout only carries the transcript. Calling this more
/// than once keeps the first subscriber.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var(LOG_LEVEL_VAR).ok();
        EnvFilter::new(default_directive(level.as_deref()))
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
