use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the `tracing` filter directives.
pub const LOG_ENV: &str = "REELMARK_LOG";

/// Install a JSON log subscriber on stderr, leaving stdout to command output.
///
/// The filter is read from [`LOG_ENV`] (for example `REELMARK_LOG=reelmark=debug`); without it
/// only errors are logged. Calling this more than once keeps the first subscriber.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(filter_from(std::env::var(LOG_ENV).ok().as_deref()))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(true),
        )
        .try_init();
}

/// Build the filter for `directives`, falling back to `error` when unset or unparseable.
fn filter_from(directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::ERROR.into())
        .parse_lossy(directives.unwrap_or_default())
}
