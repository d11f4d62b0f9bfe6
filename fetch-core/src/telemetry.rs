use tracing::Subscriber;
use tracing::subscriber::{SetGlobalDefaultError, set_global_default};
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

/// Build a subscriber logging to stderr, filtered by `RUST_LOG` if set and
/// by `env_filter` otherwise.
pub fn get_subscriber(env_filter: String) -> impl Subscriber + Sync + Send {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(env_filter));
    let stderr = fmt::Layer::new()
        .with_writer(std::io::stderr)
        .pretty()
        .with_span_events(fmt::format::FmtSpan::CLOSE);
    Registry::default().with(env_filter).with(stderr)
}

/// Register a subscriber as global default to process span data, and
/// forward `log` records to it.
///
/// Fails if a global subscriber was already set.
pub fn init_subscriber(
    subscriber: impl Subscriber + Sync + Send,
) -> Result<(), SetGlobalDefaultError> {
    // Another log bridge may already be installed; tracing still works.
    let _ = LogTracer::init();
    set_global_default(subscriber)
}
