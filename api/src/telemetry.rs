use tracing::Subscriber;
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

/// Compose the tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn get_subscriber(
    default_filter: String,
) -> impl Subscriber + Send + Sync {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
}

/// Register the subscriber globally and redirect `log` events into it.
/// Should only be called once.
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) {
    LogTracer::init().expect("failed to set logger");
    tracing::subscriber::set_global_default(subscriber)
        .expect("failed to set subscriber");
}
