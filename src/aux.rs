pub use tracing::*;
pub use tracing_subscriber;
use tracing_subscriber::{filter::Directive, prelude::*, registry::LookupSpan, EnvFilter, Layer};

/// A boxed tracing [Layer].
pub type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Installs the global subscriber with a single stdout layer. Panics if one
/// is already installed.
pub fn init(directive: Directive) {
    tracing_subscriber::registry()
        .with(stdout(directive))
        .init();
}

/// Builds a new tracing layer that writes to stdout.
///
/// The events are filtered by `default_directive`, unless overridden by
/// `RUST_LOG`. Event targets are hidden with `LOG_TARGET=0`.
pub fn stdout<S>(default_directive: Directive) -> BoxedLayer<S>
where
    S: Subscriber,
    for<'a> S: LookupSpan<'a>,
{
    let with_target = std::env::var("LOG_TARGET")
        .map(|val| val != "0")
        .unwrap_or(true);

    let filter = EnvFilter::builder()
        .with_default_directive(default_directive)
        .from_env_lossy();

    tracing_subscriber::fmt::layer()
        .with_ansi(true)
        .with_target(with_target)
        .with_filter(filter)
        .boxed()
}
