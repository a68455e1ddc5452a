use tracing_subscriber::{EnvFilter, Layer, prelude::*, registry::LookupSpan};

pub type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Initialize tracing output for the CLI.
///
/// `RUST_LOG` controls the filter (default `info`); set
/// `RUST_LOG_FORMAT=json` for line-delimited JSON output.
pub fn init_observability() {
    tracing_subscriber::registry().with(vec![stdout()]).init();
}

fn stdout<S>() -> BoxedLayer<S>
where
    S: tracing::Subscriber,
    for<'a> S: LookupSpan<'a>,
{
    let log_env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_fmt = std::env::var("RUST_LOG_FORMAT")
        .map(|val| val == "json")
        .unwrap_or(false);

    if json_fmt {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .json()
            .with_filter(log_env_filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_filter(log_env_filter)
            .boxed()
    }
}
