use tracing_subscriber::{EnvFilter, FmtSubscriber};

const LOG_ENV: &str = "MONGODB_SLOW_QUERIES_LOG";

/// Directive used when nothing usable is configured.
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// `configured` wins when it parses; otherwise fall back on the verbosity.
fn build_filter(verbose: bool, configured: Option<&str>) -> EnvFilter {
    let fallback = default_directive(verbose);
    configured
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback))
}

/// Logs go to stderr; stdout belongs to the metric lines.
pub fn init_logging(verbose: bool) {
    let configured = std::env::var(LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(build_filter(verbose, configured.as_deref()))
        .with_writer(std::io::stderr)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default subscriber: {err}");
    }
}
