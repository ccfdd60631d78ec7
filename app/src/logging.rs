use tracing_subscriber::EnvFilter;

/// Initialise logging.
///
/// The default level is `info`, or `debug` with `debug` set. `RUST_LOG`
/// overrides either.
pub fn init(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
