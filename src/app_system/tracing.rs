use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Output goes to stderr so it never mixes
/// with the console on stdout. `RUST_LOG` overrides the default `info` level.
pub fn setup_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}
