use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Log to stderr so the menu on stdout stays readable.
///
/// `RUST_LOG` directives are honoured; `-v`/`-vv` raise the default level
/// and `-q` lowers it to warnings.
pub fn init(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_line_number(false)
        .init();
}

/// Debug-level subscriber for unit tests; later calls are no-ops.
#[cfg(test)]
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
