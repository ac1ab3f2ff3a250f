use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber once. `RUST_LOG` sets the filter (default
/// `info`); `LOG_FORMAT=json` switches to JSON lines. Logs go to stderr so
/// command output on stdout stays clean.
pub fn init_tracing() {
    static INSTALLED: OnceLock<()> = OnceLock::new();

    INSTALLED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let json = std::env::var("LOG_FORMAT")
            .map(|value| value.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false);

        let result = if json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
        if let Err(err) = result {
            eprintln!("tracing subscriber already installed: {err}");
        }
    });
}
