//! Tracing subscriber setup. Only the binary calls [`init`].

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter directive for a configured level, e.g. `herosync=debug`.
pub fn default_directive(level: &str) -> String {
    format!("herosync={}", level)
}

/// Installs a stderr subscriber. `RUST_LOG`, when set, wins over `level`.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .with(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_scopes_level_to_this_crate() {
        assert_eq!(default_directive("warn"), "herosync=warn");
        assert!(EnvFilter::try_new(default_directive("debug")).is_ok());
    }
}
