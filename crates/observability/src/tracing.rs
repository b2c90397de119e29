//! Process-wide log output: one JSON object per line on stdout.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// `RUST_LOG` if it parses, otherwise [`DEFAULT_DIRECTIVE`].
pub fn env_filter() -> EnvFilter {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(DEFAULT_DIRECTIVE),
    }
}

/// Install the JSON subscriber. Only the first call in a process has any effect.
pub fn init() {
    let installed = tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter())
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init()
        .is_ok();

    if installed {
        ::tracing::debug!(default = DEFAULT_DIRECTIVE, "log subscriber installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }

    #[test]
    fn default_filter_is_info() {
        assert_eq!(EnvFilter::new(DEFAULT_DIRECTIVE).to_string(), "info");
    }
}
