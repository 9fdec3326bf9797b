//! Log output for the runner. Logs go to stderr so stdout only carries the
//! build result.

use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const RUNNER_CRATES: &[&str] = &["testlink_runner", "testlink_runner_core", "testlink_api"];

/// Filter used when `RUST_LOG` is not set: the runner crates at `info`, or
/// `debug` with `verbose`
pub fn default_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    RUNNER_CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// `RUST_LOG` when set and valid, the default filter otherwise
pub fn build_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)))
}

pub fn init(verbose: bool) {
    tracing_subscriber::registry()
        .with(build_filter(verbose))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .with_thread_ids(false),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(
            default_filter(false),
            "testlink_runner=info,testlink_runner_core=info,testlink_api=info"
        );
        assert_eq!(
            default_filter(true),
            "testlink_runner=debug,testlink_runner_core=debug,testlink_api=debug"
        );
    }
}
