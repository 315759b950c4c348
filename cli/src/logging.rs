use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "sustainabot=info,sustainabot_lib=info,sbot_ai=info,sbot_core=info";
const VERBOSE_FILTER: &str = "sustainabot=debug,sustainabot_lib=debug,sbot_ai=debug,sbot_core=debug";

/// Install the stderr subscriber. `RUST_LOG` wins over `verbose`.
///
/// Stdout is reserved for answers so `ask --json` output stays machine-readable.
pub fn init(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
