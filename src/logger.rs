use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber for the command-line tool.
///
/// `RUST_LOG` wins over `verbose` when set.
pub fn init_cli_logger(verbose: bool) {
    let default_filter = if verbose {
        "ctd_section=debug,info"
    } else {
        "ctd_section=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A second init (tests, embedding) is not an error worth surfacing
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .compact(),
        )
        .try_init();
}
