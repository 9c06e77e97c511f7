use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogFormat;

/// Install the global subscriber. Logs go to stderr so stdout only carries task lines.
pub fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let base = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true);

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(base.json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(base)
            .init(),
    }
}
