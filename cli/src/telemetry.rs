//! Log output for the `fanout` binary.
//!
//! Results go to stdout; everything emitted through `tracing` goes to stderr
//! so the two never interleave in a pipe. Verbosity follows `RUST_LOG` and
//! defaults to `info` (per-unit events from the core are at `debug`).

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()?;
    Ok(())
}
