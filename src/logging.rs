use tracing::{Dispatch, Level};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Builds the process logger.
///
/// INFO and below are written to stdout, WARN and ERROR to stderr. `RUST_LOG`
/// takes precedence over `default_filter`. The returned dispatch is attached
/// to futures explicitly instead of being installed as the global default.
pub fn dispatch(default_filter: &str) -> anyhow::Result<Dispatch> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)?,
    };
    let writer = std::io::stderr
        .with_max_level(Level::WARN)
        .or_else(std::io::stdout);
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .finish();
    Ok(Dispatch::new(subscriber))
}
