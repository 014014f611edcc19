use agriwiz_core::config::{LogFormat, LoggingConfig};
use anyhow::anyhow;
use tracing::Level;

/// Installs the global subscriber. Logs go to stderr so stdout carries only
/// the command's JSON payload.
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let log_level = config.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let installed = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|error| anyhow!("failed to install tracing subscriber: {error}"))
}
