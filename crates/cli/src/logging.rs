use tracing::Level;
use vendorly_core::config::{AppConfig, LogFormat};

/// Installs the global subscriber. Events go to stderr so stdout carries only
/// command output. A second call is a no-op.
pub fn init_logging(config: &AppConfig) {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    if installed.is_ok() {
        tracing::debug!(
            event_name = "system.logging.initialized",
            level = %log_level,
            format = ?config.logging.format,
            "logging initialized"
        );
    }
}
