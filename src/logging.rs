use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "MISSIONBOARD_LOG";

/// Logs go to stderr; stdout carries the IPC responses.
pub fn setup_logging() {
    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(filter)
        .init();
}
