use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber honoring `LOG_LEVEL`. Call once at
/// process start, before anything else logs.
pub fn init(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
