use thiserror::Error;

/// A malformed environment variable — fatal at startup, distinct from the
/// runtime error taxonomy the rest of the workspace uses.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {name} has invalid value {value:?}: {source}")]
    InvalidValue {
        name: &'static str,
        value: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
