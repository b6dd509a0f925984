//! Ambient configuration surface: typed environment variables
//! and `tracing` subscriber setup **(added)**.

mod env;
mod error;
mod logging;
mod settings;

pub use error::ConfigError;
pub use logging::init as init_logging;
pub use settings::{CollectorSettings, GeneratorSettings, MongoSettings, Settings};
