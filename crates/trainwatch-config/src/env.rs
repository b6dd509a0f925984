use std::env;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::ConfigError;

/// `std::env::var` with a default, never failing.
pub fn string(name: &'static str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable via `FromStr`, falling back to `default`
/// when unset; a *present but malformed* value is a fatal configuration
/// error.
pub fn parse<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value.parse().map_err(|err: T::Err| ConfigError::InvalidValue {
            name,
            value,
            source: Box::new(err),
        }),
        Err(_) => Ok(default),
    }
}

/// As [`parse`], but for the loose boolean vocabulary (`decouple`-style)
/// these flags were configured with upstream: `true`/`false`, `1`/`0`,
/// `yes`/`no`, case-insensitive.
pub fn boolean(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Ok(value) => parse_bool(&value).ok_or_else(|| ConfigError::InvalidValue {
            name,
            value: value.clone(),
            source: Box::new(InvalidBool(value)),
        }),
        Err(_) => Ok(default),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug)]
struct InvalidBool(String);

impl Display for InvalidBool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} is not a recognised boolean", self.0)
    }
}

impl std::error::Error for InvalidBool {}
