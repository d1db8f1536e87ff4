use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if any value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if any value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| parse_var::<u32>(var, &or_default(var, default));
    let parse_u64 = |var: &str, default: &str| parse_var::<u64>(var, &or_default(var, default));

    let env = parse_environment(&or_default("SHOPSNAP_ENV", "development"))?;
    let bind_addr = parse_var::<SocketAddr>(
        "SHOPSNAP_BIND_ADDR",
        &or_default("SHOPSNAP_BIND_ADDR", "0.0.0.0:3000"),
    )?;
    let log_level = or_default("SHOPSNAP_LOG_LEVEL", "info");
    let export_dir = PathBuf::from(or_default("SHOPSNAP_EXPORT_DIR", "./exports"));

    let scraper_request_timeout_secs = parse_u64("SHOPSNAP_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default(
        "SHOPSNAP_SCRAPER_USER_AGENT",
        "shopsnap/0.1 (catalogue-export)",
    );
    let scraper_max_concurrent_requests = parse_var::<usize>(
        "SHOPSNAP_SCRAPER_MAX_CONCURRENT_REQUESTS",
        &or_default("SHOPSNAP_SCRAPER_MAX_CONCURRENT_REQUESTS", "8"),
    )?;
    if scraper_max_concurrent_requests == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SHOPSNAP_SCRAPER_MAX_CONCURRENT_REQUESTS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let scraper_task_timeout_secs = parse_u64("SHOPSNAP_SCRAPER_TASK_TIMEOUT_SECS", "45")?;
    let scraper_max_retries = parse_u32("SHOPSNAP_SCRAPER_MAX_RETRIES", "2")?;
    let scraper_retry_backoff_base_secs =
        parse_u64("SHOPSNAP_SCRAPER_RETRY_BACKOFF_BASE_SECS", "1")?;
    let scraper_strict_variants = parse_bool(
        "SHOPSNAP_SCRAPER_STRICT_VARIANTS",
        &or_default("SHOPSNAP_SCRAPER_STRICT_VARIANTS", "false"),
    )?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        export_dir,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_max_concurrent_requests,
        scraper_task_timeout_secs,
        scraper_max_retries,
        scraper_retry_backoff_base_secs,
        scraper_strict_variants,
    })
}

fn parse_var<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: e.to_string(),
    })
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got \"{other}\""),
        }),
    }
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SHOPSNAP_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
