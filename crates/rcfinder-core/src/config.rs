use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let provider_api_url = require("RCFINDER_PROVIDER_API_URL")?;

    let env = parse_environment(&or_default("RCFINDER_ENV", "development"));

    let bind_addr = parse_addr("RCFINDER_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("RCFINDER_LOG_LEVEL", "info");
    let regions_path = PathBuf::from(or_default("RCFINDER_REGIONS_PATH", "./config/regions.yaml"));
    let boundaries_path = PathBuf::from(or_default(
        "RCFINDER_BOUNDARIES_PATH",
        "./config/boundaries.geojson",
    ));

    let http_request_timeout_secs = parse_u64("RCFINDER_HTTP_REQUEST_TIMEOUT_SECS", "30")?;
    let http_user_agent = or_default("RCFINDER_HTTP_USER_AGENT", "rcfinder/0.1 (service-locator)");
    let http_max_retries = parse_u32("RCFINDER_HTTP_MAX_RETRIES", "3")?;
    let http_retry_backoff_base_secs = parse_u64("RCFINDER_HTTP_RETRY_BACKOFF_BASE_SECS", "1")?;

    let search_debounce_ms = parse_u64("RCFINDER_SEARCH_DEBOUNCE_MS", "300")?;
    let search_cache_ttl_secs = parse_u64("RCFINDER_SEARCH_CACHE_TTL_SECS", "300")?;
    let search_cache_capacity = parse_usize("RCFINDER_SEARCH_CACHE_CAPACITY", "64")?;

    let locate_max_attempts = parse_u32("RCFINDER_LOCATE_MAX_ATTEMPTS", "3")?;
    let locate_retry_delay_ms = parse_u64("RCFINDER_LOCATE_RETRY_DELAY_MS", "1000")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        regions_path,
        boundaries_path,
        provider_api_url,
        http_request_timeout_secs,
        http_user_agent,
        http_max_retries,
        http_retry_backoff_base_secs,
        search_debounce_ms,
        search_cache_ttl_secs,
        search_cache_capacity,
        locate_max_attempts,
        locate_retry_delay_ms,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
