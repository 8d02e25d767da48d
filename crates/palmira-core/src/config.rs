use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
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
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can use a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("PALMIRA_ENV", "development"))
        .map_err(|reason| invalid("PALMIRA_ENV", reason))?;
    let log_level = or_default("PALMIRA_LOG_LEVEL", "info");

    let dane_feed = or_default("PALMIRA_DANE_FEED", "./fixtures/dane.json");
    let camara_feed = or_default("PALMIRA_CAMARA_FEED", "./fixtures/camara_comercio.json");
    let alcaldia_feed = or_default("PALMIRA_ALCALDIA_FEED", "./fixtures/alcaldia.json");
    for (var, value) in [
        ("PALMIRA_DANE_FEED", &dane_feed),
        ("PALMIRA_CAMARA_FEED", &camara_feed),
        ("PALMIRA_ALCALDIA_FEED", &alcaldia_feed),
    ] {
        if value.trim().is_empty() {
            return Err(invalid(var, "feed must be a URL or file path".to_string()));
        }
    }

    let zones_path = lookup("PALMIRA_ZONES_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    let output_dir = PathBuf::from(or_default("PALMIRA_OUTPUT_DIR", "./output"));

    let scraper_request_timeout_secs = parse_u64("PALMIRA_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent =
        or_default("PALMIRA_SCRAPER_USER_AGENT", "palmira/0.1 (market-analyzer)");
    let scraper_max_retries = parse_u32("PALMIRA_SCRAPER_MAX_RETRIES", "3")?;
    let scraper_retry_backoff_base_secs =
        parse_u64("PALMIRA_SCRAPER_RETRY_BACKOFF_BASE_SECS", "5")?;

    let source_timeout_secs = match lookup("PALMIRA_SOURCE_TIMEOUT_SECS") {
        Ok(raw) if !raw.trim().is_empty() => {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| invalid("PALMIRA_SOURCE_TIMEOUT_SECS", e.to_string()))?;
            if secs == 0 {
                return Err(invalid(
                    "PALMIRA_SOURCE_TIMEOUT_SECS",
                    "must be greater than zero; unset it to disable the timeout".to_string(),
                ));
            }
            Some(secs)
        }
        _ => None,
    };

    Ok(AppConfig {
        env,
        log_level,
        dane_feed,
        camara_feed,
        alcaldia_feed,
        zones_path,
        output_dir,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_max_retries,
        scraper_retry_backoff_base_secs,
        source_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns an error string for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, String> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(format!(
            "unknown environment '{other}'; expected development, test, or production"
        )),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
