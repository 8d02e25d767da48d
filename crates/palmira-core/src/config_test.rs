use std::collections::HashMap;
use std::env::VarError;
use std::path::PathBuf;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_is_error() {
    assert!(parse_environment("staging").is_err());
}

#[test]
fn build_app_config_uses_defaults_for_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).expect("defaults should be valid");

    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.dane_feed, "./fixtures/dane.json");
    assert_eq!(cfg.camara_feed, "./fixtures/camara_comercio.json");
    assert_eq!(cfg.alcaldia_feed, "./fixtures/alcaldia.json");
    assert!(cfg.zones_path.is_none());
    assert_eq!(cfg.output_dir, PathBuf::from("./output"));
    assert_eq!(cfg.scraper_request_timeout_secs, 30);
    assert_eq!(cfg.scraper_user_agent, "palmira/0.1 (market-analyzer)");
    assert_eq!(cfg.scraper_max_retries, 3);
    assert_eq!(cfg.scraper_retry_backoff_base_secs, 5);
    assert!(cfg.source_timeout_secs.is_none());
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = HashMap::new();
    map.insert("PALMIRA_ENV", "production");
    map.insert("PALMIRA_DANE_FEED", "https://geoportal.example/dane.json");
    map.insert("PALMIRA_ZONES_PATH", "./config/zones.yaml");
    map.insert("PALMIRA_SCRAPER_MAX_RETRIES", "0");
    map.insert("PALMIRA_SOURCE_TIMEOUT_SECS", "45");

    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Production);
    assert_eq!(cfg.dane_feed, "https://geoportal.example/dane.json");
    assert_eq!(cfg.zones_path, Some(PathBuf::from("./config/zones.yaml")));
    assert_eq!(cfg.scraper_max_retries, 0);
    assert_eq!(cfg.source_timeout_secs, Some(45));
}

#[test]
fn build_app_config_rejects_invalid_retry_count() {
    let mut map = HashMap::new();
    map.insert("PALMIRA_SCRAPER_MAX_RETRIES", "lots");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PALMIRA_SCRAPER_MAX_RETRIES"),
        "expected InvalidEnvVar(PALMIRA_SCRAPER_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_source_timeout() {
    let mut map = HashMap::new();
    map.insert("PALMIRA_SOURCE_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PALMIRA_SOURCE_TIMEOUT_SECS"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_treats_blank_source_timeout_as_unset() {
    let mut map = HashMap::new();
    map.insert("PALMIRA_SOURCE_TIMEOUT_SECS", " ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.source_timeout_secs.is_none());
}

#[test]
fn build_app_config_rejects_blank_feed() {
    let mut map = HashMap::new();
    map.insert("PALMIRA_ALCALDIA_FEED", "");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PALMIRA_ALCALDIA_FEED"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_unknown_environment() {
    let mut map = HashMap::new();
    map.insert("PALMIRA_ENV", "staging");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PALMIRA_ENV"));
}
