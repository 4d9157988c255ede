use crate::models::aggregation::{AggregationPolicy, FailurePolicy};
use crate::models::config_validator::validate_config;
use crate::models::error::{DashboardError, Result};
use log::info;
use std::env;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATTO_BASE_URL: &str = "https://api.datto.com/v1";
pub const DEFAULT_ACRONIS_BASE_URL: &str = "https://api.acronis.com/v2";
pub const DEFAULT_CSV_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vR7ld_Xk6exjhviNdm30N1MKaa7huWDGjtdR5BvQbG9D_-TCWPTRMRlcDK4Sd58f08KcKYDRWhbTVuM/pub?output=csv";

pub const DATTO_API_KEY: &str = "DATTO_API_KEY";
pub const ACRONIS_API_KEY: &str = "ACRONIS_API_KEY";

#[derive(Clone)]
pub struct Config {
    pub datto_api_key: Option<String>,
    pub acronis_api_key: Option<String>,
    pub port: u16,
    pub datto_base_url: String,
    pub acronis_base_url: String,
    pub csv_url: String,
    /// Where the aggregator reaches the gateway routes, normally this process
    pub gateway_base_url: String,
    pub policy: AggregationPolicy,
    pub refresh_on_startup: bool,
}

impl Config {
    /// Build a configuration from a variable lookup. Unset variables fall
    /// back to their defaults; set but malformed ones are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_var(&lookup, "PORT", DEFAULT_PORT)?;

        Ok(Self {
            datto_api_key: non_empty(lookup(DATTO_API_KEY)),
            acronis_api_key: non_empty(lookup(ACRONIS_API_KEY)),
            port,
            datto_base_url: string_var(&lookup, "DATTO_BASE_URL", DEFAULT_DATTO_BASE_URL),
            acronis_base_url: string_var(&lookup, "ACRONIS_BASE_URL", DEFAULT_ACRONIS_BASE_URL),
            csv_url: string_var(&lookup, "CSV_URL", DEFAULT_CSV_URL),
            gateway_base_url: string_var(
                &lookup,
                "GATEWAY_BASE_URL",
                &format!("http://127.0.0.1:{}/api", port),
            ),
            policy: AggregationPolicy {
                csv: parse_var(&lookup, "CSV_FAILURE_POLICY", FailurePolicy::AbortAll)?,
                datto: parse_var(&lookup, "DATTO_FAILURE_POLICY", FailurePolicy::Degrade)?,
                acronis: parse_var(&lookup, "ACRONIS_FAILURE_POLICY", FailurePolicy::Degrade)?,
            },
            refresh_on_startup: parse_var(&lookup, "REFRESH_ON_STARTUP", true)?,
        })
    }
}

// Keys stay out of logs and panics.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("Config")
            .field("datto_api_key", &redact(&self.datto_api_key))
            .field("acronis_api_key", &redact(&self.acronis_api_key))
            .field("port", &self.port)
            .field("datto_base_url", &self.datto_base_url)
            .field("acronis_base_url", &self.acronis_base_url)
            .field("csv_url", &self.csv_url)
            .field("gateway_base_url", &self.gateway_base_url)
            .field("policy", &self.policy)
            .field("refresh_on_startup", &self.refresh_on_startup)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn string_var<F>(lookup: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup(name)).unwrap_or_else(|| default.to_string())
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match non_empty(lookup(name)) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| DashboardError::ConfigParse {
                name,
                value: value.clone(),
                reason: e.to_string(),
            }),
    }
}

/// Read and validate the configuration from the process environment
pub fn setup_config() -> Result<Config> {
    info!("Loading configuration from environment");

    let config = Config::from_lookup(|name| env::var(name).ok())?;

    validate_config(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_load_config_with_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.datto_api_key, None);
        assert_eq!(config.acronis_api_key, None);
        assert_eq!(config.datto_base_url, DEFAULT_DATTO_BASE_URL);
        assert_eq!(config.acronis_base_url, DEFAULT_ACRONIS_BASE_URL);
        assert_eq!(config.csv_url, DEFAULT_CSV_URL);
        assert_eq!(config.gateway_base_url, "http://127.0.0.1:3000/api");
        assert_eq!(config.policy, AggregationPolicy::default());
        assert!(config.refresh_on_startup);
    }

    #[test]
    fn test_load_config_with_all_fields() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATTO_API_KEY", "datto-secret"),
            ("ACRONIS_API_KEY", "acronis-secret"),
            ("PORT", "8080"),
            ("DATTO_BASE_URL", "http://datto.test/v1"),
            ("ACRONIS_BASE_URL", "http://acronis.test/v2"),
            ("CSV_URL", "http://sheets.test/feed.csv"),
            ("GATEWAY_BASE_URL", "http://gateway.test/api"),
            ("CSV_FAILURE_POLICY", "degrade"),
            ("DATTO_FAILURE_POLICY", "abort"),
            ("REFRESH_ON_STARTUP", "false"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.datto_api_key.as_deref(), Some("datto-secret"));
        assert_eq!(config.acronis_api_key.as_deref(), Some("acronis-secret"));
        assert_eq!(config.csv_url, "http://sheets.test/feed.csv");
        assert_eq!(config.gateway_base_url, "http://gateway.test/api");
        assert_eq!(config.policy.csv, FailurePolicy::Degrade);
        assert_eq!(config.policy.datto, FailurePolicy::AbortAll);
        assert_eq!(config.policy.acronis, FailurePolicy::Degrade);
        assert!(!config.refresh_on_startup);
    }

    #[test]
    fn test_gateway_url_follows_port() {
        let config = Config::from_lookup(lookup_from(&[("PORT", "4100")])).unwrap();
        assert_eq!(config.gateway_base_url, "http://127.0.0.1:4100/api");
    }

    #[test]
    fn test_blank_api_key_is_treated_as_missing() {
        let config = Config::from_lookup(lookup_from(&[("DATTO_API_KEY", "  ")])).unwrap();
        assert_eq!(config.datto_api_key, None);
    }

    #[test]
    fn test_error_on_invalid_port() {
        let result = Config::from_lookup(lookup_from(&[("PORT", "eighty")]));

        match result {
            Err(DashboardError::ConfigParse { name, value, .. }) => {
                assert_eq!(name, "PORT");
                assert_eq!(value, "eighty");
            }
            other => panic!("Expected ConfigParse error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_on_invalid_failure_policy() {
        let result = Config::from_lookup(lookup_from(&[("ACRONIS_FAILURE_POLICY", "retry")]));
        assert!(matches!(
            result,
            Err(DashboardError::ConfigParse {
                name: "ACRONIS_FAILURE_POLICY",
                ..
            })
        ));
    }

    #[test]
    fn test_debug_output_redacts_keys() {
        let config = Config::from_lookup(lookup_from(&[("DATTO_API_KEY", "datto-secret")])).unwrap();
        let printed = format!("{:?}", config);

        assert!(!printed.contains("datto-secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    #[serial]
    fn test_setup_config_reads_process_environment() {
        env::set_var("PORT", "3999");
        env::set_var("ACRONIS_API_KEY", "from-env");

        let config = setup_config().unwrap();

        env::remove_var("PORT");
        env::remove_var("ACRONIS_API_KEY");

        assert_eq!(config.port, 3999);
        assert_eq!(config.acronis_api_key.as_deref(), Some("from-env"));
    }
}
