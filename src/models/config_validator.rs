use crate::models::config::{Config, ACRONIS_API_KEY, DATTO_API_KEY};
use crate::models::error::{DashboardError, Result};
use log::{info, warn};
use reqwest::Url;

/// Validates the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    info!("Validating configuration...");

    validate_url("DATTO_BASE_URL", &config.datto_base_url)?;
    validate_url("ACRONIS_BASE_URL", &config.acronis_base_url)?;
    validate_url("CSV_URL", &config.csv_url)?;
    validate_url("GATEWAY_BASE_URL", &config.gateway_base_url)?;

    // Missing keys only fail the gateway request that needs them
    if config.datto_api_key.is_none() {
        warn!("{} is not set; Datto requests will fail", DATTO_API_KEY);
    }
    if config.acronis_api_key.is_none() {
        warn!("{} is not set; Acronis requests will fail", ACRONIS_API_KEY);
    }

    info!("Configuration validation passed");
    Ok(())
}

/// Require an absolute http(s) URL
fn validate_url(name: &'static str, url: &str) -> Result<()> {
    let parsed = Url::parse(url).map_err(|e| DashboardError::InvalidUrl {
        name,
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(DashboardError::InvalidUrl {
            name,
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", scheme),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::aggregation::AggregationPolicy;

    #[test]
    fn test_accepts_default_configuration() {
        let config = create_test_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_missing_keys_do_not_fail_validation() {
        let mut config = create_test_config();
        config.datto_api_key = None;
        config.acronis_api_key = None;

        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_rejects_relative_url() {
        let mut config = create_test_config();
        config.csv_url = "feed.csv".to_string();

        let result = validate_config(&config);
        match result {
            Err(DashboardError::InvalidUrl { name, .. }) => assert_eq!(name, "CSV_URL"),
            other => panic!("Expected InvalidUrl error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let mut config = create_test_config();
        config.datto_base_url = "ftp://api.datto.com/v1".to_string();

        let result = validate_config(&config);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("unsupported scheme 'ftp'"));
    }

    fn create_test_config() -> Config {
        Config {
            datto_api_key: Some("datto".to_string()),
            acronis_api_key: Some("acronis".to_string()),
            port: 3000,
            datto_base_url: "https://api.datto.com/v1".to_string(),
            acronis_base_url: "https://api.acronis.com/v2".to_string(),
            csv_url: "https://sheets.example.com/pub?output=csv".to_string(),
            gateway_base_url: "http://127.0.0.1:3000/api".to_string(),
            policy: AggregationPolicy::default(),
            refresh_on_startup: false,
        }
    }
}
