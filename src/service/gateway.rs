use crate::models::backup_row::{SourceKind, UnifiedBackupRow};
use crate::models::config::{Config, ACRONIS_API_KEY, DATTO_API_KEY};
use crate::models::error::{DashboardError, Result};
use crate::models::vendor::{AcronisBackup, DattoBackup};
use crate::service::normalize::{normalize_acronis, normalize_datto};
use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::fmt;

/// REST providers reached through the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vendor {
    Datto,
    Acronis,
}

impl Vendor {
    pub fn source_kind(&self) -> SourceKind {
        match self {
            Vendor::Datto => SourceKind::Datto,
            Vendor::Acronis => SourceKind::Acronis,
        }
    }

    /// Path segment of the gateway route, `/api/{segment}/backups`
    pub fn path_segment(&self) -> &'static str {
        match self {
            Vendor::Datto => "datto",
            Vendor::Acronis => "acronis",
        }
    }

    fn key_variable(&self) -> &'static str {
        match self {
            Vendor::Datto => DATTO_API_KEY,
            Vendor::Acronis => ACRONIS_API_KEY,
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source_kind())
    }
}

/// Server-side client for one vendor API. Holds the vendor secret so the
/// browser never sees it.
#[derive(Clone)]
pub struct VendorClient {
    vendor: Vendor,
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl VendorClient {
    pub fn new(vendor: Vendor, http: Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            vendor,
            http,
            base_url,
            api_key,
        }
    }

    pub fn from_config(vendor: Vendor, http: Client, config: &Config) -> Self {
        let (base_url, api_key) = match vendor {
            Vendor::Datto => (&config.datto_base_url, &config.datto_api_key),
            Vendor::Acronis => (&config.acronis_base_url, &config.acronis_api_key),
        };
        Self::new(vendor, http, base_url.clone(), api_key.clone())
    }

    fn backups_url(&self) -> String {
        format!("{}/backups", self.base_url.trim_end_matches('/'))
    }

    /// Fetch the vendor's backup list and normalize every record.
    /// One request, no retry, no partial results.
    pub async fn fetch_backups(&self) -> Result<Vec<UnifiedBackupRow>> {
        let provider = self.vendor.source_kind();
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(DashboardError::MissingCredential {
                provider,
                variable: self.vendor.key_variable(),
            })?;

        let url = self.backups_url();
        debug!("Fetching {} backups from {}", self.vendor, url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(api_key)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|cause| DashboardError::Http { provider, cause })?;

        if !response.status().is_success() {
            return Err(DashboardError::UpstreamStatus {
                provider,
                status: response.status().as_u16(),
            });
        }

        let rows = match self.vendor {
            Vendor::Datto => decode::<DattoBackup>(response, provider)
                .await?
                .into_iter()
                .map(normalize_datto)
                .collect::<Vec<_>>(),
            Vendor::Acronis => decode::<AcronisBackup>(response, provider)
                .await?
                .into_iter()
                .map(normalize_acronis)
                .collect::<Vec<_>>(),
        };

        debug!("{} returned {} backups", self.vendor, rows.len());
        Ok(rows)
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: Response,
    provider: SourceKind,
) -> Result<Vec<T>> {
    response
        .json::<Vec<T>>()
        .await
        .map_err(|cause| DashboardError::Decode { provider, cause })
}
