use crate::models::backup_row::{SourceKind, UnifiedBackupRow};
use crate::models::error::{DashboardError, Result};
use crate::service::gateway::Vendor;
use crate::service::normalize::normalize_csv;
use log::debug;
use reqwest::Client;
use std::future::Future;

/// Something the aggregator can pull unified rows from
pub trait RowSource {
    fn kind(&self) -> SourceKind;

    fn fetch(&self) -> impl Future<Output = Result<Vec<UnifiedBackupRow>>> + Send;
}

/// The published IDrive spreadsheet, downloaded and parsed directly
#[derive(Debug, Clone)]
pub struct CsvFeedSource {
    http: Client,
    url: String,
}

impl CsvFeedSource {
    pub fn new(http: Client, url: String) -> Self {
        Self { http, url }
    }
}

impl RowSource for CsvFeedSource {
    fn kind(&self) -> SourceKind {
        SourceKind::IDrive
    }

    async fn fetch(&self) -> Result<Vec<UnifiedBackupRow>> {
        let provider = self.kind();
        debug!("Downloading CSV feed from {}", self.url);

        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|cause| DashboardError::Http { provider, cause })?;

        if !response.status().is_success() {
            return Err(DashboardError::UpstreamStatus {
                provider,
                status: response.status().as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|cause| DashboardError::Decode { provider, cause })?;

        parse_csv_feed(&body)
    }
}

/// Parse a CSV document with a header row. Any malformed record fails the
/// whole feed.
pub fn parse_csv_feed(body: &str) -> Result<Vec<UnifiedBackupRow>> {
    let csv_error = |cause| DashboardError::CsvParse {
        provider: SourceKind::IDrive,
        cause,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body.as_bytes());

    let headers = reader.headers().map_err(csv_error)?.clone();
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        rows.push(normalize_csv(&headers, &record));
    }

    Ok(rows)
}

/// One of the gateway's `/api/{vendor}/backups` routes, which already
/// answer with unified rows
#[derive(Debug, Clone)]
pub struct GatewaySource {
    vendor: Vendor,
    http: Client,
    url: String,
}

impl GatewaySource {
    pub fn new(vendor: Vendor, http: Client, gateway_base_url: &str) -> Self {
        let url = format!(
            "{}/{}/backups",
            gateway_base_url.trim_end_matches('/'),
            vendor.path_segment()
        );
        Self { vendor, http, url }
    }
}

impl RowSource for GatewaySource {
    fn kind(&self) -> SourceKind {
        self.vendor.source_kind()
    }

    async fn fetch(&self) -> Result<Vec<UnifiedBackupRow>> {
        let provider = self.kind();
        debug!("Fetching {} rows from gateway {}", provider, self.url);

        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|cause| DashboardError::Http { provider, cause })?;

        if !response.status().is_success() {
            return Err(DashboardError::UpstreamStatus {
                provider,
                status: response.status().as_u16(),
            });
        }

        response
            .json::<Vec<UnifiedBackupRow>>()
            .await
            .map_err(|cause| DashboardError::Decode { provider, cause })
    }
}
