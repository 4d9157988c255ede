use crate::models::aggregation::Aggregation;
use crate::models::api::RefreshResponse;
use crate::models::config::Config;
use crate::models::error::Result;
use crate::models::view::{DashboardView, FilterCriteria, Snapshot, SortSpec};
use crate::service::aggregate::load_all;
use crate::service::gateway::{Vendor, VendorClient};
use crate::service::sources::{CsvFeedSource, GatewaySource};
use chrono::Utc;
use log::{debug, info};
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Result of the newest refresh that completed
#[derive(Debug, Clone)]
pub enum DashboardData {
    /// Nothing has completed yet
    Empty,
    Loaded(Snapshot),
    /// The load aborted; holds the error shown instead of rows
    Failed(String),
}

/// Why no view can be built right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUnavailable {
    NotLoaded,
    RefreshFailed(String),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Startup configuration, read once from the environment
    config: Arc<Config>,

    /// Pooled HTTP client shared by every outbound call
    http: Client,

    /// Newest refresh generation that has been started
    generation: Arc<AtomicU64>,

    /// Outcome of the newest completed refresh
    dashboard: Arc<Mutex<DashboardData>>,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            http: Client::new(),
            generation: Arc::new(AtomicU64::new(0)),
            dashboard: Arc::new(Mutex::new(DashboardData::Empty)),
        }
    }

    fn dashboard(&self) -> MutexGuard<'_, DashboardData> {
        self.dashboard
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Client the gateway routes use to call a vendor
    pub fn vendor_client(&self, vendor: Vendor) -> VendorClient {
        VendorClient::from_config(vendor, self.http.clone(), &self.config)
    }

    fn csv_source(&self) -> CsvFeedSource {
        CsvFeedSource::new(self.http.clone(), self.config.csv_url.clone())
    }

    fn gateway_source(&self, vendor: Vendor) -> GatewaySource {
        GatewaySource::new(vendor, self.http.clone(), &self.config.gateway_base_url)
    }

    /// Start a refresh and return its generation
    pub fn begin_refresh(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish the outcome of refresh `generation`. Returns false and drops
    /// the outcome when a newer refresh has been started since.
    pub fn complete_refresh(&self, generation: u64, outcome: &Result<Aggregation>) -> bool {
        let mut dashboard = self.dashboard();

        let latest = self.generation.load(Ordering::SeqCst);
        if generation != latest {
            debug!(
                "Discarding refresh {} because refresh {} superseded it",
                generation, latest
            );
            return false;
        }

        *dashboard = match outcome {
            Ok(aggregation) => DashboardData::Loaded(Snapshot {
                generation,
                rows: aggregation.rows.clone(),
                loaded_at: Utc::now(),
                reports: aggregation.reports.clone(),
            }),
            Err(e) => DashboardData::Failed(e.to_string()),
        };
        true
    }

    /// Run one refresh cycle against all three sources and publish it.
    /// An aborted load is returned as the error after being recorded.
    pub async fn refresh(&self) -> Result<RefreshResponse> {
        let generation = self.begin_refresh();
        info!("Starting refresh {}", generation);

        let outcome = load_all(
            &self.csv_source(),
            &self.gateway_source(Vendor::Datto),
            &self.gateway_source(Vendor::Acronis),
            &self.config.policy,
        )
        .await;

        if !self.complete_refresh(generation, &outcome) {
            return Ok(RefreshResponse {
                success: false,
                message: format!("Refresh {} was superseded by a newer refresh", generation),
                generation,
                row_count: 0,
                sources: Vec::new(),
            });
        }

        let aggregation = outcome?;
        info!(
            "Refresh {} completed with {} rows",
            generation,
            aggregation.rows.len()
        );

        Ok(RefreshResponse {
            success: true,
            message: format!("Loaded {} backup rows", aggregation.rows.len()),
            generation,
            row_count: aggregation.rows.len(),
            sources: aggregation.reports,
        })
    }

    /// Build the dashboard view of the current snapshot
    pub fn view(
        &self,
        criteria: FilterCriteria,
        sort: Option<SortSpec>,
    ) -> std::result::Result<DashboardView, ViewUnavailable> {
        match &*self.dashboard() {
            DashboardData::Empty => Err(ViewUnavailable::NotLoaded),
            DashboardData::Failed(message) => {
                Err(ViewUnavailable::RefreshFailed(message.clone()))
            }
            DashboardData::Loaded(snapshot) => {
                Ok(DashboardView::build(snapshot, criteria, sort, Utc::now()))
            }
        }
    }
}
