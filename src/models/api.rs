use crate::models::aggregation::SourceReport;
use serde::{Deserialize, Serialize};

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Response for POST /api/refresh
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub message: String,
    pub generation: u64,
    pub row_count: usize,
    pub sources: Vec<SourceReport>,
}
