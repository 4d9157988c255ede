use crate::models::backup_row::{SourceKind, UnifiedBackupRow};
use serde::Serialize;
use std::str::FromStr;

/// What a failed source does to the refresh it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// The whole load fails and nothing is rendered
    AbortAll,

    /// The source contributes no rows and the load carries on
    Degrade,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "abort" | "abort_all" => Ok(FailurePolicy::AbortAll),
            "degrade" => Ok(FailurePolicy::Degrade),
            other => Err(format!("expected 'abort' or 'degrade', got '{}'", other)),
        }
    }
}

/// Per-source failure handling for a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AggregationPolicy {
    pub csv: FailurePolicy,
    pub datto: FailurePolicy,
    pub acronis: FailurePolicy,
}

impl AggregationPolicy {
    pub fn for_source(&self, source: SourceKind) -> FailurePolicy {
        match source {
            SourceKind::IDrive => self.csv,
            SourceKind::Datto => self.datto,
            SourceKind::Acronis => self.acronis,
        }
    }
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self {
            csv: FailurePolicy::AbortAll,
            datto: FailurePolicy::Degrade,
            acronis: FailurePolicy::Degrade,
        }
    }
}

/// Outcome of fetching a single source
#[derive(Debug, Clone, PartialEq)]
pub enum SourceResult {
    Ok(Vec<UnifiedBackupRow>),
    Failed(String),
}

/// How one source fared during a refresh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub source: SourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceReport {
    pub fn loaded(source: SourceKind, rows: usize) -> Self {
        Self {
            source,
            rows: Some(rows),
            error: None,
        }
    }

    pub fn failed(source: SourceKind, error: String) -> Self {
        Self {
            source,
            rows: None,
            error: Some(error),
        }
    }
}

/// Rows from every source that survived, in CSV, Datto, Acronis order
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub rows: Vec<UnifiedBackupRow>,
    pub reports: Vec<SourceReport>,
}
