use crate::models::aggregation::SourceReport;
use crate::models::backup_row::{BackupStatus, SourceKind, UnifiedBackupRow};
use crate::models::error::{DashboardError, Result};
use chrono::{DateTime, Utc};
use rocket::FromForm;
use serde::Serialize;
use std::str::FromStr;

/// Lookback window applied to each row's start time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    #[default]
    All,
    LastDays(u32),
}

impl DateRange {
    pub fn window(&self) -> Option<chrono::Duration> {
        match self {
            DateRange::All => None,
            DateRange::LastDays(days) => Some(chrono::Duration::days(i64::from(*days))),
        }
    }

    /// Value of the `range` query parameter that selects this range
    pub fn as_query_value(&self) -> String {
        match self {
            DateRange::All => "all".to_string(),
            DateRange::LastDays(days) => days.to_string(),
        }
    }
}

impl FromStr for DateRange {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        if value.eq_ignore_ascii_case("all") {
            return Ok(DateRange::All);
        }
        match value.parse::<u32>() {
            Ok(0) | Err(_) => Err(format!(
                "expected 'all' or a positive number of days, got '{}'",
                value
            )),
            Ok(days) => Ok(DateRange::LastDays(days)),
        }
    }
}

/// Row filters, ANDed together. `None` disables a filter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterCriteria {
    pub status: Option<BackupStatus>,
    pub device: Option<String>,
    pub source: Option<SourceKind>,
    pub range: DateRange,
}

/// Sortable table columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Status,
    Device,
    Source,
    Start,
    BackedUp,
    Failed,
    Considered,
}

impl SortKey {
    pub const ALL: [SortKey; 7] = [
        SortKey::Status,
        SortKey::Device,
        SortKey::Source,
        SortKey::Start,
        SortKey::BackedUp,
        SortKey::Failed,
        SortKey::Considered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Status => "status",
            SortKey::Device => "device",
            SortKey::Source => "source",
            SortKey::Start => "start",
            SortKey::BackedUp => "backedUp",
            SortKey::Failed => "failed",
            SortKey::Considered => "considered",
        }
    }

    /// Column heading on the dashboard
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Status => "Status",
            SortKey::Device => "Computer Name",
            SortKey::Source => "Source",
            SortKey::Start => "Backup Start Time",
            SortKey::BackedUp => "Files Backed Up",
            SortKey::Failed => "Files Failed",
            SortKey::Considered => "Files Considered",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str() == value)
            .ok_or_else(|| format!("unknown sort column '{}'", value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("expected 'asc' or 'desc', got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Asc,
        }
    }

    /// Sort selected by clicking `key`'s column header while `current` is
    /// active: the same column flips direction, another column starts
    /// ascending.
    pub fn toggle(current: Option<SortSpec>, key: SortKey) -> SortSpec {
        match current {
            Some(spec) if spec.key == key => SortSpec {
                key,
                direction: spec.direction.reversed(),
            },
            _ => SortSpec::ascending(key),
        }
    }
}

/// Counts shown on the summary cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    pub total: usize,
    pub successful: usize,
    pub warning: usize,
    pub failed: usize,
}

/// Query string accepted by `/api/view` and `/dashboard`
#[derive(Debug, Clone, Default, FromForm)]
pub struct ViewQuery {
    pub status: Option<String>,
    pub device: Option<String>,
    pub source: Option<String>,
    pub range: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(name: &'static str) -> impl FnOnce(String) -> DashboardError {
    move |reason| DashboardError::InvalidQuery { name, reason }
}

impl ViewQuery {
    pub fn criteria(&self) -> Result<FilterCriteria> {
        Ok(FilterCriteria {
            status: present(&self.status).map(BackupStatus::from),
            device: present(&self.device).map(str::to_string),
            source: present(&self.source)
                .map(|s| s.parse::<SourceKind>().map_err(invalid("source")))
                .transpose()?,
            range: present(&self.range)
                .map(|r| r.parse::<DateRange>().map_err(invalid("range")))
                .transpose()?
                .unwrap_or_default(),
        })
    }

    /// `dir` is ignored unless `sort` names a column
    pub fn sort_spec(&self) -> Result<Option<SortSpec>> {
        let Some(key) = present(&self.sort) else {
            return Ok(None);
        };
        let key = key.parse::<SortKey>().map_err(invalid("sort"))?;
        let direction = present(&self.dir)
            .map(|d| d.parse::<SortDirection>().map_err(invalid("dir")))
            .transpose()?
            .unwrap_or_default();

        Ok(Some(SortSpec { key, direction }))
    }
}

/// Rows published by one successful refresh
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub generation: u64,
    pub rows: Vec<UnifiedBackupRow>,
    pub loaded_at: DateTime<Utc>,
    pub reports: Vec<SourceReport>,
}

/// Everything the presentation layer needs for one render. Built from a
/// snapshot and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub generation: u64,
    pub loaded_at: String,
    pub criteria: FilterCriteria,
    pub sort: Option<SortSpec>,
    pub summary: Summary,
    pub devices: Vec<String>,
    pub sources: Vec<SourceKind>,
    /// Per-source outcome of the refresh that produced the snapshot
    pub reports: Vec<SourceReport>,
    pub rows: Vec<UnifiedBackupRow>,
}
