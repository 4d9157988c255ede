use crate::models::backup_row::{BackupStatus, SourceKind, UnifiedBackupRow};
use crate::models::view::{
    DashboardView, FilterCriteria, Snapshot, SortDirection, SortKey, SortSpec, Summary,
};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Filter and sort `rows` as of `now`. The input is left untouched; without
/// a sort the aggregation order is kept.
pub fn apply(
    rows: &[UnifiedBackupRow],
    criteria: &FilterCriteria,
    sort: Option<SortSpec>,
    now: DateTime<Utc>,
) -> Vec<UnifiedBackupRow> {
    let mut view: Vec<UnifiedBackupRow> = rows
        .iter()
        .filter(|row| row_matches(row, criteria, now))
        .cloned()
        .collect();

    if let Some(spec) = sort {
        // stable: equal rows keep their relative order
        view.sort_by(|a, b| compare_rows(a, b, spec));
    }

    view
}

pub fn row_matches(row: &UnifiedBackupRow, criteria: &FilterCriteria, now: DateTime<Utc>) -> bool {
    let status_ok = criteria
        .status
        .as_ref()
        .map_or(true, |status| &row.status == status);
    let device_ok = criteria
        .device
        .as_deref()
        .map_or(true, |device| row.computer_name == device);
    let source_ok = criteria.source.map_or(true, |source| row.source == source);
    let date_ok = match criteria.range.window() {
        None => true,
        Some(window) => row
            .start_timestamp()
            .is_some_and(|started| now.signed_duration_since(started) <= window),
    };

    status_ok && device_ok && source_ok && date_ok
}

fn compare_rows(a: &UnifiedBackupRow, b: &UnifiedBackupRow, spec: SortSpec) -> Ordering {
    let ordering = match spec.key {
        SortKey::Status => locale_cmp(a.status.as_str(), b.status.as_str()),
        SortKey::Device => locale_cmp(&a.computer_name, &b.computer_name),
        SortKey::Source => locale_cmp(a.source.as_str(), b.source.as_str()),
        SortKey::Start => start_millis(a).cmp(&start_millis(b)),
        SortKey::BackedUp => a.files_backed_up.cmp(&b.files_backed_up),
        SortKey::Failed => a.files_failed.cmp(&b.files_failed),
        SortKey::Considered => a.files_considered.cmp(&b.files_considered),
    };

    match spec.direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Unparseable start times sort as the epoch
fn start_millis(row: &UnifiedBackupRow) -> i64 {
    row.start_timestamp()
        .map(|started| started.timestamp_millis())
        .unwrap_or(0)
}

/// Case-insensitive comparison; on a case-only difference lowercase sorts
/// first ("a" < "A" < "b").
fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

pub fn summarize(rows: &[UnifiedBackupRow]) -> Summary {
    let count = |status: BackupStatus| rows.iter().filter(|r| r.status == status).count();

    Summary {
        total: rows.len(),
        successful: count(BackupStatus::Successful),
        warning: count(BackupStatus::Warning),
        failed: count(BackupStatus::Failed),
    }
}

/// Distinct non-empty device names, sorted
pub fn device_options(rows: &[UnifiedBackupRow]) -> Vec<String> {
    rows.iter()
        .map(|r| r.computer_name.as_str())
        .filter(|name| !name.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Distinct sources present, sorted by name
pub fn source_options(rows: &[UnifiedBackupRow]) -> Vec<SourceKind> {
    let mut sources: Vec<SourceKind> = rows
        .iter()
        .map(|r| r.source)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    sources.sort_by_key(|s| s.as_str());
    sources
}

impl DashboardView {
    /// Render-ready view of a snapshot. Option lists cover the whole
    /// snapshot, the summary only the filtered rows.
    pub fn build(
        snapshot: &Snapshot,
        criteria: FilterCriteria,
        sort: Option<SortSpec>,
        now: DateTime<Utc>,
    ) -> Self {
        let view_rows = apply(&snapshot.rows, &criteria, sort, now);

        Self {
            generation: snapshot.generation,
            loaded_at: snapshot.loaded_at.to_rfc3339(),
            summary: summarize(&view_rows),
            devices: device_options(&snapshot.rows),
            sources: source_options(&snapshot.rows),
            reports: snapshot.reports.clone(),
            criteria,
            sort,
            rows: view_rows,
        }
    }
}
