use crate::models::backup_row::{BackupStatus, SourceKind, UnifiedBackupRow};
use crate::models::vendor::{AcronisBackup, DattoBackup};
use crate::utils::date::reformat_vendor_time;
use csv::StringRecord;

/// Column headers of the IDrive CSV feed
pub mod columns {
    pub const STATUS: &str = "Status";
    pub const COMPUTER_NAME: &str = "Computer Name";
    pub const START_TIME: &str = "Backup Start Time";
    pub const FILES_BACKED_UP: &str = "Files backed up now";
    pub const FILES_FAILED: &str = "Files failed to backup";
    pub const FILES_CONSIDERED: &str = "Files considered for backup";
}

type StatusTable = &'static [(&'static str, BackupStatus)];

const DATTO_STATUS_TABLE: StatusTable = &[
    ("success", BackupStatus::Successful),
    ("successful", BackupStatus::Successful),
    ("succeeded", BackupStatus::Successful),
    ("completed", BackupStatus::Successful),
    ("ok", BackupStatus::Successful),
    ("warning", BackupStatus::Warning),
    ("partial", BackupStatus::Warning),
    ("completed_with_warnings", BackupStatus::Warning),
    ("failed", BackupStatus::Failed),
    ("failure", BackupStatus::Failed),
    ("error", BackupStatus::Failed),
    ("missed", BackupStatus::Failed),
];

const ACRONIS_STATUS_TABLE: StatusTable = &[
    ("ok", BackupStatus::Successful),
    ("success", BackupStatus::Successful),
    ("succeeded", BackupStatus::Successful),
    ("completed", BackupStatus::Successful),
    ("warning", BackupStatus::Warning),
    ("partially_succeeded", BackupStatus::Warning),
    ("error", BackupStatus::Failed),
    ("failed", BackupStatus::Failed),
    ("critical", BackupStatus::Failed),
    ("cancelled", BackupStatus::Failed),
];

/// Look a vendor status up case-insensitively; unknown wording is kept as is
fn map_status(table: StatusTable, raw: Option<&str>) -> BackupStatus {
    let Some(raw) = raw else {
        return BackupStatus::default();
    };
    let needle = raw.trim().to_lowercase();

    table
        .iter()
        .find(|(label, _)| *label == needle)
        .map(|(_, status)| status.clone())
        .unwrap_or_else(|| BackupStatus::from(raw))
}

pub fn normalize_datto(record: DattoBackup) -> UnifiedBackupRow {
    UnifiedBackupRow {
        status: map_status(DATTO_STATUS_TABLE, record.status.as_deref()),
        computer_name: record.device_name.unwrap_or_default(),
        source: SourceKind::Datto,
        backup_start_time: reformat_vendor_time(record.start_time.as_deref()),
        files_backed_up: record.files_backed_up.unwrap_or(0),
        files_failed: record.files_failed.unwrap_or(0),
        files_considered: record.files_considered.unwrap_or(0),
    }
}

pub fn normalize_acronis(record: AcronisBackup) -> UnifiedBackupRow {
    UnifiedBackupRow {
        status: map_status(ACRONIS_STATUS_TABLE, record.status.as_deref()),
        computer_name: record.machine_name.unwrap_or_default(),
        source: SourceKind::Acronis,
        backup_start_time: reformat_vendor_time(record.started_at.as_deref()),
        files_backed_up: record.protected_files.unwrap_or(0),
        files_failed: record.failed_files.unwrap_or(0),
        files_considered: record.total_files.unwrap_or(0),
    }
}

fn csv_field<'r>(headers: &StringRecord, record: &'r StringRecord, name: &str) -> Option<&'r str> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .and_then(|idx| record.get(idx))
}

/// Map one IDrive CSV record by header name. The start time keeps its
/// original text.
pub fn normalize_csv(headers: &StringRecord, record: &StringRecord) -> UnifiedBackupRow {
    let field = |name: &str| csv_field(headers, record, name);
    let count = |name: &str| -> u64 {
        csv_field(headers, record, name)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0)
    };

    UnifiedBackupRow {
        status: field(columns::STATUS)
            .map(BackupStatus::from)
            .unwrap_or_default(),
        computer_name: field(columns::COMPUTER_NAME)
            .unwrap_or_default()
            .to_string(),
        source: SourceKind::IDrive,
        backup_start_time: field(columns::START_TIME)
            .unwrap_or_default()
            .to_string(),
        files_backed_up: count(columns::FILES_BACKED_UP),
        files_failed: count(columns::FILES_FAILED),
        files_considered: count(columns::FILES_CONSIDERED),
    }
}
