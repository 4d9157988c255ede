use crate::utils::date::parse_start_time;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Normalized backup outcome. Provider wording that does not map onto one of
/// the known outcomes is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BackupStatus {
    Successful,
    Warning,
    Failed,
    Other(String),
}

impl BackupStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BackupStatus::Successful => "Successful",
            BackupStatus::Warning => "Warning",
            BackupStatus::Failed => "Failed",
            BackupStatus::Other(label) => label,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl Default for BackupStatus {
    fn default() -> Self {
        BackupStatus::Other(String::new())
    }
}

impl From<String> for BackupStatus {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Successful" => BackupStatus::Successful,
            "Warning" => BackupStatus::Warning,
            "Failed" => BackupStatus::Failed,
            _ => BackupStatus::Other(label),
        }
    }
}

impl From<&str> for BackupStatus {
    fn from(label: &str) -> Self {
        BackupStatus::from(label.to_string())
    }
}

impl From<BackupStatus> for String {
    fn from(status: BackupStatus) -> Self {
        match status {
            BackupStatus::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for BackupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The provider a row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceKind {
    IDrive,
    Datto,
    Acronis,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::IDrive => "IDrive",
            SourceKind::Datto => "Datto",
            SourceKind::Acronis => "Acronis",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "IDrive" => Ok(SourceKind::IDrive),
            "Datto" => Ok(SourceKind::Datto),
            "Acronis" => Ok(SourceKind::Acronis),
            other => Err(format!(
                "unknown source '{}', expected IDrive, Datto or Acronis",
                other
            )),
        }
    }
}

/// One backup job in the shape shared by every provider.
///
/// The serialized field names are the CSV feed's column headers, which is
/// also the JSON contract of the gateway endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedBackupRow {
    #[serde(rename = "Status", default)]
    pub status: BackupStatus,

    #[serde(rename = "Computer Name", default)]
    pub computer_name: String,

    #[serde(rename = "Source")]
    pub source: SourceKind,

    /// `MM/DD/YYYY HH:MM:SS`, parsed lazily by [`parse_start_time`]
    #[serde(rename = "Backup Start Time", default)]
    pub backup_start_time: String,

    #[serde(rename = "Files backed up now", default)]
    pub files_backed_up: u64,

    #[serde(rename = "Files failed to backup", default)]
    pub files_failed: u64,

    #[serde(rename = "Files considered for backup", default)]
    pub files_considered: u64,
}

impl UnifiedBackupRow {
    pub fn has_status(&self) -> bool {
        !self.status.is_empty()
    }

    pub fn start_timestamp(&self) -> Option<DateTime<Utc>> {
        parse_start_time(&self.backup_start_time)
    }
}
