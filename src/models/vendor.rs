use serde::Deserialize;

/// A backup record as returned by `GET {DATTO_BASE_URL}/backups`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DattoBackup {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub files_backed_up: Option<u64>,
    #[serde(default)]
    pub files_failed: Option<u64>,
    #[serde(default)]
    pub files_considered: Option<u64>,
}

/// A backup record as returned by `GET {ACRONIS_BASE_URL}/backups`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcronisBackup {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub machine_name: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub protected_files: Option<u64>,
    #[serde(default)]
    pub failed_files: Option<u64>,
    #[serde(default)]
    pub total_files: Option<u64>,
}
