use crate::models::backup_row::SourceKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Invalid value '{value}' for environment variable {name}: {reason}")]
    ConfigParse {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid URL '{url}' configured for {name}: {reason}")]
    InvalidUrl {
        name: &'static str,
        url: String,
        reason: String,
    },

    #[error("No API key configured for {provider}; set {variable}")]
    MissingCredential {
        provider: SourceKind,
        variable: &'static str,
    },

    #[error("Request to {provider} failed: {cause}")]
    Http {
        provider: SourceKind,
        cause: reqwest::Error,
    },

    #[error("{provider} responded with HTTP {status}")]
    UpstreamStatus { provider: SourceKind, status: u16 },

    #[error("Failed to decode {provider} response: {cause}")]
    Decode {
        provider: SourceKind,
        cause: reqwest::Error,
    },

    #[error("Failed to parse {provider} CSV feed: {cause}")]
    CsvParse {
        provider: SourceKind,
        cause: csv::Error,
    },

    #[error("Refresh aborted because the {provider} source failed: {reason}")]
    SourceAborted { provider: SourceKind, reason: String },

    #[error("Invalid query parameter '{name}': {reason}")]
    InvalidQuery { name: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, DashboardError>;
