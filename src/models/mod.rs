pub mod aggregation;
pub mod api;
pub mod backup_row;
pub mod config;
pub mod config_validator;
pub mod error;
pub mod vendor;
pub mod view;
