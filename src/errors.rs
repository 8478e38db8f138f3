use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings: {message}")]
    Parse { message: String },

    #[error("Settings out of range: {message}")]
    Invalid { message: String },

    #[error("Failed to serialize settings: {message}")]
    Serialize { message: String },
}

pub type SettingsResult<T> = Result<T, SettingsError>;
