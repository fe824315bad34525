//! Error types shared by the config loader, API clients and shell.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CfncError {
    #[error("No {} file found", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Cloudflare API error: {0}")]
    Cloudflare(String),

    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    #[error("Namecheap API error: {0}")]
    Namecheap(String),

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Console I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CfncError {
    /// API-reported failures the shell reports and moves past.
    ///
    /// Transport, I/O and config errors are not recoverable and end the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CfncError::Cloudflare(_)
                | CfncError::ZoneNotFound(_)
                | CfncError::Namecheap(_)
                | CfncError::InvalidDomain(_)
        )
    }
}
