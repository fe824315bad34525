//! Credentials file loading
//!
//! Reads Cloudflare accounts and Namecheap API credentials from a YAML file:
//!
//! ```yaml
//! CF_ACCOUNTS:
//!   - email: ops@example.com
//!     account_id: 0123456789abcdef
//!     api_key: global-api-key
//! NC_API_USER: example
//! NC_API_KEY: namecheap-api-key
//! NC_CLIENT_IP: 203.0.113.7   # optional, defaults to 0.0.0.0
//! NC_SANDBOX: false           # optional
//! ```

use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

use crate::error::CfncError;

/// Default credentials file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "credentials.yaml";

/// Client IP sent to Namecheap when none is configured.
pub const DEFAULT_CLIENT_IP: &str = "0.0.0.0";

/// Loaded credentials, read-only for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct Config {
    pub cloudflare_accounts: Vec<CloudflareAccount>,
    pub namecheap: NamecheapCredentials,
}

/// File layout; every key sits at the top level
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(rename = "CF_ACCOUNTS")]
    cf_accounts: Vec<CloudflareAccount>,
    #[serde(rename = "NC_API_USER")]
    nc_api_user: String,
    #[serde(rename = "NC_API_KEY")]
    nc_api_key: String,
    #[serde(rename = "NC_CLIENT_IP", default)]
    nc_client_ip: Option<String>,
    #[serde(rename = "NC_SANDBOX", default)]
    nc_sandbox: bool,
}

impl From<RawConfig> for Config {
    fn from(raw: RawConfig) -> Self {
        Self {
            cloudflare_accounts: raw.cf_accounts,
            namecheap: NamecheapCredentials {
                api_user: raw.nc_api_user,
                api_key: raw.nc_api_key,
                client_ip: raw.nc_client_ip,
                sandbox: raw.nc_sandbox,
            },
        }
    }
}

/// Cloudflare account using the legacy global API key scheme
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CloudflareAccount {
    pub email: String,
    pub account_id: String,
    pub api_key: String,
}

/// Namecheap API access
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamecheapCredentials {
    /// API user, also sent as the account username
    pub api_user: String,
    pub api_key: String,
    /// Whitelisted client IP
    pub client_ip: Option<String>,
    /// Use the Namecheap sandbox endpoint
    pub sandbox: bool,
}

impl NamecheapCredentials {
    pub fn client_ip(&self) -> &str {
        self.client_ip.as_deref().unwrap_or(DEFAULT_CLIENT_IP)
    }
}

impl Config {
    /// Load and validate the credentials file at `path`.
    ///
    /// A missing file yields [`CfncError::ConfigNotFound`] so the caller can
    /// exit with a dedicated message.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CfncError> {
        let path = path.as_ref();
        debug!("Loading credentials from {}", path.display());

        let raw = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CfncError::ConfigNotFound(path.to_path_buf()),
            _ => CfncError::ConfigRead {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        Self::from_yaml(&raw)
    }

    /// Parse and validate credentials from YAML text
    pub fn from_yaml(raw: &str) -> Result<Self, CfncError> {
        let config: Config = serde_yaml::from_str::<RawConfig>(raw)?.into();

        if config.cloudflare_accounts.is_empty() {
            return Err(CfncError::InvalidConfig(
                "CF_ACCOUNTS must list at least one Cloudflare account".to_string(),
            ));
        }

        debug!(
            accounts = config.cloudflare_accounts.len(),
            "Credentials loaded"
        );
        Ok(config)
    }
}
