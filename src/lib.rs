//! Cloudflare/Namecheap DNS shell library
//!
//! Provides the credentials loader, the Cloudflare and Namecheap API clients
//! and the interactive menu shell used by the `cfnc` binary.

pub mod cloudflare;
pub mod config;
pub mod error;
pub mod namecheap;
pub mod shell;

pub use cloudflare::CloudflareClient;
pub use config::Config;
pub use error::CfncError;
pub use namecheap::NamecheapClient;
pub use shell::{Console, Shell};
