//! cfnc
//!
//! Interactive shell for managing Cloudflare zones and DNS records and for
//! pointing a Namecheap domain at a new set of nameservers.
//!
//! # Usage
//! ```bash
//! # Uses ./credentials.yaml and asks which Cloudflare account to use
//! cfnc
//!
//! # Explicit credentials file, second account, debug logs on stderr
//! cfnc --config ~/dns/credentials.yaml --account 2 --verbose
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process;
use tokio::io::BufReader;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use cfnc::config::{CloudflareAccount, DEFAULT_CONFIG_FILE};
use cfnc::shell::select_account;
use cfnc::{CfncError, CloudflareClient, Config, Console, NamecheapClient, Shell};

// ============================================================
// CLI Definition
// ============================================================

#[derive(Parser, Debug)]
#[command(name = "cfnc")]
#[command(about = "Manage Cloudflare zones/records and Namecheap nameservers", long_about = None)]
#[command(version)]
struct Cli {
    /// Credentials file (YAML)
    #[arg(long, env = "CFNC_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Cloudflare account to use, by its 1-based position in the credentials file
    #[arg(long, env = "CFNC_ACCOUNT")]
    account: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

// ============================================================
// Main Entry Point
// ============================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never mix with the menu
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e @ CfncError::ConfigNotFound(_)) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
        Err(e) => return Err(e).context("Failed to load credentials"),
    };

    info!("Loaded {} Cloudflare account(s)", config.cloudflare_accounts.len());

    tokio::select! {
        result = session(&config, cli.account) => result?,
        _ = tokio::signal::ctrl_c() => {
            debug!("Interrupted");
            // The stdin reader thread would keep the runtime alive on shutdown
            process::exit(0);
        }
    }

    Ok(())
}

/// Pick the account, then run the menu until stdin closes
async fn session(config: &Config, account: Option<usize>) -> Result<()> {
    let mut console = Console::new(BufReader::new(tokio::io::stdin()), std::io::stdout());

    let account: &CloudflareAccount = match account {
        Some(position) => position
            .checked_sub(1)
            .and_then(|i| config.cloudflare_accounts.get(i))
            .with_context(|| format!("No Cloudflare account at position {}", position))?,
        None => match select_account(&mut console, &config.cloudflare_accounts).await? {
            Some(account) => account,
            None => return Ok(()),
        },
    };

    info!("Using Cloudflare account {}", account.email);

    let cloudflare = CloudflareClient::new(account)?;
    let namecheap = NamecheapClient::new(&config.namecheap)?;
    let mut shell = Shell::new(console, cloudflare, namecheap);

    if let Err(e) = shell.run().await {
        error!(error = %e, "Session aborted");
        return Err(e.into());
    }

    Ok(())
}
