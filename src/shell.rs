//! Interactive menu shell
//!
//! Reads menu choices and prompt answers from any async line source, runs the
//! matching Cloudflare/Namecheap operation and prints human-readable results.

use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::cloudflare::{CloudflareClient, NewRecord};
use crate::config::CloudflareAccount;
use crate::error::CfncError;
use crate::namecheap::NamecheapClient;

const MENU: &str = "\nChoose an action:
1. List zones
2. Add zone
3. Add record
4. Remove record
5. Enforce HTTPS
6. Update nameservers of domain
";

/// Line-oriented console over an input source and an output sink
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `label` and read one line, without its line ending.
    ///
    /// Returns `None` once the input is exhausted.
    pub async fn prompt(&mut self, label: &str) -> Result<Option<String>, CfncError> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    pub fn say(&mut self, text: impl std::fmt::Display) -> Result<(), CfncError> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }
}

/// Ask the operator which Cloudflare account to use.
///
/// Re-prompts until a valid 1-based index is entered; `None` on end of input.
pub async fn select_account<'a, R, W>(
    console: &mut Console<R, W>,
    accounts: &'a [CloudflareAccount],
) -> Result<Option<&'a CloudflareAccount>, CfncError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    loop {
        console.say("\nChoose the Cloudflare account to use:")?;
        for (i, account) in accounts.iter().enumerate() {
            console.say(format_args!("{}. {}", i + 1, account.email))?;
        }

        let Some(answer) = console.prompt("> ").await? else {
            return Ok(None);
        };

        match pick(accounts, &answer) {
            Some(account) => return Ok(Some(account)),
            None => console.say("Invalid account selection.")?,
        }
    }
}

/// Resolve a 1-based selection against a list
fn pick<'a, T>(items: &'a [T], answer: &str) -> Option<&'a T> {
    let index: usize = answer.trim().parse().ok()?;
    index.checked_sub(1).and_then(|i| items.get(i))
}

/// A fully collected menu action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ListZones,
    AddZone { domain: String },
    AddRecord { domain: String, record: NewRecord },
    RemoveRecord { domain: String },
    EnforceHttps { domain: String },
    UpdateNameservers { domain: String, nameservers: Vec<String> },
}

/// Menu entries, keyed by the number the operator types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    ListZones,
    AddZone,
    AddRecord,
    RemoveRecord,
    EnforceHttps,
    UpdateNameservers,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::ListZones),
            "2" => Some(Self::AddZone),
            "3" => Some(Self::AddRecord),
            "4" => Some(Self::RemoveRecord),
            "5" => Some(Self::EnforceHttps),
            "6" => Some(Self::UpdateNameservers),
            _ => None,
        }
    }
}

/// Split the comma-separated nameserver answer
pub fn parse_nameservers(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|ns| !ns.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct Shell<'a, R, W> {
    console: Console<R, W>,
    cloudflare: CloudflareClient<'a>,
    namecheap: NamecheapClient<'a>,
}

impl<'a, R, W> Shell<'a, R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(
        console: Console<R, W>,
        cloudflare: CloudflareClient<'a>,
        namecheap: NamecheapClient<'a>,
    ) -> Self {
        Self {
            console,
            cloudflare,
            namecheap,
        }
    }

    /// Run the menu loop until the input is exhausted.
    ///
    /// API-reported failures are printed and the loop continues; transport
    /// and console errors end the session.
    pub async fn run(&mut self) -> Result<(), CfncError> {
        loop {
            write!(self.console.output, "{}", MENU)?;
            let Some(answer) = self.console.prompt("\n> ").await? else {
                return Ok(());
            };

            let Some(choice) = MenuChoice::parse(&answer) else {
                debug!("Ignoring menu input {:?}", answer);
                continue;
            };

            let Some(command) = self.collect(choice).await? else {
                return Ok(());
            };

            self.execute(command).await?;
        }
    }

    /// Prompt for the arguments of `choice`; `None` if input ran out midway
    async fn collect(&mut self, choice: MenuChoice) -> Result<Option<Command>, CfncError> {
        if choice == MenuChoice::ListZones {
            return Ok(Some(Command::ListZones));
        }

        let Some(domain) = self.console.prompt("Enter domain: ").await? else {
            return Ok(None);
        };

        let command = match choice {
            MenuChoice::ListZones => Command::ListZones,
            MenuChoice::AddZone => Command::AddZone { domain },
            MenuChoice::AddRecord => {
                let Some(name) = self.console.prompt("Enter record name: ").await? else {
                    return Ok(None);
                };
                let Some(record_type) = self.console.prompt("Enter record type: ").await? else {
                    return Ok(None);
                };
                let Some(content) = self.console.prompt("Enter record content: ").await? else {
                    return Ok(None);
                };
                Command::AddRecord {
                    domain,
                    record: NewRecord::new(&record_type, &name, &content),
                }
            }
            MenuChoice::RemoveRecord => Command::RemoveRecord { domain },
            MenuChoice::EnforceHttps => Command::EnforceHttps { domain },
            MenuChoice::UpdateNameservers => {
                let Some(answer) = self
                    .console
                    .prompt("Enter nameservers (separate by comma): ")
                    .await?
                else {
                    return Ok(None);
                };
                Command::UpdateNameservers {
                    domain,
                    nameservers: parse_nameservers(&answer),
                }
            }
        };

        Ok(Some(command))
    }

    /// Run one command and print its outcome
    pub async fn execute(&mut self, command: Command) -> Result<(), CfncError> {
        debug!(?command, "Executing");

        match command {
            Command::ListZones => match self.cloudflare.list_zones().await {
                Ok(zones) => {
                    self.console.say("Zones: ")?;
                    for zone in zones {
                        self.console.say(zone.name)?;
                    }
                }
                Err(e) => self.report(e, "Error fetching zones.")?,
            },

            Command::AddZone { domain } => match self.cloudflare.create_zone(&domain).await {
                Ok(zone) => {
                    self.console.say("Zone added.")?;
                    self.console.say("Nameservers: ")?;
                    self.console.say(zone.name_servers.join(","))?;
                }
                Err(e) => self.report(e, "Error adding zone.")?,
            },

            Command::AddRecord { domain, record } => {
                let Some(zone_id) = self.resolve_zone(&domain).await? else {
                    return Ok(());
                };
                match self.cloudflare.create_record(&zone_id, &record).await {
                    Ok(()) => self.console.say("Record added.")?,
                    Err(e) => self.report(e, "Error adding record.")?,
                }
            }

            Command::RemoveRecord { domain } => {
                let Some(zone_id) = self.resolve_zone(&domain).await? else {
                    return Ok(());
                };
                self.remove_record(&zone_id).await?;
            }

            Command::EnforceHttps { domain } => {
                let Some(zone_id) = self.resolve_zone(&domain).await? else {
                    return Ok(());
                };
                match self.cloudflare.enforce_https(&zone_id).await {
                    Ok(()) => self.console.say("HTTPS enforced.")?,
                    Err(e) => self.report(e, "Error enforcing HTTPS.")?,
                }
            }

            Command::UpdateNameservers {
                domain,
                nameservers,
            } => match self.namecheap.set_nameservers(&domain, &nameservers).await {
                Ok(()) => self.console.say("Nameservers updated.")?,
                Err(e) => self.report(e, "Error updating nameservers.")?,
            },
        }

        Ok(())
    }

    /// List the zone's records, let the operator pick one and delete it
    async fn remove_record(&mut self, zone_id: &str) -> Result<(), CfncError> {
        let records = match self.cloudflare.list_records(zone_id).await {
            Ok(records) => records,
            Err(e) => return self.report(e, "Error removing record."),
        };

        if records.is_empty() {
            return self.console.say("No records found.");
        }

        self.console
            .say("Please select the record you wish to delete by its number:")?;
        for (i, record) in records.iter().enumerate() {
            self.console
                .say(format_args!("{}: {} {}", i + 1, record.name, record.record_type))?;
        }

        let Some(answer) = self.console.prompt("").await? else {
            return Ok(());
        };
        let Some(record) = pick(&records, &answer) else {
            return self.console.say("Record not found.");
        };

        match self.cloudflare.delete_record(zone_id, &record.id).await {
            Ok(()) => self.console.say("Record deleted."),
            Err(e) => self.report(e, "Error deleting record."),
        }
    }

    /// Zone id for `domain`, or `None` after reporting the lookup failure
    async fn resolve_zone(&mut self, domain: &str) -> Result<Option<String>, CfncError> {
        match self.cloudflare.zone_id(domain).await {
            Ok(zone_id) => Ok(Some(zone_id)),
            Err(e) => {
                self.report(e, "Error fetching zone.")?;
                Ok(None)
            }
        }
    }

    /// Print `message` for a recoverable failure, propagate anything else
    fn report(&mut self, err: CfncError, message: &str) -> Result<(), CfncError> {
        if !err.is_recoverable() {
            return Err(err);
        }
        debug!(error = %err, "{}", message);
        self.console.say(message)
    }
}
