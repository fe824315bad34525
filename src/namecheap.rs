//! Namecheap nameserver updates
//!
//! Namecheap's XML API takes form-encoded commands and answers with an
//! `ApiResponse` XML document. Only `namecheap.domains.dns.setHosts` is used:
//! the domain's nameserver set is replaced wholesale.

use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::NamecheapCredentials;
use crate::error::CfncError;

const NAMECHEAP_API_URL: &str = "https://api.namecheap.com/xml.response";
const NAMECHEAP_SANDBOX_URL: &str = "https://api.sandbox.namecheap.com/xml.response";

const SET_HOSTS_COMMAND: &str = "namecheap.domains.dns.setHosts";

/// Marker a successful response carries verbatim
const ZERO_ERRORS_MARKER: &str = "<ErrCount>0</ErrCount>";

/// Namecheap API client
pub struct NamecheapClient<'a> {
    client: Client,
    credentials: &'a NamecheapCredentials,
    base_url: String,
}

impl<'a> NamecheapClient<'a> {
    /// Create a client, picking the sandbox endpoint when configured
    pub fn new(credentials: &'a NamecheapCredentials) -> Result<Self, CfncError> {
        let base_url = if credentials.sandbox {
            NAMECHEAP_SANDBOX_URL
        } else {
            NAMECHEAP_API_URL
        };

        Self::with_base_url(credentials, base_url)
    }

    pub fn with_base_url(
        credentials: &'a NamecheapCredentials,
        base_url: impl Into<String>,
    ) -> Result<Self, CfncError> {
        let client = Client::builder()
            .user_agent(concat!("cfnc/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            credentials,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build the form fields for a setHosts call
    fn build_params(
        &self,
        domain: &str,
        nameservers: &[String],
    ) -> Result<Vec<(String, String)>, CfncError> {
        let (sld, tld) = split_domain(domain)?;

        let mut params = vec![
            ("ApiUser".to_string(), self.credentials.api_user.clone()),
            ("ApiKey".to_string(), self.credentials.api_key.clone()),
            ("UserName".to_string(), self.credentials.api_user.clone()),
            ("ClientIp".to_string(), self.credentials.client_ip().to_string()),
            ("Command".to_string(), SET_HOSTS_COMMAND.to_string()),
            ("SLD".to_string(), sld.to_string()),
            ("TLD".to_string(), tld.to_string()),
        ];

        for (i, ns) in nameservers.iter().enumerate() {
            params.push((format!("HostName{}", i + 1), ns.clone()));
        }

        Ok(params)
    }

    /// Replace the nameserver set of `domain`
    pub async fn set_nameservers(
        &self,
        domain: &str,
        nameservers: &[String],
    ) -> Result<(), CfncError> {
        let params = self.build_params(domain, nameservers)?;

        debug!(
            "Namecheap {} for {} with {} nameservers",
            SET_HOSTS_COMMAND,
            domain,
            nameservers.len()
        );

        let body = self
            .client
            .post(&self.base_url)
            .form(&params)
            .send()
            .await?
            .text()
            .await?;

        if !body.contains(ZERO_ERRORS_MARKER) {
            let errors = parse_errors(&body);
            debug!(domain = %domain, "Namecheap rejected nameserver update");
            let detail = if errors.is_empty() {
                "response did not report zero errors".to_string()
            } else {
                errors.join("; ")
            };
            return Err(CfncError::Namecheap(detail));
        }

        info!("Nameservers for {} updated", domain);
        Ok(())
    }
}

/// Split a domain into Namecheap's SLD and TLD parameters.
///
/// The SLD is the first label and the TLD is everything after it, so
/// `example.co.uk` becomes `("example", "co.uk")`.
pub fn split_domain(domain: &str) -> Result<(&str, &str), CfncError> {
    match domain.split_once('.') {
        Some((sld, tld)) if !sld.is_empty() && !tld.is_empty() => Ok((sld, tld)),
        _ => Err(CfncError::InvalidDomain(domain.to_string())),
    }
}

/// Collect the text of every `<Error>` element in a response
fn parse_errors(xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut errors = Vec::new();
    let mut in_error = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"Error" => in_error = true,
            Ok(Event::End(e)) if e.name().as_ref() == b"Error" => in_error = false,
            Ok(Event::Text(text)) if in_error => match text.unescape() {
                Ok(message) => errors.push(message.into_owned()),
                Err(e) => debug!("Unreadable Namecheap error text: {}", e),
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Malformed Namecheap response: {}", e);
                break;
            }
        }
    }

    errors
}
