//! Cloudflare API Client
//!
//! Cloudflare v4 REST API wrapper authenticated with an account's global API
//! key. Handles zone listing/creation, zone id lookup, SSL mode and DNS
//! record CRUD.

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::CloudflareAccount;
use crate::error::CfncError;

const CLOUDFLARE_API: &str = "https://api.cloudflare.com/client/v4";

/// TTL value Cloudflare treats as "automatic"
pub const AUTO_TTL: u32 = 1;

/// Cloudflare API client bound to one account
pub struct CloudflareClient<'a> {
    client: Client,
    account: &'a CloudflareAccount,
    base_url: String,
}

// ============================================================
// API Response Types
// ============================================================

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiError>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i32,
    message: String,
}

impl<T> ApiResponse<T> {
    /// Turn a `success: false` envelope into an error, keep the result otherwise
    fn into_result(self) -> Result<Option<T>, CfncError> {
        if !self.success {
            let errors: Vec<String> = self
                .errors
                .iter()
                .map(|e| format!("{} ({})", e.message, e.code))
                .collect();
            return Err(CfncError::Cloudflare(errors.join(", ")));
        }
        Ok(self.result)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub name_servers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
}

/// Record fields collected from the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub ttl: u32,
}

impl NewRecord {
    pub fn new(record_type: &str, name: &str, content: &str) -> Self {
        Self {
            record_type: record_type.to_uppercase(),
            name: name.to_string(),
            content: content.to_string(),
            ttl: AUTO_TTL,
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateZoneRequest<'r> {
    name: &'r str,
    jump_start: bool,
}

#[derive(Debug, Serialize)]
struct SslSettingRequest {
    value: &'static str,
}

// ============================================================
// Client Implementation
// ============================================================

impl<'a> CloudflareClient<'a> {
    /// Create a client for `account` against the public API
    pub fn new(account: &'a CloudflareAccount) -> Result<Self, CfncError> {
        Self::with_base_url(account, CLOUDFLARE_API)
    }

    /// Create a client against a custom API base URL
    pub fn with_base_url(
        account: &'a CloudflareAccount,
        base_url: impl Into<String>,
    ) -> Result<Self, CfncError> {
        let client = Client::builder()
            .user_agent(concat!("cfnc/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            account,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Start a request carrying the account auth headers
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("X-Auth-Account", &self.account.account_id)
            .header("X-Auth-Email", &self.account.email)
            .header("X-Auth-Key", &self.account.api_key)
            .header("Content-Type", "application/json")
    }

    /// Send a request and unwrap the Cloudflare envelope
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, CfncError> {
        let response: ApiResponse<T> = request.send().await?.json().await?;
        response.into_result()
    }

    /// List all zones visible to the account
    pub async fn list_zones(&self) -> Result<Vec<Zone>, CfncError> {
        let url = format!("{}/zones", self.base_url);
        debug!("GET {}", url);

        let zones: Option<Vec<Zone>> = self.send(self.request(Method::GET, &url)).await?;
        Ok(zones.unwrap_or_default())
    }

    /// Create a zone with record scanning enabled
    pub async fn create_zone(&self, domain: &str) -> Result<Zone, CfncError> {
        let url = format!("{}/zones", self.base_url);
        debug!("POST {} name={}", url, domain);

        let request = CreateZoneRequest {
            name: domain,
            jump_start: true,
        };

        let zone: Option<Zone> = self.send(self.request(Method::POST, &url).json(&request)).await?;
        let zone = zone.ok_or_else(|| CfncError::Cloudflare("No zone in response".to_string()))?;

        info!(zone_id = %zone.id, "Zone {} created", zone.name);
        Ok(zone)
    }

    /// Look up a zone id by exact domain name
    pub async fn zone_id(&self, domain: &str) -> Result<String, CfncError> {
        debug!("Looking up zone ID for: {}", domain);

        let url = format!("{}/zones", self.base_url);
        let zones: Option<Vec<Zone>> = self
            .send(self.request(Method::GET, &url).query(&[("name", domain)]))
            .await?;

        let zone = zones
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| CfncError::ZoneNotFound(domain.to_string()))?;

        debug!("Found zone ID: {}", zone.id);
        Ok(zone.id)
    }

    /// Set the zone SSL mode to `full`
    pub async fn enforce_https(&self, zone_id: &str) -> Result<(), CfncError> {
        let url = format!("{}/zones/{}/settings/ssl", self.base_url, zone_id);
        debug!("PATCH {}", url);

        let request = SslSettingRequest { value: "full" };
        let _: Option<serde_json::Value> =
            self.send(self.request(Method::PATCH, &url).json(&request)).await?;

        info!(zone_id = %zone_id, "SSL mode set to full");
        Ok(())
    }

    /// List all DNS records for a zone, in API order
    pub async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>, CfncError> {
        let url = format!("{}/zones/{}/dns_records", self.base_url, zone_id);
        debug!("GET {}", url);

        let records: Option<Vec<DnsRecord>> = self.send(self.request(Method::GET, &url)).await?;
        Ok(records.unwrap_or_default())
    }

    /// Create a DNS record
    pub async fn create_record(
        &self,
        zone_id: &str,
        record: &NewRecord,
    ) -> Result<(), CfncError> {
        let url = format!("{}/zones/{}/dns_records", self.base_url, zone_id);
        debug!("POST {} {} {}", url, record.record_type, record.name);

        let _: Option<serde_json::Value> =
            self.send(self.request(Method::POST, &url).json(record)).await?;

        info!(zone_id = %zone_id, "Record {} {} created", record.name, record.record_type);
        Ok(())
    }

    /// Delete a DNS record
    pub async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<(), CfncError> {
        let url = format!(
            "{}/zones/{}/dns_records/{}",
            self.base_url, zone_id, record_id
        );
        debug!("DELETE {}", url);

        let _: Option<serde_json::Value> = self.send(self.request(Method::DELETE, &url)).await?;

        info!(zone_id = %zone_id, "Record {} deleted", record_id);
        Ok(())
    }
}


#[cfg(test)]
mod integration_tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn account() -> CloudflareAccount {
        CloudflareAccount {
            email: "ops@example.com".to_string(),
            account_id: "acc-123".to_string(),
            api_key: "key-456".to_string(),
        }
    }

    fn ok(result: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "errors": [],
            "messages": [],
            "result": result
        }))
    }

    fn failed() -> ResponseTemplate {
        ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "success": false,
            "errors": [{"code": 1061, "message": "already exists"}],
            "messages": [],
            "result": null
        }))
    }

    #[tokio::test]
    async fn test_list_zones_sends_auth_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zones"))
            .and(header("X-Auth-Account", "acc-123"))
            .and(header("X-Auth-Email", "ops@example.com"))
            .and(header("X-Auth-Key", "key-456"))
            .and(header("Content-Type", "application/json"))
            .respond_with(ok(serde_json::json!([
                {"id": "z1", "name": "example.com"},
                {"id": "z2", "name": "example.org"}
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let account = account();
        let client = CloudflareClient::with_base_url(&account, mock_server.uri()).unwrap();
        let zones = client.list_zones().await.unwrap();

        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].name, "example.com");
        assert_eq!(zones[1].name, "example.org");
    }

    #[tokio::test]
    async fn test_create_zone_binds_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/zones"))
            .and(body_json(serde_json::json!({"name": "example.com", "jump_start": true})))
            .respond_with(ok(serde_json::json!({
                "id": "z1",
                "name": "example.com",
                "status": "pending",
                "name_servers": ["ada.ns.cloudflare.com", "bob.ns.cloudflare.com"]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let account = account();
        let client = CloudflareClient::with_base_url(&account, mock_server.uri()).unwrap();
        let zone = client.create_zone("example.com").await.unwrap();

        assert_eq!(zone.id, "z1");
        assert_eq!(
            zone.name_servers,
            vec!["ada.ns.cloudflare.com", "bob.ns.cloudflare.com"]
        );
    }

    #[tokio::test]
    async fn test_create_zone_api_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/zones"))
            .respond_with(failed())
            .mount(&mock_server)
            .await;

        let account = account();
        let client = CloudflareClient::with_base_url(&account, mock_server.uri()).unwrap();
        let err = client.create_zone("example.com").await.unwrap_err();

        assert!(matches!(err, CfncError::Cloudflare(_)));
    }

    #[tokio::test]
    async fn test_zone_id_lookup() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zones"))
            .and(query_param("name", "example.com"))
            .respond_with(ok(serde_json::json!([{"id": "z1", "name": "example.com"}])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let account = account();
        let client = CloudflareClient::with_base_url(&account, mock_server.uri()).unwrap();

        assert_eq!(client.zone_id("example.com").await.unwrap(), "z1");
    }

    #[tokio::test]
    async fn test_zone_id_lookup_no_match_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zones"))
            .and(query_param("name", "missing.com"))
            .respond_with(ok(serde_json::json!([])))
            .mount(&mock_server)
            .await;

        let account = account();
        let client = CloudflareClient::with_base_url(&account, mock_server.uri()).unwrap();
        let err = client.zone_id("missing.com").await.unwrap_err();

        assert!(matches!(err, CfncError::ZoneNotFound(d) if d == "missing.com"));
    }

    #[tokio::test]
    async fn test_zone_id_lookup_api_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zones"))
            .respond_with(failed())
            .mount(&mock_server)
            .await;

        let account = account();
        let client = CloudflareClient::with_base_url(&account, mock_server.uri()).unwrap();
        let err = client.zone_id("example.com").await.unwrap_err();

        assert!(matches!(err, CfncError::Cloudflare(_)));
    }

    #[tokio::test]
    async fn test_enforce_https() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/zones/z1/settings/ssl"))
            .and(body_json(serde_json::json!({"value": "full"})))
            .respond_with(ok(serde_json::json!({"id": "ssl", "value": "full"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let account = account();
        let client = CloudflareClient::with_base_url(&account, mock_server.uri()).unwrap();
        client.enforce_https("z1").await.unwrap();
    }

    #[tokio::test]
    async fn test_create_record_uses_auto_ttl() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/zones/z1/dns_records"))
            .and(body_json(serde_json::json!({
                "type": "A",
                "name": "api",
                "content": "192.0.2.1",
                "ttl": 1
            })))
            .respond_with(ok(serde_json::json!({
                "id": "r1",
                "type": "A",
                "name": "api.example.com",
                "content": "192.0.2.1",
                "ttl": 1,
                "proxied": false
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let account = account();
        let client = CloudflareClient::with_base_url(&account, mock_server.uri()).unwrap();
        let record = NewRecord::new("a", "api", "192.0.2.1");
        client.create_record("z1", &record).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_and_delete_records() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zones/z1/dns_records"))
            .respond_with(ok(serde_json::json!([
                {"id": "r1", "type": "A", "name": "example.com", "content": "192.0.2.1", "ttl": 1, "proxied": true},
                {"id": "r2", "type": "MX", "name": "example.com", "content": "mail.example.com", "ttl": 300, "proxied": false}
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/zones/z1/dns_records/r2"))
            .respond_with(ok(serde_json::json!({"id": "r2"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let account = account();
        let client = CloudflareClient::with_base_url(&account, mock_server.uri()).unwrap();

        let records = client.list_records("z1").await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].record_type, "MX");

        client.delete_record("z1", &records[1].id).await.unwrap();
    }
}
