/// Cloudflare v4 API client
///
/// Only the two calls the updater needs: list the DNS records matching the
/// configured name, and update a single record's content in place. Records
/// are never created here; the target must already exist in the zone.
use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::error::Error;

const API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Comment stamped onto every record this tool touches.
const UPDATE_COMMENT: &str = "Updated by cloudflare-ddns";

pub struct CloudflareClient {
    api_base: String,
    zone_id: String,
    api_token: String,
}

/// A DNS record as returned by the list endpoint. TTL and proxy status are
/// carried along so updates can preserve them.
#[derive(Debug, Clone, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
    pub ttl: u32,
    #[serde(default)]
    pub proxied: bool,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: u32,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    success: bool,
    #[serde(default)]
    result: Vec<DnsRecord>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Serialize)]
struct UpdateBody<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    record_type: &'a str,
    content: &'a str,
    ttl: u32,
    proxied: bool,
    comment: &'a str,
}

impl CloudflareClient {
    pub fn new(config: &Config) -> Self {
        CloudflareClient {
            api_base: API_BASE.to_string(),
            zone_id: config.zone_id.clone(),
            api_token: config.api_key.clone(),
        }
    }

    /// Point the client at a different API endpoint. Used by tests.
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.to_string();
        self
    }

    /// List every record in the zone whose name matches `name` exactly.
    pub fn list_records(&self, name: &str) -> Result<Vec<DnsRecord>, Box<dyn Error>> {
        log::debug!("Fetching DNS records for: {}", name);

        let url = format!(
            "{}/zones/{}/dns_records?name={}",
            self.api_base,
            self.zone_id,
            urlencoding::encode(name)
        );

        let res = minreq::get(&url)
            .with_header("Authorization", format!("Bearer {}", self.api_token))
            .with_header("Content-Type", "application/json")
            .with_header("User-Agent", crate::USER_AGENT)
            .send()?;

        let list: ListResponse = res.json()?;
        if !list.success {
            return Err(api_error("could not list DNS records", &list.errors));
        }

        Ok(list.result)
    }

    /// Rewrite `record`'s content, keeping its name, type, TTL and proxy
    /// status as they were.
    pub fn update_record(&self, record: &DnsRecord, content: &str) -> Result<(), Box<dyn Error>> {
        let body = UpdateBody {
            name: &record.name,
            record_type: &record.record_type,
            content,
            ttl: record.ttl,
            proxied: record.proxied,
            comment: UPDATE_COMMENT,
        };

        let url = format!(
            "{}/zones/{}/dns_records/{}",
            self.api_base, self.zone_id, record.id
        );

        let res = minreq::put(&url)
            .with_header("Authorization", format!("Bearer {}", self.api_token))
            .with_header("Content-Type", "application/json")
            .with_header("User-Agent", crate::USER_AGENT)
            .with_json(&body)?
            .send()?;

        let update: UpdateResponse = res.json()?;
        if !update.success {
            return Err(api_error("could not update DNS record", &update.errors));
        }

        log::info!(
            "DNS record {} ({}) updated {} -> {}",
            record.name,
            record.record_type,
            record.content,
            content
        );
        Ok(())
    }
}

fn api_error(context: &str, errors: &[ApiError]) -> Box<dyn Error> {
    match errors.first() {
        Some(e) => format!("{}: {} (error {})", context, e.message, e.code).into(),
        None => format!("{}: Cloudflare reported failure without details", context).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(server: &mockito::ServerGuard) -> CloudflareClient {
        let config = Config {
            zone_id: "zone123".to_string(),
            dns_record: "home.example.com".to_string(),
            api_key: "token".to_string(),
            ..Default::default()
        };
        CloudflareClient::new(&config).with_api_base(&server.url())
    }

    #[test]
    fn test_list_records() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/zones/zone123/dns_records")
            .match_query(mockito::Matcher::UrlEncoded(
                "name".into(),
                "home.example.com".into(),
            ))
            .match_header("authorization", "Bearer token")
            .with_status(200)
            .with_body(
                r#"{
                  "success": true,
                  "errors": [],
                  "result": [
                    {"id": "rec1", "name": "home.example.com", "type": "A",
                     "content": "198.51.100.1", "ttl": 120, "proxied": true},
                    {"id": "rec2", "name": "home.example.com", "type": "AAAA",
                     "content": "2001:db8::1", "ttl": 1}
                  ]
                }"#,
            )
            .create();

        let records = test_client(&server).list_records("home.example.com").unwrap();
        mock.assert();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "rec1");
        assert_eq!(records[0].record_type, "A");
        assert_eq!(records[0].ttl, 120);
        assert!(records[0].proxied);
        assert_eq!(records[1].record_type, "AAAA");
        assert!(!records[1].proxied);
    }

    #[test]
    fn test_list_records_api_failure() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/zones/zone123/dns_records")
            .match_query(mockito::Matcher::Any)
            .with_status(403)
            .with_body(
                r#"{"success": false, "errors": [{"code": 9109, "message": "Invalid access token"}], "result": []}"#,
            )
            .create();

        let err = test_client(&server)
            .list_records("home.example.com")
            .unwrap_err();
        assert!(err.to_string().contains("Invalid access token"));
        assert!(err.to_string().contains("9109"));
    }

    #[test]
    fn test_update_record_preserves_ttl_and_proxied() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("PUT", "/zones/zone123/dns_records/rec1")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "name": "home.example.com",
                "type": "A",
                "content": "203.0.113.5",
                "ttl": 120,
                "proxied": true,
                "comment": "Updated by cloudflare-ddns"
            })))
            .with_status(200)
            .with_body(r#"{"success": true, "errors": []}"#)
            .create();

        let record = DnsRecord {
            id: "rec1".to_string(),
            name: "home.example.com".to_string(),
            record_type: "A".to_string(),
            content: "198.51.100.1".to_string(),
            ttl: 120,
            proxied: true,
        };

        test_client(&server)
            .update_record(&record, "203.0.113.5")
            .unwrap();
        mock.assert();
    }

    #[test]
    fn test_update_record_api_failure() {
        let mut server = mockito::Server::new();
        server
            .mock("PUT", "/zones/zone123/dns_records/rec1")
            .with_status(400)
            .with_body(
                r#"{"success": false, "errors": [{"code": 1004, "message": "DNS Validation Error"}]}"#,
            )
            .create();

        let record = DnsRecord {
            id: "rec1".to_string(),
            name: "home.example.com".to_string(),
            record_type: "A".to_string(),
            content: "198.51.100.1".to_string(),
            ttl: 1,
            proxied: false,
        };

        let err = test_client(&server)
            .update_record(&record, "203.0.113.5")
            .unwrap_err();
        assert!(err.to_string().contains("DNS Validation Error"));
    }
}
