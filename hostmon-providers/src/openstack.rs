use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde_json::json;

use crate::inventory::DiscoveredServer;
use crate::request::Userdata;
use crate::{ComputeProvider, ServerRequest};

/// Nova-compatible compute provider, bound to one regional compute endpoint.
pub struct OpenStackProvider {
    client: Client,
    endpoint: String,
    auth_token: String,
}

impl OpenStackProvider {
    pub fn new(endpoint: String, auth_token: String) -> Self {
        // Default reqwest client has no overall timeout. If Nova stalls, a
        // monitor tick or a provisioning call can hang forever.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap();
        let endpoint = endpoint.trim().trim_end_matches('/').to_string();
        let auth_token = auth_token.trim().to_string();
        Self {
            client,
            endpoint,
            auth_token,
        }
    }

    fn headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("X-Auth-Token", self.auth_token.parse().unwrap());
        headers.insert("Content-Type", "application/json".parse().unwrap());
        headers
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    fn parse_server(value: &serde_json::Value) -> DiscoveredServer {
        let metadata: HashMap<String, String> = value["metadata"]
            .as_object()
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        DiscoveredServer {
            provider_id: value["id"].as_str().unwrap_or_default().to_string(),
            name: value["name"].as_str().unwrap_or_default().to_string(),
            status: value["status"].as_str().unwrap_or_default().to_string(),
            metadata,
        }
    }
}

#[async_trait]
impl ComputeProvider for OpenStackProvider {
    async fn create_server(&self, request: &ServerRequest) -> Result<String> {
        let mut server = json!({
            "name": request.name,
            "imageRef": request.image,
            "flavorRef": request.flavor,
            "key_name": request.key_name,
            "metadata": request.metadata,
        });

        if !request.security_groups.is_empty() {
            server["security_groups"] = json!(request
                .security_groups
                .iter()
                .map(|name| json!({ "name": name }))
                .collect::<Vec<_>>());
        }

        // Nova wants user_data base64-encoded on the wire. By this point the
        // request carries only resolved inline userdata.
        if let Some(Userdata::Inline(content)) = &request.userdata {
            server["user_data"] = json!(STANDARD.encode(content));
        }

        let resp = self
            .client
            .post(self.url("/servers"))
            .headers(self.headers())
            .json(&json!({ "server": server }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Failed to create server: {} - {}",
                status,
                text
            ));
        }

        let body: serde_json::Value = resp.json().await?;
        let server_id = body["server"]["id"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Create response carried no server id"))?
            .to_string();
        Ok(server_id)
    }

    async fn get_server(&self, server_id: &str) -> Result<Option<DiscoveredServer>> {
        let resp = self
            .client
            .get(self.url(&format!("/servers/{}", server_id)))
            .headers(self.headers())
            .send()
            .await?;

        if !resp.status().is_success() {
            match resp.status().as_u16() {
                404 => return Ok(None),
                _ => {
                    let status = resp.status();
                    let text = resp.text().await.unwrap_or_default();
                    return Err(anyhow::anyhow!(
                        "Failed to get server {}: {} - {}",
                        server_id,
                        status,
                        text
                    ));
                }
            }
        }

        let body: serde_json::Value = resp.json().await?;
        Ok(Some(Self::parse_server(&body["server"])))
    }

    async fn reboot_server(&self, server_id: &str) -> Result<bool> {
        let resp = self
            .client
            .post(self.url(&format!("/servers/{}/action", server_id)))
            .headers(self.headers())
            .json(&json!({ "reboot": { "type": "SOFT" } }))
            .send()
            .await?;

        match resp.status().as_u16() {
            200 | 202 | 204 => Ok(true),
            404 => Ok(false),
            _ => {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                Err(anyhow::anyhow!(
                    "Failed to reboot server {}: {} - {}",
                    server_id,
                    status,
                    text
                ))
            }
        }
    }

    async fn delete_server(&self, server_id: &str) -> Result<bool> {
        let resp = self
            .client
            .delete(self.url(&format!("/servers/{}", server_id)))
            .headers(self.headers())
            .send()
            .await?;

        match resp.status().as_u16() {
            200 | 202 | 204 => Ok(true),
            404 => Ok(false),
            _ => {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                Err(anyhow::anyhow!(
                    "Failed to delete server {}: {} - {}",
                    server_id,
                    status,
                    text
                ))
            }
        }
    }

    async fn list_servers(&self) -> Result<Vec<DiscoveredServer>> {
        let resp = self
            .client
            .get(self.url("/servers/detail"))
            .headers(self.headers())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(anyhow::anyhow!(
                "Failed to list servers: {}",
                resp.status()
            ));
        }

        let body: serde_json::Value = resp.json().await?;
        let mut servers = Vec::new();
        if let Some(list) = body["servers"].as_array() {
            for s in list {
                servers.push(Self::parse_server(s));
            }
        }
        Ok(servers)
    }

    async fn resolve_image(&self, name: &str) -> Result<Option<String>> {
        let resp = self
            .client
            .get(self.url("/images"))
            .headers(self.headers())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(anyhow::anyhow!("Failed to list images: {}", resp.status()));
        }

        let body: serde_json::Value = resp.json().await?;
        let id = body["images"]
            .as_array()
            .and_then(|images| {
                images
                    .iter()
                    .find(|i| i["name"].as_str() == Some(name))
                    .and_then(|i| i["id"].as_str())
            })
            .map(|s| s.to_string());
        Ok(id)
    }

    async fn resolve_flavor(&self, name: &str) -> Result<Option<String>> {
        let resp = self
            .client
            .get(self.url("/flavors"))
            .headers(self.headers())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(anyhow::anyhow!("Failed to list flavors: {}", resp.status()));
        }

        let body: serde_json::Value = resp.json().await?;
        let id = body["flavors"]
            .as_array()
            .and_then(|flavors| {
                flavors
                    .iter()
                    .find(|f| f["name"].as_str() == Some(name))
                    .and_then(|f| f["id"].as_str())
            })
            .map(|s| s.to_string());
        Ok(id)
    }
}
