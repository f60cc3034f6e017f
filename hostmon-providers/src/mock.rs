use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::inventory::DiscoveredServer;
use crate::{ComputeProvider, ServerRequest};

/// In-memory provider used by tests and local development
/// (`PROVIDER=mock`). Freshly created servers come up in `BUILD` and can be
/// moved through their lifecycle with [`MockProvider::set_status`];
/// [`MockProvider::fail_next_list`] injects one transient list failure.
#[derive(Default)]
pub struct MockProvider {
    servers: Mutex<HashMap<String, DiscoveredServer>>,
    images: Mutex<HashMap<String, String>>,
    flavors: Mutex<HashMap<String, String>>,
    next_list_error: Mutex<Option<String>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a server directly, bypassing create-side validation.
    pub fn push_server(&self, id: &str, status: &str, metadata: HashMap<String, String>) {
        let mut servers = self.servers.lock().unwrap();
        servers.insert(
            id.to_string(),
            DiscoveredServer {
                provider_id: id.to_string(),
                name: id.to_string(),
                status: status.to_string(),
                metadata,
            },
        );
    }

    /// Overwrites the lifecycle status of a seeded server.
    pub fn set_status(&self, id: &str, status: &str) {
        let mut servers = self.servers.lock().unwrap();
        if let Some(server) = servers.get_mut(id) {
            server.status = status.to_string();
        }
    }

    /// Makes the next `list_servers` call fail with the given message.
    /// Subsequent calls succeed again.
    pub fn fail_next_list(&self, message: &str) {
        *self.next_list_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn register_image(&self, name: &str, id: &str) {
        self.images
            .lock()
            .unwrap()
            .insert(name.to_string(), id.to_string());
    }

    pub fn register_flavor(&self, name: &str, id: &str) {
        self.flavors
            .lock()
            .unwrap()
            .insert(name.to_string(), id.to_string());
    }
}

#[async_trait]
impl ComputeProvider for MockProvider {
    async fn create_server(&self, request: &ServerRequest) -> Result<String> {
        let server_id = format!("mock-{}", uuid::Uuid::new_v4());
        let name = request
            .name
            .clone()
            .ok_or_else(|| anyhow::anyhow!("MockProvider: create without a name"))?;

        let mut servers = self.servers.lock().unwrap();
        servers.insert(
            server_id.clone(),
            DiscoveredServer {
                provider_id: server_id.clone(),
                name,
                status: "BUILD".to_string(),
                metadata: request.metadata.clone(),
            },
        );

        Ok(server_id)
    }

    async fn get_server(&self, server_id: &str) -> Result<Option<DiscoveredServer>> {
        Ok(self.servers.lock().unwrap().get(server_id).cloned())
    }

    async fn reboot_server(&self, server_id: &str) -> Result<bool> {
        let mut servers = self.servers.lock().unwrap();
        match servers.get_mut(server_id) {
            Some(server) => {
                server.status = "ACTIVE".to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_server(&self, server_id: &str) -> Result<bool> {
        Ok(self.servers.lock().unwrap().remove(server_id).is_some())
    }

    async fn list_servers(&self) -> Result<Vec<DiscoveredServer>> {
        if let Some(message) = self.next_list_error.lock().unwrap().take() {
            return Err(anyhow::anyhow!("MockProvider: {}", message));
        }

        let servers = self.servers.lock().unwrap();
        let mut list: Vec<DiscoveredServer> = servers.values().cloned().collect();
        list.sort_by(|a, b| a.provider_id.cmp(&b.provider_id));
        Ok(list)
    }

    async fn resolve_image(&self, name: &str) -> Result<Option<String>> {
        Ok(self.images.lock().unwrap().get(name).cloned())
    }

    async fn resolve_flavor(&self, name: &str) -> Result<Option<String>> {
        Ok(self.flavors.lock().unwrap().get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn created_servers_show_up_in_list_with_their_metadata() {
        let provider = MockProvider::new();
        let request = ServerRequest {
            name: Some("web-1".to_string()),
            metadata: HashMap::from([("node_id".to_string(), "n1".to_string())]),
            ..Default::default()
        };

        let id = provider.create_server(&request).await.unwrap();
        let listed = provider.list_servers().await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].provider_id, id);
        assert_eq!(listed[0].status, "BUILD");
        assert_eq!(listed[0].metadata.get("node_id").unwrap(), "n1");
    }

    #[tokio::test]
    async fn reboot_powers_a_server_back_to_active() {
        let provider = MockProvider::new();
        provider.push_server("s1", "SHUTOFF", HashMap::new());

        assert!(provider.reboot_server("s1").await.unwrap());
        let server = provider.get_server("s1").await.unwrap().unwrap();
        assert_eq!(server.status, "ACTIVE");
    }

    #[tokio::test]
    async fn delete_is_idempotent_towards_missing_servers() {
        let provider = MockProvider::new();
        provider.push_server("s1", "ACTIVE", HashMap::new());

        assert!(provider.delete_server("s1").await.unwrap());
        assert!(!provider.delete_server("s1").await.unwrap());
        assert!(provider.get_server("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_failure_is_one_shot() {
        let provider = MockProvider::new();
        provider.fail_next_list("connection timed out");

        assert!(provider.list_servers().await.is_err());
        assert!(provider.list_servers().await.is_ok());
    }
}
