use anyhow::Result;
use async_trait::async_trait;

pub mod mock;
pub mod openstack;
pub mod request;

pub use request::{ServerRequest, Userdata};

/// Capability interface over one compute provider, bound to a single region
/// for the lifetime of the value. The monitor only ever calls
/// `list_servers`; the provisioning operations use the rest.
#[async_trait]
pub trait ComputeProvider: Send + Sync {
    /// Creates a server from an already-validated request and returns the
    /// provider-assigned server id.
    async fn create_server(&self, request: &ServerRequest) -> Result<String>;

    /// Fetches a single server. `Ok(None)` means the provider no longer
    /// knows the id (deleted or never existed).
    async fn get_server(&self, server_id: &str) -> Result<Option<inventory::DiscoveredServer>>;

    /// Reboots a server. On OpenStack-style providers a reboot also powers
    /// on a SHUTOFF server. Returns false if the server was not found.
    async fn reboot_server(&self, server_id: &str) -> Result<bool>;

    /// Deletes a server. Returns false if the server was already gone.
    async fn delete_server(&self, server_id: &str) -> Result<bool>;

    /// Lists every server the provider manages in this region, with status
    /// and metadata. Must be assumed to fail intermittently.
    async fn list_servers(&self) -> Result<Vec<inventory::DiscoveredServer>>;

    // Optional: name-to-id sugar for create requests.
    // Default implementations return None (caller must pass explicit ids).
    async fn resolve_image(&self, _name: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn resolve_flavor(&self, _name: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

pub mod inventory {
    use std::collections::HashMap;

    /// A provider-managed compute resource as seen by a list call.
    /// Observed, never mutated, by the monitor.
    #[derive(Clone, Debug)]
    pub struct DiscoveredServer {
        pub provider_id: String,
        pub name: String,
        pub status: String,
        pub metadata: HashMap<String, String>,
    }
}
