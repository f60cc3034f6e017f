use std::env;
use std::fs;
use std::sync::Arc;

use hostmon_providers::mock::MockProvider;
use hostmon_providers::openstack::OpenStackProvider;
use hostmon_providers::ComputeProvider;

pub struct ProviderManager;

impl ProviderManager {
    pub fn current_provider_name() -> String {
        env::var("PROVIDER").unwrap_or_else(|_| "openstack".to_string())
    }

    /// Builds the provider bound to the given region. Returns None when the
    /// name is unknown or its credentials are not configured.
    pub fn get_provider(
        provider_name: &str,
        region: Option<&str>,
    ) -> Option<Arc<dyn ComputeProvider>> {
        match provider_name.to_lowercase().as_str() {
            "openstack" => {
                // A region selects its dedicated endpoint var when present,
                // falling back to the region-less default.
                let endpoint = region
                    .and_then(|r| {
                        let var = format!(
                            "OS_COMPUTE_ENDPOINT_{}",
                            r.to_uppercase().replace('-', "_")
                        );
                        env::var(var).ok()
                    })
                    .or_else(|| env::var("OS_COMPUTE_ENDPOINT").ok())
                    .map(|s| s.trim().to_string())?;
                // Prefer *_FILE for the token (Docker/K8s friendly), fallback to env var.
                let token_file = env::var("OS_AUTH_TOKEN_FILE")
                    .unwrap_or_else(|_| "/run/secrets/os_auth_token".to_string());
                let auth_token = fs::read_to_string(&token_file)
                    .ok()
                    .or_else(|| env::var("OS_AUTH_TOKEN").ok())
                    .map(|s| s.trim().to_string())?;
                if endpoint.is_empty() || auth_token.is_empty() {
                    return None;
                }
                Some(Arc::new(OpenStackProvider::new(endpoint, auth_token)))
            }
            "mock" => Some(Arc::new(MockProvider::new())),
            // Add other providers here.
            _ => None,
        }
    }
}
