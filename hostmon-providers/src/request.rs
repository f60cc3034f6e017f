use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Server create request as supplied by the operator, before name-to-id
/// resolution and metadata injection. Unknown keys are rejected at parse
/// time; in particular `nics` is not an accepted parameter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerRequest {
    pub name: Option<String>,
    pub image: Option<String>,
    pub image_name: Option<String>,
    pub flavor: Option<String>,
    pub flavor_name: Option<String>,
    pub key_name: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub security_groups: Vec<String>,
    pub userdata: Option<Userdata>,
}

/// Userdata is either the literal cloud-init payload or a tagged source the
/// provisioner resolves before calling the provider. The tag set is fixed at
/// compile time; an unknown tag fails deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Userdata {
    Inline(String),
    Remote(RemoteUserdata),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RemoteUserdata {
    Http { url: String },
}

impl Userdata {
    /// Resolves the userdata to its final payload. Remote variants are
    /// fetched with the given client; inline userdata passes through as is.
    pub async fn resolve(&self, client: &reqwest::Client) -> Result<String> {
        match self {
            Userdata::Inline(content) => Ok(content.clone()),
            Userdata::Remote(RemoteUserdata::Http { url }) => {
                let body = client
                    .get(url)
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?;
                Ok(body)
            }
        }
    }
}
