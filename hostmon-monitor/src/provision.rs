use anyhow::Result;

use hostmon_common::{ProvisionError, NODE_ID_METADATA_KEY};
use hostmon_providers::{ComputeProvider, ServerRequest, Userdata};

/// Shapes and submits a server create request for a node: applies the
/// name-to-id sugar, resolves userdata, validates required parameters and
/// injects the node-id correlation key, then asks the provider to create.
/// Returns the provider-assigned server id.
pub async fn create(
    provider: &dyn ComputeProvider,
    node_id: &str,
    mut request: ServerRequest,
) -> Result<String> {
    if request.name.is_none() {
        request.name = Some(node_id.to_string());
    }

    if let Some(image_name) = request.image_name.take() {
        let image_id = provider
            .resolve_image(&image_name)
            .await?
            .ok_or(ProvisionError::UnknownImage(image_name))?;
        request.image = Some(image_id);
    }

    if let Some(flavor_name) = request.flavor_name.take() {
        let flavor_id = provider
            .resolve_flavor(&flavor_name)
            .await?
            .ok_or(ProvisionError::UnknownFlavor(flavor_name))?;
        request.flavor = Some(flavor_id);
    }

    if let Some(userdata) = request.userdata.take() {
        let client = reqwest::Client::new();
        let content = userdata.resolve(&client).await?;
        request.userdata = Some(Userdata::Inline(content));
    }

    require(request.name.is_some(), "name")?;
    require(request.image.is_some(), "image")?;
    require(request.flavor.is_some(), "flavor")?;
    require(request.key_name.is_some(), "key_name")?;

    request
        .metadata
        .insert(NODE_ID_METADATA_KEY.to_string(), node_id.to_string());

    println!(
        "🚀 provision: creating server '{}' for node {}",
        request.name.as_deref().unwrap_or_default(),
        node_id
    );
    let server_id = provider.create_server(&request).await?;
    Ok(server_id)
}

/// Ensures a server is started or on its way there.
///
/// ACTIVE means already started; BUILD means the provider will start it once
/// the build finishes (some clouds report substates as `BUILD(x)`, hence the
/// prefix match). A reboot on a SHUTOFF server powers it back on. Any other
/// state is an error naming the state.
pub async fn start(provider: &dyn ComputeProvider, server_id: &str) -> Result<()> {
    let server = provider
        .get_server(server_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("server {} not found", server_id))?;

    if server.status == "ACTIVE" || server.status.starts_with("BUILD") {
        return Ok(());
    }

    if server.status == "SHUTOFF" {
        provider.reboot_server(server_id).await?;
        return Ok(());
    }

    Err(ProvisionError::NotStartable(server.status).into())
}

/// Deletes a server. Returns false if the provider had already forgotten it.
pub async fn delete(provider: &dyn ComputeProvider, server_id: &str) -> Result<bool> {
    provider.delete_server(server_id).await
}

fn require(present: bool, name: &'static str) -> Result<(), ProvisionError> {
    if present {
        Ok(())
    } else {
        Err(ProvisionError::MissingParameter {
            name,
            context: "server",
        })
    }
}
