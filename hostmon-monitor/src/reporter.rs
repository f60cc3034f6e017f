use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use serde_json::json;

use hostmon_common::bus::{StateReportEnvelope, CHANNEL_HOST_STATE_EVENTS};

/// Capability through which the monitor communicates an observed node state.
/// One method; the historical lifecycle-hook and event-stream sink shapes
/// are two implementations behind it.
#[async_trait]
pub trait StateReporter: Send + Sync {
    async fn report(&self, report: &StateReportEnvelope) -> Result<()>;
}

/// Publishes each report as a JSON envelope on a pub/sub channel, for
/// event-stream consumers (Riemann-style sinks).
pub struct EventStreamReporter {
    client: redis::Client,
    channel: &'static str,
}

impl EventStreamReporter {
    pub fn new(client: redis::Client) -> Self {
        Self {
            client,
            channel: CHANNEL_HOST_STATE_EVENTS,
        }
    }
}

#[async_trait]
impl StateReporter for EventStreamReporter {
    async fn report(&self, report: &StateReportEnvelope) -> Result<()> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to connect to Redis (publisher)")?;
        let payload = serde_json::to_string(report)?;

        let _: () = conn.publish(self.channel, payload).await?;
        Ok(())
    }
}

/// Calls the orchestration manager's node lifecycle hooks: `started` for a
/// running observation, `stopped` for everything else.
pub struct LifecycleHookReporter {
    client: reqwest::Client,
    base_url: String,
}

impl LifecycleHookReporter {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl StateReporter for LifecycleHookReporter {
    async fn report(&self, report: &StateReportEnvelope) -> Result<()> {
        let hook = if report.state.is_running() {
            "started"
        } else {
            "stopped"
        };
        let url = format!("{}/nodes/{}/{}", self.base_url, report.node_id, hook);

        self.client
            .post(&url)
            .json(&json!({
                "instance": report.instance_label(),
                "observed_at": report.observed_at,
            }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Builds the sink configured by `REPORTER`: `events` (default) publishes to
/// the Redis event stream at `REDIS_URL`; `lifecycle` posts to the manager's
/// node hooks at `MANAGER_URL`.
pub fn from_env() -> Result<Arc<dyn StateReporter>> {
    let kind = std::env::var("REPORTER").unwrap_or_else(|_| "events".to_string());
    match kind.to_lowercase().as_str() {
        "events" => {
            let redis_url = std::env::var("REDIS_URL").context("REDIS_URL must be set")?;
            let client = redis::Client::open(redis_url).context("Invalid REDIS_URL")?;
            Ok(Arc::new(EventStreamReporter::new(client)))
        }
        "lifecycle" => {
            let manager_url = std::env::var("MANAGER_URL").context("MANAGER_URL must be set")?;
            Ok(Arc::new(LifecycleHookReporter::new(manager_url)))
        }
        other => Err(anyhow::anyhow!("unknown reporter kind '{}'", other)),
    }
}
