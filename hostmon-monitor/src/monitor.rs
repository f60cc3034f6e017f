use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use hostmon_common::bus::StateReportEnvelope;
use hostmon_common::{NodeState, NODE_ID_METADATA_KEY};
use hostmon_providers::inventory::DiscoveredServer;
use hostmon_providers::ComputeProvider;

use crate::reporter::StateReporter;

pub const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 5;

const REPORT_SOURCE: &str = "hostmon-monitor";

/// status-monitor: lists every provider server on a fixed interval and
/// forwards each one's binary state to the sink, keyed by the node id in its
/// metadata. Stateless per tick: identical consecutive observations produce
/// identical consecutive reports, by design.
pub struct StatusMonitor {
    provider: Arc<dyn ComputeProvider>,
    reporter: Arc<dyn StateReporter>,
    interval: Duration,
}

impl StatusMonitor {
    pub fn new(
        provider: Arc<dyn ComputeProvider>,
        reporter: Arc<dyn StateReporter>,
        interval: Duration,
    ) -> Self {
        Self {
            provider,
            reporter,
            interval,
        }
    }

    /// Runs until the token is cancelled. The first pass runs immediately;
    /// a pass in flight when cancellation arrives completes, then the loop
    /// exits without starting another.
    pub async fn run(&self, shutdown: CancellationToken) {
        println!(
            "📡 status-monitor started (probing every {}s)",
            self.interval.as_secs()
        );

        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    println!("📡 status-monitor shutting down");
                    break;
                }

                _ = interval.tick() => {
                    self.report_all_servers().await;
                }
            }
        }
    }

    /// One tick: one provider list, then one report per correlated server.
    /// A list failure makes the tick empty; it never aborts the loop.
    /// Returns the number of reports attempted.
    pub async fn report_all_servers(&self) -> usize {
        let servers = match self.provider.list_servers().await {
            Ok(servers) => servers,
            Err(e) => {
                eprintln!("❌ status-monitor: provider list error: {:?}", e);
                return 0;
            }
        };

        let observed_at = Utc::now();
        let mut reported = 0;
        for server in &servers {
            if self.report_server(server, observed_at).await {
                reported += 1;
            }
        }
        reported
    }

    /// Reports one server, or skips it silently when the node-id correlation
    /// key is absent. Sink failures are logged and swallowed: the sink being
    /// down must not take the monitor down with it.
    async fn report_server(&self, server: &DiscoveredServer, observed_at: DateTime<Utc>) -> bool {
        let Some(node_id) = server.metadata.get(NODE_ID_METADATA_KEY) else {
            return false;
        };

        let state = NodeState::from_provider_status(&server.status);
        let report =
            StateReportEnvelope::new(&server.provider_id, node_id, state, observed_at, REPORT_SOURCE);

        if let Err(e) = self.reporter.report(&report).await {
            eprintln!(
                "⚠️  status-monitor: sink error for node {}: {:?}",
                node_id, e
            );
        }
        true
    }
}
