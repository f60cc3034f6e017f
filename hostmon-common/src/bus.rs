use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::NodeState;

// -----------------------------------------------------------------------------
// Channels / Streams
// -----------------------------------------------------------------------------

pub const CHANNEL_HOST_STATE_EVENTS: &str = "host_state_events";

// -----------------------------------------------------------------------------
// Host state events (EVT:*)
// -----------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum HostStateEventType {
    #[serde(rename = "EVT:HOST_STATE")]
    HostState,
}

impl HostStateEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostStateEventType::HostState => "EVT:HOST_STATE",
        }
    }
}

/// One observation of a provider server, correlated to a node.
/// Ephemeral: constructed on each monitor tick and forwarded to the sink,
/// never persisted. Identical envelopes on consecutive ticks are expected;
/// the monitor does not deduplicate.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StateReportEnvelope {
    pub event_id: Uuid,
    #[serde(rename = "type")]
    pub event_type: HostStateEventType,
    pub instance_id: String,
    pub node_id: String,
    pub state: NodeState,
    pub observed_at: DateTime<Utc>,
    pub source: String,
}

impl StateReportEnvelope {
    pub fn new(
        instance_id: &str,
        node_id: &str,
        state: NodeState,
        observed_at: DateTime<Utc>,
        source: &str,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: HostStateEventType::HostState,
            instance_id: instance_id.to_string(),
            node_id: node_id.to_string(),
            state,
            observed_at,
            source: source.to_string(),
        }
    }

    /// Label under which the server is reported to lifecycle-hook sinks,
    /// e.g. `server-7af1...`.
    pub fn instance_label(&self) -> String {
        format!("server-{}", self.instance_id)
    }
}
