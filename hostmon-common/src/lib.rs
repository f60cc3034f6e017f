use thiserror::Error;

pub mod bus;

// --- Correlation ---

/// Metadata key linking a provider server to an orchestration-layer node.
/// Set on the instance at creation time; servers without it are not
/// reportable and are skipped by the monitor.
pub const NODE_ID_METADATA_KEY: &str = "node_id";

// --- Enums ---

/// Coarse two-valued view of a provider lifecycle status.
/// Anything that is not exactly `ACTIVE` (building, error, paused, shutoff)
/// counts as not running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum NodeState {
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "not running")]
    NotRunning,
}

impl NodeState {
    pub fn from_provider_status(status: &str) -> Self {
        if status == "ACTIVE" {
            NodeState::Running
        } else {
            NodeState::NotRunning
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeState::Running => "running",
            NodeState::NotRunning => "not running",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, NodeState::Running)
    }
}

// --- Errors ---

/// Validation failures raised while shaping a server create request.
/// These are configuration-phase errors: they surface before any provider
/// call is made.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("required parameter '{name}' is missing (under {context})")]
    MissingParameter {
        name: &'static str,
        context: &'static str,
    },

    #[error("no image found with name '{0}'")]
    UnknownImage(String),

    #[error("no flavor found with name '{0}'")]
    UnknownFlavor(String),

    #[error("cannot start server in state '{0}'")]
    NotStartable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_maps_to_running() {
        assert_eq!(NodeState::from_provider_status("ACTIVE"), NodeState::Running);
    }

    #[test]
    fn every_other_status_maps_to_not_running() {
        for status in ["SHUTOFF", "BUILD", "BUILD(spawning)", "ERROR", "PAUSED", "active", ""] {
            assert_eq!(
                NodeState::from_provider_status(status),
                NodeState::NotRunning,
                "status {:?} should map to not running",
                status
            );
        }
    }

    #[test]
    fn state_serializes_with_the_wire_labels() {
        assert_eq!(
            serde_json::to_string(&NodeState::Running).unwrap(),
            "\"running\""
        );
        assert_eq!(
            serde_json::to_string(&NodeState::NotRunning).unwrap(),
            "\"not running\""
        );
    }
}
