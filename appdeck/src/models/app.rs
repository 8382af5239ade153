//! App and deployment models

use serde::{Deserialize, Serialize};

/// A managed app as reported by the control plane
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppRecord {
    /// App name (unique within the workspace)
    pub name: String,

    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Public URL of the running app instance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Compute status (e.g. ACTIVE, STARTING)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_status: Option<StateStatus>,

    /// Application status (e.g. RUNNING, CRASHED)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_status: Option<StateStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,

    /// Currently active deployment, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_deployment: Option<Deployment>,
}

impl AppRecord {
    /// Deployment id of the active deployment, if one is reported.
    pub fn active_deployment_id(&self) -> Option<&str> {
        self.active_deployment
            .as_ref()
            .and_then(|d| d.deployment_id.as_deref())
    }
}

/// A state/message pair used for both compute and app status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One versioned rollout of source code to a running app instance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Deployment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,

    /// Workspace path the code was deployed from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_code_path: Option<String>,

    /// Deployment mode (e.g. SNAPSHOT)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StateStatus>,
}

/// Request body for a deploy call
#[derive(Debug, Clone, Serialize)]
pub struct DeployRequest {
    pub source_code_path: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}
