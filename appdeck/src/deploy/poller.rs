//! Deploy with bounded retries, then poll for the active-deployment
//! transition.
//!
//! The control plane is eventually consistent: right after a deploy
//! call it may still report the previously active deployment id. The
//! poller captures the id active before the call and only treats the
//! rollout as confirmed once a different id is observed.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::errors::AppsError;
use crate::http::apps::ControlPlane;
use crate::models::app::{DeployRequest, Deployment};

/// Deployment poller options
#[derive(Debug, Clone)]
pub struct PollerOptions {
    /// Maximum deploy submission attempts
    pub submit_attempts: u32,

    /// Fixed delay between submission attempts
    pub submit_backoff: Duration,

    /// Total time to wait for the active deployment to transition
    pub poll_deadline: Duration,

    /// Interval between transition polls
    pub poll_interval: Duration,
}

impl Default for PollerOptions {
    fn default() -> Self {
        Self {
            submit_attempts: 5,
            submit_backoff: Duration::from_secs(2),
            poll_deadline: Duration::from_secs(60),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Normalize an app source path to a workspace absolute path.
///
/// Workspace-root shortcuts are rewritten under `/Workspace`; anything
/// else is returned unchanged (create-intent validation happens in the
/// lifecycle manager).
pub fn normalize_source_path(source_code_path: &str) -> String {
    let path = source_code_path.trim();
    if path.starts_with("/Users/") || path.starts_with("/Shared/") || path.starts_with("/Repos/") {
        format!("/Workspace{}", path)
    } else {
        path.to_string()
    }
}

/// Normalize a deployment mode to the API-expected uppercase form.
pub fn normalize_mode(mode: Option<&str>) -> Option<String> {
    let normalized = mode?.trim();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_uppercase())
    }
}

/// Deploy `source_code_path` to `app_name` and wait for the rollout to
/// become visible.
///
/// If the poll deadline elapses without a transition, the original
/// deploy response is returned as-is: accepted but unconfirmed.
pub async fn deploy_app(
    control_plane: &dyn ControlPlane,
    app_name: &str,
    source_code_path: &str,
    mode: Option<&str>,
    options: &PollerOptions,
) -> Result<Deployment, AppsError> {
    let request = DeployRequest {
        source_code_path: normalize_source_path(source_code_path),
        mode: normalize_mode(mode),
    };

    // Capture the currently active deployment so the rollout transition
    // is detectable. Best effort: deployment proceeds without it.
    let previous_id = match control_plane.get_app(app_name).await {
        Ok(app) => app.active_deployment_id().map(str::to_string),
        Err(e) => {
            debug!("Could not read active deployment before deploy: {}", e);
            None
        }
    };

    let deployment = submit(control_plane, app_name, &request, options).await?;
    let new_id = deployment.deployment_id.as_deref();

    // The immediate response can still point at the previous rollout.
    let unconfirmed =
        new_id.is_none() || (previous_id.is_some() && new_id == previous_id.as_deref());
    if !unconfirmed {
        return Ok(deployment);
    }

    let deadline = Instant::now() + options.poll_deadline;
    while Instant::now() < deadline {
        match control_plane.get_app(app_name).await {
            Ok(app) => {
                if let Some(active) = app.active_deployment {
                    if active.deployment_id.is_some()
                        && active.deployment_id != previous_id
                    {
                        return Ok(active);
                    }
                }
            }
            Err(e) => {
                // Transient read failures during rollout; keep polling.
                debug!("Transient read error while polling deployment: {}", e);
            }
        }
        sleep(options.poll_interval).await;
    }

    warn!(
        "No deployment transition observed for {} within {:?}; returning unconfirmed response",
        app_name, options.poll_deadline
    );
    Ok(deployment)
}

/// Submit the deploy request, absorbing "not yet deployable" errors
/// right after app creation. Re-raises the last error once the attempt
/// budget is exhausted.
async fn submit(
    control_plane: &dyn ControlPlane,
    app_name: &str,
    request: &DeployRequest,
    options: &PollerOptions,
) -> Result<Deployment, AppsError> {
    let mut last_error: Option<AppsError> = None;

    for attempt in 1..=options.submit_attempts {
        match control_plane.deploy_app(app_name, request).await {
            Ok(deployment) => return Ok(deployment),
            Err(e) => {
                warn!(
                    "Deploy attempt {}/{} for {} failed: {}",
                    attempt, options.submit_attempts, app_name, e
                );
                last_error = Some(e);
                if attempt < options.submit_attempts {
                    sleep(options.submit_backoff).await;
                }
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| AppsError::Deploy(format!("deploy of {} never submitted", app_name))))
}
