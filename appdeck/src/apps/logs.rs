//! App log retrieval over the raw WebSocket stream

use serde::Serialize;
use url::Url;

use crate::config::WorkspaceOptions;
use crate::errors::AppsError;
use crate::http::apps::ControlPlane;
use crate::ws::handshake::{self, LOG_STREAM_PATH};
use crate::ws::session::{stream_logs, LogStreamOptions};

/// Logs fetched for one deployment
#[derive(Debug, Clone, Serialize)]
pub struct AppLogs {
    pub app_name: String,
    pub deployment_id: String,
    /// Multi-line opaque log text
    pub logs: String,
}

/// Fetch recent log output directly from the running app instance.
///
/// With no `deployment_id` the active deployment is used; its id is the
/// subscribe search term, narrowing logs to that rollout.
pub async fn fetch_app_logs(
    control_plane: &dyn ControlPlane,
    workspace: &WorkspaceOptions,
    app_name: &str,
    deployment_id: Option<&str>,
) -> Result<AppLogs, AppsError> {
    let app = control_plane.get_app(app_name).await?;

    let deployment_id = match deployment_id {
        Some(id) => id.to_string(),
        None => app
            .active_deployment_id()
            .map(str::to_string)
            .ok_or_else(|| {
                AppsError::NotFound(format!("App {} has no active deployment", app_name))
            })?,
    };

    let app_url = app
        .url
        .as_deref()
        .map(|u| u.trim_end_matches('/'))
        .filter(|u| !u.is_empty())
        .ok_or_else(|| {
            AppsError::Validation(format!(
                "App {} has no URL; cannot fetch {} logs",
                app_name, LOG_STREAM_PATH
            ))
        })?
        .to_string();

    let parsed = Url::parse(&app_url)
        .map_err(|e| AppsError::Validation(format!("Invalid app URL {}: {}", app_url, e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| AppsError::Validation(format!("Invalid app URL: {}", app_url)))?;

    let (stream, leftover) = handshake::connect(
        host,
        LOG_STREAM_PATH,
        &workspace.authorization(),
        &app_url,
        workspace.connect_timeout,
    )
    .await?;

    let options = LogStreamOptions {
        search: deployment_id.clone(),
        ..Default::default()
    };
    let logs = stream_logs(stream, leftover, &options).await?;

    Ok(AppLogs {
        app_name: app_name.to_string(),
        deployment_id,
        logs,
    })
}
