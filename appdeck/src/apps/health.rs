//! App health checking with automatic restart
//!
//! Health is judged twice: the control plane must report ACTIVE compute
//! and a RUNNING app, and the instance itself must answer an HTTP probe.
//! Gateway errors and probe timeouts mean the instance is frozen even
//! though the control plane still calls it healthy.

use std::time::Duration;

use reqwest::header;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::WorkspaceOptions;
use crate::errors::AppsError;
use crate::http::apps::ControlPlane;

/// HTTP status codes that indicate the gateway cannot reach the app
const GATEWAY_ERRORS: [u16; 3] = [502, 503, 504];

/// Probe endpoint confirming auth and responsiveness
const PROBE_PATH: &str = "/api/user/me";

/// Health check options
#[derive(Debug, Clone)]
pub struct HealthOptions {
    /// HTTP probe timeout
    pub http_timeout: Duration,

    /// Restart the app when it is unhealthy or frozen
    pub restart_on_unhealthy: bool,
}

impl Default for HealthOptions {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(20),
            restart_on_unhealthy: true,
        }
    }
}

/// Outcome of one health check
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub app_name: String,
    pub healthy: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_secs: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    /// True when this check triggered a restart
    pub restarted: bool,
}

/// Check one app's health, restarting it when unhealthy or frozen.
pub async fn check_app(
    control_plane: &dyn ControlPlane,
    workspace: &WorkspaceOptions,
    app_name: &str,
    options: &HealthOptions,
) -> Result<HealthReport, AppsError> {
    let app = control_plane.get_app(app_name).await?;

    let compute_state = app
        .compute_status
        .as_ref()
        .and_then(|s| s.state.clone());
    let app_state = app.app_status.as_ref().and_then(|s| s.state.clone());

    let mut report = HealthReport {
        app_name: app_name.to_string(),
        healthy: true,
        compute_state: compute_state.clone(),
        app_state: app_state.clone(),
        status_code: None,
        response_time_secs: None,
        warning: None,
        restarted: false,
    };

    let compute_ok = compute_state.as_deref() == Some("ACTIVE");
    let app_ok = app_state.as_deref() == Some("RUNNING");
    if !(compute_ok && app_ok) {
        warn!(
            "App {} unhealthy - compute: {:?}, app: {:?}",
            app_name, compute_state, app_state
        );
        report.healthy = false;
        report.restarted = restart(control_plane, app_name, options).await;
        return Ok(report);
    }

    let Some(url) = app.url.as_deref().filter(|u| !u.is_empty()) else {
        report.warning = Some("no_url".to_string());
        return Ok(report);
    };

    probe(workspace, app_name, url, options, control_plane, report).await
}

async fn probe(
    workspace: &WorkspaceOptions,
    app_name: &str,
    url: &str,
    options: &HealthOptions,
    control_plane: &dyn ControlPlane,
    mut report: HealthReport,
) -> Result<HealthReport, AppsError> {
    let client = reqwest::Client::builder()
        .timeout(options.http_timeout)
        .build()?;
    let probe_url = format!("{}{}", url.trim_end_matches('/'), PROBE_PATH);

    let start = std::time::Instant::now();
    let response = client
        .get(&probe_url)
        .header(header::AUTHORIZATION, workspace.authorization())
        .send()
        .await;

    let response = match response {
        Ok(response) => response,
        Err(e) => {
            // Timeout or connection failure: the instance is frozen.
            warn!("App {} probe failed: {}", app_name, e);
            report.healthy = false;
            report.warning = Some(if e.is_timeout() {
                "probe_timeout".to_string()
            } else {
                "connection_error".to_string()
            });
            report.restarted = restart(control_plane, app_name, options).await;
            return Ok(report);
        }
    };

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    report.status_code = Some(status);
    report.response_time_secs = Some(start.elapsed().as_secs_f64());

    let frozen = GATEWAY_ERRORS.contains(&status)
        || body.to_lowercase().contains("upstream request timeout");
    if frozen {
        warn!("App {} frozen (HTTP {})", app_name, status);
        report.healthy = false;
        report.restarted = restart(control_plane, app_name, options).await;
        return Ok(report);
    }

    match status {
        200 => info!(
            "App {} healthy ({}s)",
            app_name,
            report.response_time_secs.unwrap_or_default()
        ),
        // The app answered; only the credential is in question.
        401 | 403 => report.warning = Some("auth_issue".to_string()),
        _ => report.warning = Some("unexpected_status".to_string()),
    }
    Ok(report)
}

async fn restart(
    control_plane: &dyn ControlPlane,
    app_name: &str,
    options: &HealthOptions,
) -> bool {
    if !options.restart_on_unhealthy {
        return false;
    }
    info!("Restarting app {}", app_name);
    match control_plane.start_app(app_name).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to restart app {}: {}", app_name, e);
            false
        }
    }
}
