//! Apps control-plane API

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppsError;
use crate::http::client::HttpClient;
use crate::models::app::{AppRecord, DeployRequest, Deployment};

/// Control-plane operations for managed apps.
///
/// Implemented by [`RestControlPlane`] against the workspace REST API;
/// tests substitute scripted implementations.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn create_app(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<AppRecord, AppsError>;

    async fn get_app(&self, name: &str) -> Result<AppRecord, AppsError>;

    async fn list_apps(&self) -> Result<Vec<AppRecord>, AppsError>;

    async fn deploy_app(
        &self,
        name: &str,
        request: &DeployRequest,
    ) -> Result<Deployment, AppsError>;

    async fn delete_app(&self, name: &str) -> Result<(), AppsError>;

    /// Restart the app's compute (used by the health checker).
    async fn start_app(&self, name: &str) -> Result<(), AppsError>;
}

#[derive(Debug, Serialize)]
struct CreateAppRequest<'a> {
    name: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ListAppsResponse {
    #[serde(default)]
    apps: Vec<AppRecord>,
}

/// REST implementation of [`ControlPlane`]
pub struct RestControlPlane {
    http: HttpClient,
}

impl RestControlPlane {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ControlPlane for RestControlPlane {
    async fn create_app(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<AppRecord, AppsError> {
        self.http
            .post("/api/2.0/apps", &CreateAppRequest { name, description })
            .await
    }

    async fn get_app(&self, name: &str) -> Result<AppRecord, AppsError> {
        self.http.get(&format!("/api/2.0/apps/{}", name)).await
    }

    async fn list_apps(&self) -> Result<Vec<AppRecord>, AppsError> {
        let response: ListAppsResponse = self.http.get("/api/2.0/apps").await?;
        Ok(response.apps)
    }

    async fn deploy_app(
        &self,
        name: &str,
        request: &DeployRequest,
    ) -> Result<Deployment, AppsError> {
        self.http
            .post(&format!("/api/2.0/apps/{}/deployments", name), request)
            .await
    }

    async fn delete_app(&self, name: &str) -> Result<(), AppsError> {
        self.http.delete(&format!("/api/2.0/apps/{}", name)).await
    }

    async fn start_app(&self, name: &str) -> Result<(), AppsError> {
        let _: serde_json::Value = self
            .http
            .post(&format!("/api/2.0/apps/{}/start", name), &serde_json::json!({}))
            .await?;
        Ok(())
    }
}
