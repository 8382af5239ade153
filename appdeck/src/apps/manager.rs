//! App lifecycle manager: idempotent create-or-update, get/list, delete

use serde::Serialize;
use tracing::{info, warn};

use crate::apps::tracker::ResourceTracker;
use crate::deploy::poller::{self, PollerOptions};
use crate::errors::AppsError;
use crate::http::apps::ControlPlane;
use crate::models::app::{AppRecord, Deployment};

/// Default cap on list results (0 = unlimited)
pub const DEFAULT_LIST_LIMIT: usize = 20;

/// Workspace-root prefixes accepted as an explicit source path
const WORKSPACE_PREFIXES: [&str; 4] = ["/Workspace/", "/Users/", "/Shared/", "/Repos/"];

/// Parameters for [`AppManager::create_or_update`]
#[derive(Debug, Clone, Default)]
pub struct CreateOrUpdateApp {
    /// App name (unique within the workspace)
    pub name: String,

    /// Workspace path to deploy from; required when the app does not
    /// exist yet
    pub source_code_path: Option<String>,

    /// Description, used on create only
    pub description: Option<String>,

    /// Deployment mode (e.g. "snapshot")
    pub mode: Option<String>,
}

/// Result of a create-or-update call
#[derive(Debug, Clone, Serialize)]
pub struct AppSummary {
    #[serde(flatten)]
    pub app: AppRecord,

    /// True if the app was newly created by this call
    pub created: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment: Option<Deployment>,

    /// Path actually deployed, after normalization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployed_source_code_path: Option<String>,
}

/// Confirmation of a delete call
#[derive(Debug, Clone, Serialize)]
pub struct DeleteConfirmation {
    pub name: String,
    pub status: String,
}

/// Filtering options for [`AppManager::list`]
#[derive(Debug, Clone, Default)]
pub struct ListApps {
    /// Case-insensitive substring filter on app names
    pub name_contains: Option<String>,

    /// Maximum results; `None` applies [`DEFAULT_LIST_LIMIT`], 0 means
    /// unlimited
    pub limit: Option<usize>,
}

/// Top-level orchestration over the control plane
pub struct AppManager<'a> {
    control_plane: &'a dyn ControlPlane,
    tracker: &'a dyn ResourceTracker,
    poller: PollerOptions,
}

impl<'a> AppManager<'a> {
    pub fn new(control_plane: &'a dyn ControlPlane, tracker: &'a dyn ResourceTracker) -> Self {
        Self {
            control_plane,
            tracker,
            poller: PollerOptions::default(),
        }
    }

    pub fn with_poller_options(mut self, poller: PollerOptions) -> Self {
        self.poller = poller;
        self
    }

    /// Create the app if it does not exist, then deploy if a source
    /// path was supplied. Idempotent: an existing app is never
    /// recreated.
    pub async fn create_or_update(
        &self,
        params: CreateOrUpdateApp,
    ) -> Result<AppSummary, AppsError> {
        let source_code_path = params
            .source_code_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());

        let existing = self.find_by_name(&params.name).await?;

        // Never guess or invent paths: creating a brand-new app needs
        // an explicit workspace path.
        if existing.is_none() && source_code_path.is_none() {
            return Err(AppsError::Validation(
                "source_code_path is required to create and deploy a new app. \
                 Provide an existing workspace path like /Workspace/Users/<you>/<app_dir>."
                    .to_string(),
            ));
        }
        if let Some(path) = source_code_path {
            if !is_explicit_workspace_path(path) {
                return Err(AppsError::Validation(format!(
                    "source_code_path is unclear. Provide an explicit workspace path \
                     starting with {}.",
                    WORKSPACE_PREFIXES.join(", ")
                )));
            }
        }

        let (app, created) = match existing {
            Some(app) => (app, false),
            None => {
                let app = self
                    .control_plane
                    .create_app(&params.name, params.description.as_deref())
                    .await?;
                info!("Created app {}", app.name);
                if let Err(e) = self.tracker.track_app(&app.name).await {
                    warn!("Failed to track created app {}: {}", app.name, e);
                }
                (app, true)
            }
        };

        let mut summary = AppSummary {
            app,
            created,
            deployment: None,
            deployed_source_code_path: None,
        };

        if let Some(path) = source_code_path {
            let deployment = poller::deploy_app(
                self.control_plane,
                &params.name,
                path,
                params.mode.as_deref(),
                &self.poller,
            )
            .await?;
            summary.deployed_source_code_path = deployment.source_code_path.clone();
            summary.deployment = Some(deployment);
        }

        Ok(summary)
    }

    /// Get full detail for one app
    pub async fn get(&self, name: &str) -> Result<AppRecord, AppsError> {
        self.control_plane.get_app(name).await
    }

    /// List apps in API order, optionally filtered by name substring
    pub async fn list(&self, params: ListApps) -> Result<Vec<AppRecord>, AppsError> {
        let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
        let filter = params.name_contains.map(|f| f.to_lowercase());

        let mut results = Vec::new();
        for app in self.control_plane.list_apps().await? {
            if let Some(filter) = &filter {
                if !app.name.to_lowercase().contains(filter.as_str()) {
                    continue;
                }
            }
            results.push(app);
            if limit != 0 && results.len() >= limit {
                break;
            }
        }
        Ok(results)
    }

    /// Delete an app. Not idempotent: deleting an absent app surfaces
    /// the control plane's not-found error.
    pub async fn delete(&self, name: &str) -> Result<DeleteConfirmation, AppsError> {
        self.control_plane.delete_app(name).await?;
        if let Err(e) = self.tracker.untrack_app(name).await {
            warn!("Failed to untrack deleted app {}: {}", name, e);
        }
        Ok(DeleteConfirmation {
            name: name.to_string(),
            status: "deleted".to_string(),
        })
    }

    /// Look up an app by name, distinguishing "absent" from real
    /// failures.
    async fn find_by_name(&self, name: &str) -> Result<Option<AppRecord>, AppsError> {
        match self.control_plane.get_app(name).await {
            Ok(app) => Ok(Some(app)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// True when `path` is an explicit workspace path rather than something
/// that would need to be inferred.
fn is_explicit_workspace_path(path: &str) -> bool {
    WORKSPACE_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}
