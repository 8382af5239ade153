//! App lifecycle manager tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use appdeck::apps::manager::{AppManager, CreateOrUpdateApp, ListApps};
use appdeck::apps::tracker::ResourceTracker;
use appdeck::errors::AppsError;
use appdeck::http::apps::ControlPlane;
use appdeck::models::app::{AppRecord, DeployRequest, Deployment};
use async_trait::async_trait;

/// In-memory control plane preserving creation order.
#[derive(Default)]
struct FakeControlPlane {
    apps: Mutex<Vec<AppRecord>>,
    deploy_counter: AtomicUsize,
}

impl FakeControlPlane {
    fn with_apps(names: &[&str]) -> Self {
        let cp = Self::default();
        {
            let mut apps = cp.apps.lock().unwrap();
            for name in names {
                apps.push(AppRecord {
                    name: name.to_string(),
                    url: Some(format!("https://{name}.apps.example.com")),
                    ..Default::default()
                });
            }
        }
        cp
    }
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn create_app(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<AppRecord, AppsError> {
        let app = AppRecord {
            name: name.to_string(),
            description: description.map(str::to_string),
            url: Some(format!("https://{name}.apps.example.com")),
            ..Default::default()
        };
        self.apps.lock().unwrap().push(app.clone());
        Ok(app)
    }

    async fn get_app(&self, name: &str) -> Result<AppRecord, AppsError> {
        self.apps
            .lock()
            .unwrap()
            .iter()
            .find(|app| app.name == name)
            .cloned()
            .ok_or_else(|| AppsError::NotFound(name.to_string()))
    }

    async fn list_apps(&self) -> Result<Vec<AppRecord>, AppsError> {
        Ok(self.apps.lock().unwrap().clone())
    }

    async fn deploy_app(
        &self,
        name: &str,
        request: &DeployRequest,
    ) -> Result<Deployment, AppsError> {
        let id = self.deploy_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let deployment = Deployment {
            deployment_id: Some(format!("dep-{id}")),
            source_code_path: Some(request.source_code_path.clone()),
            mode: request.mode.clone(),
            ..Default::default()
        };

        let mut apps = self.apps.lock().unwrap();
        let app = apps
            .iter_mut()
            .find(|app| app.name == name)
            .ok_or_else(|| AppsError::NotFound(name.to_string()))?;
        app.active_deployment = Some(deployment.clone());
        Ok(deployment)
    }

    async fn delete_app(&self, name: &str) -> Result<(), AppsError> {
        let mut apps = self.apps.lock().unwrap();
        let before = apps.len();
        apps.retain(|app| app.name != name);
        if apps.len() == before {
            return Err(AppsError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn start_app(&self, _name: &str) -> Result<(), AppsError> {
        Ok(())
    }
}

/// Tracker recording every association change.
#[derive(Default)]
struct RecordingTracker {
    tracked: Mutex<Vec<String>>,
    untracked: Mutex<Vec<String>>,
}

#[async_trait]
impl ResourceTracker for RecordingTracker {
    async fn track_app(&self, name: &str) -> Result<(), AppsError> {
        self.tracked.lock().unwrap().push(name.to_string());
        Ok(())
    }

    async fn untrack_app(&self, name: &str) -> Result<(), AppsError> {
        self.untracked.lock().unwrap().push(name.to_string());
        Ok(())
    }
}

fn request(name: &str, path: Option<&str>) -> CreateOrUpdateApp {
    CreateOrUpdateApp {
        name: name.to_string(),
        source_code_path: path.map(str::to_string),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create_or_update_is_idempotent_without_path() {
    let cp = FakeControlPlane::with_apps(&["app1"]);
    let tracker = RecordingTracker::default();
    let manager = AppManager::new(&cp, &tracker);

    let first = manager.create_or_update(request("app1", None)).await.unwrap();
    assert!(!first.created);
    let second = manager.create_or_update(request("app1", None)).await.unwrap();
    assert!(!second.created);

    // Only creations are tracked.
    assert!(tracker.tracked.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_deploys_and_reports_created() {
    let cp = FakeControlPlane::default();
    let tracker = RecordingTracker::default();
    let manager = AppManager::new(&cp, &tracker);

    let summary = manager
        .create_or_update(request("app2", Some("/Workspace/Users/me/app2")))
        .await
        .unwrap();

    assert!(summary.created);
    let deployment = summary.deployment.expect("deployment info merged");
    assert_eq!(deployment.deployment_id.as_deref(), Some("dep-1"));
    assert_eq!(
        summary.deployed_source_code_path.as_deref(),
        Some("/Workspace/Users/me/app2")
    );
    assert_eq!(tracker.tracked.lock().unwrap().as_slice(), ["app2"]);
}

#[tokio::test]
async fn test_shorthand_path_is_normalized_before_deploy() {
    let cp = FakeControlPlane::default();
    let tracker = RecordingTracker::default();
    let manager = AppManager::new(&cp, &tracker);

    let summary = manager
        .create_or_update(request("app3", Some("/Users/me/app3")))
        .await
        .unwrap();

    assert_eq!(
        summary.deployed_source_code_path.as_deref(),
        Some("/Workspace/Users/me/app3")
    );
}

#[tokio::test]
async fn test_missing_path_for_new_app_is_a_validation_error() {
    let cp = FakeControlPlane::default();
    let tracker = RecordingTracker::default();
    let manager = AppManager::new(&cp, &tracker);

    let err = manager
        .create_or_update(request("brand-new", None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppsError::Validation(_)));
}

#[tokio::test]
async fn test_unrecognized_path_is_a_validation_error() {
    let cp = FakeControlPlane::default();
    let tracker = RecordingTracker::default();
    let manager = AppManager::new(&cp, &tracker);

    for path in ["relative/app", "/tmp/app", "./app"] {
        let err = manager
            .create_or_update(request("app4", Some(path)))
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(
            matches!(err, AppsError::Validation(_)),
            "path {:?} should be rejected",
            path
        );
        // The error names the accepted prefixes.
        assert!(message.contains("/Workspace/"));
    }
    assert!(cp.apps.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_filters_and_caps_in_order() {
    let cp = FakeControlPlane::with_apps(&["web-a", "batch-b", "Web-c", "web-d"]);
    let tracker = RecordingTracker::default();
    let manager = AppManager::new(&cp, &tracker);

    let filtered = manager
        .list(ListApps {
            name_contains: Some("WEB".to_string()),
            limit: None,
        })
        .await
        .unwrap();
    let names: Vec<&str> = filtered.iter().map(|app| app.name.as_str()).collect();
    assert_eq!(names, ["web-a", "Web-c", "web-d"]);

    let capped = manager
        .list(ListApps {
            name_contains: Some("web".to_string()),
            limit: Some(2),
        })
        .await
        .unwrap();
    assert_eq!(capped.len(), 2);

    let unlimited = manager
        .list(ListApps {
            name_contains: None,
            limit: Some(0),
        })
        .await
        .unwrap();
    assert_eq!(unlimited.len(), 4);
}

#[tokio::test]
async fn test_delete_removes_app_and_tracking() {
    let cp = FakeControlPlane::with_apps(&["app5"]);
    let tracker = RecordingTracker::default();
    let manager = AppManager::new(&cp, &tracker);

    let confirmation = manager.delete("app5").await.unwrap();
    assert_eq!(confirmation.status, "deleted");
    assert_eq!(tracker.untracked.lock().unwrap().as_slice(), ["app5"]);
}

#[tokio::test]
async fn test_delete_missing_app_surfaces_not_found() {
    let cp = FakeControlPlane::default();
    let tracker = RecordingTracker::default();
    let manager = AppManager::new(&cp, &tracker);

    let err = manager.delete("ghost").await.unwrap_err();
    assert!(err.is_not_found());
    // No association is removed for a failed delete.
    assert!(tracker.untracked.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_missing_app_surfaces_not_found() {
    let cp = FakeControlPlane::default();
    let tracker = RecordingTracker::default();
    let manager = AppManager::new(&cp, &tracker);

    let err = manager.get("ghost").await.unwrap_err();
    assert!(err.is_not_found());
}
