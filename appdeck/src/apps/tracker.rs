//! Resource tracking seam
//!
//! Created apps are registered with an external tracker so tooling can
//! later enumerate and clean them up. Tracking is bookkeeping, not part
//! of the lifecycle result: failures are logged by the caller, never
//! folded into the app operation's outcome.

use async_trait::async_trait;

use crate::errors::AppsError;

/// External association tracking for created apps
#[async_trait]
pub trait ResourceTracker: Send + Sync {
    /// Record that `name` was created by this tool
    async fn track_app(&self, name: &str) -> Result<(), AppsError>;

    /// Remove the association for `name`
    async fn untrack_app(&self, name: &str) -> Result<(), AppsError>;
}

/// Tracker that records nothing
pub struct NoopTracker;

#[async_trait]
impl ResourceTracker for NoopTracker {
    async fn track_app(&self, _name: &str) -> Result<(), AppsError> {
        Ok(())
    }

    async fn untrack_app(&self, _name: &str) -> Result<(), AppsError> {
        Ok(())
    }
}
