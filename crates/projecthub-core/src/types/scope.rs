//! Viewer identity and aggregation scope.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who is looking, and at what.
///
/// The dashboard view has no project scope and aggregates across every
/// project the viewer belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewerScope {
    /// The viewing user.
    pub username: String,
    /// The project in view, or `None` for the global dashboard.
    pub project_id: Option<Uuid>,
}

impl ViewerScope {
    /// Scope onto a single project.
    pub fn project(username: impl Into<String>, project_id: Uuid) -> Self {
        Self {
            username: username.into(),
            project_id: Some(project_id),
        }
    }

    /// Global dashboard scope across all of the viewer's projects.
    pub fn global(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            project_id: None,
        }
    }

    /// Whether a project falls inside this scope.
    pub fn covers(&self, project_id: Uuid) -> bool {
        match self.project_id {
            Some(scoped) => scoped == project_id,
            None => true,
        }
    }
}
