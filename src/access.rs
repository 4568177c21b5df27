use std::sync::Arc;
use uuid::Uuid;

use crate::directory::ProjectDirectory;
use crate::error::{AppError, AppResult};

/// The single authorization policy for chat.
///
/// A user may read, post to, and (when strict joins are on) join a project's
/// room iff they own the project or are in its member list. Unknown projects
/// deny.
#[derive(Clone)]
pub struct AccessGate {
    projects: Arc<dyn ProjectDirectory>,
}

impl AccessGate {
    pub fn new(projects: Arc<dyn ProjectDirectory>) -> Self {
        Self { projects }
    }

    pub async fn can_access(&self, user_id: Uuid, project_id: Uuid) -> AppResult<bool> {
        let project = self
            .projects
            .get_project(project_id)
            .await
            .map_err(|e| AppError::store(format!("project lookup failed: {e:#}")))?;

        Ok(project.is_some_and(|p| p.includes(user_id)))
    }

    /// Like `can_access`, but denial becomes `AppError::Forbidden`
    pub async fn ensure_access(&self, user_id: Uuid, project_id: Uuid) -> AppResult<()> {
        if self.can_access(user_id, project_id).await? {
            Ok(())
        } else {
            Err(AppError::forbidden("Access denied to this project"))
        }
    }

    /// Owner-only operations (project announcements)
    pub async fn ensure_owner(&self, user_id: Uuid, project_id: Uuid) -> AppResult<()> {
        let project = self
            .projects
            .get_project(project_id)
            .await
            .map_err(|e| AppError::store(format!("project lookup failed: {e:#}")))?;

        match project {
            Some(p) if p.owner_id == user_id => Ok(()),
            _ => Err(AppError::forbidden("Only the project owner can do this")),
        }
    }
}
