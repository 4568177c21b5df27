// ============================================================================
// External Collaborators
// ============================================================================
//
// User profiles and project membership live in other services' tables.
// The chat subsystem only reads them, through these two traits:
//
// - UserDirectory:    get_user(id)    -> display name snapshot for senders
// - ProjectDirectory: get_project(id) -> owner + members for the Access Gate
//
// PostgreSQL readers are used in production; the in-memory directory backs
// tests and local development.
//
// ============================================================================

use anyhow::{Context, Result};
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMembership {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub member_ids: Vec<Uuid>,
}

impl ProjectMembership {
    pub fn includes(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id || self.member_ids.contains(&user_id)
    }
}

#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserProfile>>;
}

#[async_trait::async_trait]
pub trait ProjectDirectory: Send + Sync {
    async fn get_project(&self, project_id: Uuid) -> Result<Option<ProjectMembership>>;
}

// ============================================================================
// PostgreSQL readers
// ============================================================================

pub struct PostgresDirectory {
    pool: PgPool,
}

impl PostgresDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserDirectory for PostgresDirectory {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
        let user = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, display_name
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load user profile")?;

        Ok(user)
    }
}

#[async_trait::async_trait]
impl ProjectDirectory for PostgresDirectory {
    async fn get_project(&self, project_id: Uuid) -> Result<Option<ProjectMembership>> {
        let owner_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT owner_id
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load project")?;

        let Some(owner_id) = owner_id else {
            return Ok(None);
        };

        let member_ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id
            FROM project_members
            WHERE project_id = $1
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load project members")?;

        Ok(Some(ProjectMembership {
            id: project_id,
            owner_id,
            member_ids,
        }))
    }
}

// ============================================================================
// In-memory directory
// ============================================================================

#[derive(Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashMap<Uuid, UserProfile>>,
    projects: RwLock<HashMap<Uuid, ProjectMembership>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, display_name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.users.write().await.insert(
            id,
            UserProfile {
                id,
                display_name: display_name.to_string(),
            },
        );
        id
    }

    pub async fn remove_user(&self, user_id: Uuid) {
        self.users.write().await.remove(&user_id);
    }

    pub async fn add_project(&self, owner_id: Uuid, member_ids: Vec<Uuid>) -> Uuid {
        let id = Uuid::new_v4();
        self.projects.write().await.insert(
            id,
            ProjectMembership {
                id,
                owner_id,
                member_ids,
            },
        );
        id
    }

    pub async fn add_member(&self, project_id: Uuid, user_id: Uuid) {
        if let Some(project) = self.projects.write().await.get_mut(&project_id) {
            if !project.member_ids.contains(&user_id) {
                project.member_ids.push(user_id);
            }
        }
    }
}

#[async_trait::async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }
}

#[async_trait::async_trait]
impl ProjectDirectory for InMemoryDirectory {
    async fn get_project(&self, project_id: Uuid) -> Result<Option<ProjectMembership>> {
        Ok(self.projects.read().await.get(&project_id).cloned())
    }
}
