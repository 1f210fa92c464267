// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Project repository for database operations.

use async_trait::async_trait;
use plank_server_auth::{Project, ProjectId, WorkspaceId};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use crate::error::DbError;
use crate::workspace::parse_timestamp;

#[async_trait]
pub trait ProjectStore: Send + Sync {
	async fn create_project(&self, project: &Project) -> Result<(), DbError>;
	async fn get_project_by_id(&self, id: &ProjectId) -> Result<Option<Project>, DbError>;
	async fn list_projects(&self, workspace_id: &WorkspaceId) -> Result<Vec<Project>, DbError>;
	async fn get_project_workspace(&self, id: &ProjectId) -> Result<Option<WorkspaceId>, DbError>;
}

/// Repository for project database operations.
#[derive(Clone)]
pub struct ProjectRepository {
	pool: SqlitePool,
}

impl ProjectRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create a project inside an existing workspace.
	///
	/// # Errors
	/// Returns `DbError::NotFound` if the workspace does not exist.
	#[tracing::instrument(skip(self, project), fields(project_id = %project.id, workspace_id = %project.workspace_id))]
	pub async fn create_project(&self, project: &Project) -> Result<(), DbError> {
		let mut tx = self.pool.begin().await?;

		let exists: Option<String> = sqlx::query_scalar("SELECT id FROM workspaces WHERE id = ?")
			.bind(project.workspace_id.to_string())
			.fetch_optional(&mut *tx)
			.await?;
		if exists.is_none() {
			return Err(DbError::NotFound(format!(
				"Workspace {} not found",
				project.workspace_id
			)));
		}

		sqlx::query(
			r#"
			INSERT INTO projects (id, workspace_id, name, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?)
			"#,
		)
		.bind(project.id.to_string())
		.bind(project.workspace_id.to_string())
		.bind(&project.name)
		.bind(project.created_at.to_rfc3339())
		.bind(project.updated_at.to_rfc3339())
		.execute(&mut *tx)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
				DbError::Conflict(format!("Project {} already exists", project.id))
			}
			_ => DbError::Sqlx(e),
		})?;

		tx.commit().await?;
		tracing::debug!(project_id = %project.id, "project created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(project_id = %id))]
	pub async fn get_project_by_id(&self, id: &ProjectId) -> Result<Option<Project>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, workspace_id, name, created_at, updated_at
			FROM projects
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_project(&r)).transpose()
	}

	#[tracing::instrument(skip(self), fields(workspace_id = %workspace_id))]
	pub async fn list_projects(&self, workspace_id: &WorkspaceId) -> Result<Vec<Project>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, workspace_id, name, created_at, updated_at
			FROM projects
			WHERE workspace_id = ?
			ORDER BY name
			"#,
		)
		.bind(workspace_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_project).collect()
	}

	/// The workspace that owns a project, or `None` if the project is unknown.
	#[tracing::instrument(skip(self), fields(project_id = %id))]
	pub async fn get_project_workspace(&self, id: &ProjectId) -> Result<Option<WorkspaceId>, DbError> {
		let workspace_id: Option<String> =
			sqlx::query_scalar("SELECT workspace_id FROM projects WHERE id = ?")
				.bind(id.to_string())
				.fetch_optional(&self.pool)
				.await?;

		workspace_id
			.map(|s| parse_uuid(&s, "workspace").map(WorkspaceId::new))
			.transpose()
	}
}

fn row_to_project(row: &sqlx::sqlite::SqliteRow) -> Result<Project, DbError> {
	let id: String = row.get("id");
	let workspace_id: String = row.get("workspace_id");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	Ok(Project {
		id: ProjectId::new(parse_uuid(&id, "project")?),
		workspace_id: WorkspaceId::new(parse_uuid(&workspace_id, "workspace")?),
		name: row.get("name"),
		created_at: parse_timestamp(&created_at)?,
		updated_at: parse_timestamp(&updated_at)?,
	})
}

pub(crate) fn parse_uuid(value: &str, kind: &str) -> Result<Uuid, DbError> {
	Uuid::parse_str(value).map_err(|e| DbError::Internal(format!("Invalid {kind} id '{value}': {e}")))
}

#[async_trait]
impl ProjectStore for ProjectRepository {
	async fn create_project(&self, project: &Project) -> Result<(), DbError> {
		self.create_project(project).await
	}

	async fn get_project_by_id(&self, id: &ProjectId) -> Result<Option<Project>, DbError> {
		self.get_project_by_id(id).await
	}

	async fn list_projects(&self, workspace_id: &WorkspaceId) -> Result<Vec<Project>, DbError> {
		self.list_projects(workspace_id).await
	}

	async fn get_project_workspace(&self, id: &ProjectId) -> Result<Option<WorkspaceId>, DbError> {
		self.get_project_workspace(id).await
	}
}
