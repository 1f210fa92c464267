// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Workspace repository for database operations.
//!
//! Workspaces are the tenant boundary. Deleting one removes its projects (via
//! `ON DELETE CASCADE`) and every membership scoped to the workspace or to
//! any of its projects.

use async_trait::async_trait;
use chrono::Utc;
use plank_server_auth::{UserId, Workspace, WorkspaceId};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;
use crate::project::parse_uuid;

#[async_trait]
pub trait WorkspaceStore: Send + Sync {
	async fn create_workspace(&self, workspace: &Workspace) -> Result<(), DbError>;
	async fn get_workspace_by_id(&self, id: &WorkspaceId) -> Result<Option<Workspace>, DbError>;
	async fn get_workspace_by_slug(&self, slug: &str) -> Result<Option<Workspace>, DbError>;
	async fn list_workspaces_for_user(&self, user_id: &UserId) -> Result<Vec<Workspace>, DbError>;
	async fn delete_workspace(&self, id: &WorkspaceId) -> Result<bool, DbError>;
}

/// Repository for workspace database operations.
#[derive(Clone)]
pub struct WorkspaceRepository {
	pool: SqlitePool,
}

impl WorkspaceRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create a new workspace.
	///
	/// # Errors
	/// Returns `DbError::Conflict` if the slug is already taken.
	#[tracing::instrument(skip(self, workspace), fields(workspace_id = %workspace.id, slug = %workspace.slug))]
	pub async fn create_workspace(&self, workspace: &Workspace) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO workspaces (id, name, slug, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?)
			"#,
		)
		.bind(workspace.id.to_string())
		.bind(&workspace.name)
		.bind(&workspace.slug)
		.bind(workspace.created_at.to_rfc3339())
		.bind(workspace.updated_at.to_rfc3339())
		.execute(&self.pool)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
				DbError::Conflict(format!("Workspace slug '{}' already exists", workspace.slug))
			}
			_ => DbError::Sqlx(e),
		})?;

		tracing::debug!(workspace_id = %workspace.id, "workspace created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(workspace_id = %id))]
	pub async fn get_workspace_by_id(&self, id: &WorkspaceId) -> Result<Option<Workspace>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, name, slug, created_at, updated_at
			FROM workspaces
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_workspace(&r)).transpose()
	}

	#[tracing::instrument(skip(self), fields(slug = %slug))]
	pub async fn get_workspace_by_slug(&self, slug: &str) -> Result<Option<Workspace>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, name, slug, created_at, updated_at
			FROM workspaces
			WHERE slug = ?
			"#,
		)
		.bind(slug)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_workspace(&r)).transpose()
	}

	/// List workspaces the user holds a workspace-level membership in.
	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn list_workspaces_for_user(&self, user_id: &UserId) -> Result<Vec<Workspace>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT w.id, w.name, w.slug, w.created_at, w.updated_at
			FROM workspaces w
			INNER JOIN memberships m
				ON m.context_type = 'workspace' AND m.context_id = w.id
			WHERE m.user_id = ?
			ORDER BY w.name
			"#,
		)
		.bind(user_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_workspace).collect()
	}

	/// Delete a workspace, its projects, and all memberships scoped to either.
	///
	/// # Returns
	/// `false` if no workspace existed with this ID.
	#[tracing::instrument(skip(self), fields(workspace_id = %id))]
	pub async fn delete_workspace(&self, id: &WorkspaceId) -> Result<bool, DbError> {
		let mut tx = self.pool.begin().await?;

		sqlx::query(
			r#"
			DELETE FROM memberships
			WHERE (context_type = 'workspace' AND context_id = ?1)
			   OR (context_type = 'project'
			       AND context_id IN (SELECT id FROM projects WHERE workspace_id = ?1))
			"#,
		)
		.bind(id.to_string())
		.execute(&mut *tx)
		.await?;

		sqlx::query("DELETE FROM projects WHERE workspace_id = ?")
			.bind(id.to_string())
			.execute(&mut *tx)
			.await?;

		let result = sqlx::query("DELETE FROM workspaces WHERE id = ?")
			.bind(id.to_string())
			.execute(&mut *tx)
			.await?;

		tx.commit().await?;

		let deleted = result.rows_affected() > 0;
		if deleted {
			tracing::info!(workspace_id = %id, "workspace deleted");
		}
		Ok(deleted)
	}
}

fn row_to_workspace(row: &sqlx::sqlite::SqliteRow) -> Result<Workspace, DbError> {
	let id: String = row.get("id");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	let id = parse_uuid(&id, "workspace")?;

	Ok(Workspace {
		id: WorkspaceId::new(id),
		name: row.get("name"),
		slug: row.get("slug"),
		created_at: parse_timestamp(&created_at)?,
		updated_at: parse_timestamp(&updated_at)?,
	})
}

pub(crate) fn parse_timestamp(value: &str) -> Result<chrono::DateTime<Utc>, DbError> {
	chrono::DateTime::parse_from_rfc3339(value)
		.map(|d| d.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("Invalid timestamp '{value}': {e}")))
}

#[async_trait]
impl WorkspaceStore for WorkspaceRepository {
	async fn create_workspace(&self, workspace: &Workspace) -> Result<(), DbError> {
		self.create_workspace(workspace).await
	}

	async fn get_workspace_by_id(&self, id: &WorkspaceId) -> Result<Option<Workspace>, DbError> {
		self.get_workspace_by_id(id).await
	}

	async fn get_workspace_by_slug(&self, slug: &str) -> Result<Option<Workspace>, DbError> {
		self.get_workspace_by_slug(slug).await
	}

	async fn list_workspaces_for_user(&self, user_id: &UserId) -> Result<Vec<Workspace>, DbError> {
		self.list_workspaces_for_user(user_id).await
	}

	async fn delete_workspace(&self, id: &WorkspaceId) -> Result<bool, DbError> {
		self.delete_workspace(id).await
	}
}
