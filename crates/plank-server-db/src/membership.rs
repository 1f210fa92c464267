// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Membership repository for database operations.
//!
//! Memberships attach a user to exactly one workspace or project. The
//! capability column is stored as a JSON array of tokens and returned to the
//! resolver undecoded.

use std::str::FromStr;

use async_trait::async_trait;
use plank_server_auth::{
	CapabilitySet, ContextRef, ContextType, FallbackLookup, Membership, MembershipId,
	MembershipLookup, ProjectId, Role, StoreError, StoredMembership, UserId, WorkspaceId,
};
use sqlx::{
	sqlite::{SqlitePool, SqliteRow},
	Row,
};

use crate::error::DbError;
use crate::project::parse_uuid;
use crate::workspace::parse_timestamp;

#[async_trait]
pub trait MembershipStore: Send + Sync {
	async fn get_membership(
		&self,
		context: &ContextRef,
		user_id: &UserId,
	) -> Result<Option<Membership>, DbError>;
	async fn add_member(
		&self,
		context: &ContextRef,
		user_id: &UserId,
		role: Role,
		capabilities: Option<CapabilitySet>,
	) -> Result<Membership, DbError>;
	async fn update_member(
		&self,
		context: &ContextRef,
		user_id: &UserId,
		role: Option<Role>,
		capabilities: Option<CapabilitySet>,
	) -> Result<Membership, DbError>;
	async fn remove_member(&self, context: &ContextRef, user_id: &UserId) -> Result<bool, DbError>;
	async fn list_members(&self, context: &ContextRef) -> Result<Vec<Membership>, DbError>;
	async fn list_memberships_for_user(&self, user_id: &UserId) -> Result<Vec<Membership>, DbError>;
}

/// Repository for membership database operations.
#[derive(Clone)]
pub struct MembershipRepository {
	pool: SqlitePool,
}

impl MembershipRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self), fields(context = %context, user_id = %user_id))]
	pub async fn get_membership(
		&self,
		context: &ContextRef,
		user_id: &UserId,
	) -> Result<Option<Membership>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, context_type, context_id, user_id, role, capabilities, created_at
			FROM memberships
			WHERE context_type = ? AND context_id = ? AND user_id = ?
			"#,
		)
		.bind(context.context_type().as_str())
		.bind(context.id().to_string())
		.bind(user_id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_membership(&r)).transpose()
	}

	/// Add a user to a workspace or project.
	///
	/// When `capabilities` is `None` the role's default set is stored.
	///
	/// # Errors
	/// Returns `DbError::NotFound` if the context does not exist and
	/// `DbError::Conflict` if the user is already a member of it.
	#[tracing::instrument(skip(self, capabilities), fields(context = %context, user_id = %user_id, role = %role))]
	pub async fn add_member(
		&self,
		context: &ContextRef,
		user_id: &UserId,
		role: Role,
		capabilities: Option<CapabilitySet>,
	) -> Result<Membership, DbError> {
		let mut tx = self.pool.begin().await?;

		let exists_query = match context {
			ContextRef::Workspace(_) => "SELECT id FROM workspaces WHERE id = ?",
			ContextRef::Project(_) => "SELECT id FROM projects WHERE id = ?",
		};
		let exists: Option<String> = sqlx::query_scalar(exists_query)
			.bind(context.id().to_string())
			.fetch_optional(&mut *tx)
			.await?;
		if exists.is_none() {
			return Err(DbError::NotFound(format!("{context} not found")));
		}

		let membership = Membership::new(*context, *user_id, role, capabilities);

		sqlx::query(
			r#"
			INSERT INTO memberships (id, context_type, context_id, user_id, role, capabilities, created_at)
			VALUES (?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(membership.id.to_string())
		.bind(context.context_type().as_str())
		.bind(context.id().to_string())
		.bind(user_id.to_string())
		.bind(role.as_str())
		.bind(&membership.capabilities)
		.bind(membership.created_at.to_rfc3339())
		.execute(&mut *tx)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
				DbError::Conflict(format!("User {user_id} is already a member of {context}"))
			}
			_ => DbError::Sqlx(e),
		})?;

		tx.commit().await?;
		tracing::info!(membership_id = %membership.id, "member added");
		Ok(membership)
	}

	/// Change a member's role, capability list, or both.
	///
	/// A `None` list keeps whatever is stored, including on a role change.
	#[tracing::instrument(skip(self, capabilities), fields(context = %context, user_id = %user_id))]
	pub async fn update_member(
		&self,
		context: &ContextRef,
		user_id: &UserId,
		role: Option<Role>,
		capabilities: Option<CapabilitySet>,
	) -> Result<Membership, DbError> {
		let mut existing = self
			.get_membership(context, user_id)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("User {user_id} is not a member of {context}")))?;

		if let Some(role) = role {
			existing.role = role;
		}
		if let Some(capabilities) = capabilities {
			existing.capabilities = Some(capabilities.to_stored());
		}

		let result = sqlx::query(
			r#"
			UPDATE memberships
			SET role = ?, capabilities = ?
			WHERE context_type = ? AND context_id = ? AND user_id = ?
			"#,
		)
		.bind(existing.role.as_str())
		.bind(&existing.capabilities)
		.bind(context.context_type().as_str())
		.bind(context.id().to_string())
		.bind(user_id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!(
				"User {user_id} is not a member of {context}"
			)));
		}

		tracing::info!(role = %existing.role, "member updated");
		Ok(existing)
	}

	#[tracing::instrument(skip(self), fields(context = %context, user_id = %user_id))]
	pub async fn remove_member(&self, context: &ContextRef, user_id: &UserId) -> Result<bool, DbError> {
		let result = sqlx::query(
			r#"
			DELETE FROM memberships
			WHERE context_type = ? AND context_id = ? AND user_id = ?
			"#,
		)
		.bind(context.context_type().as_str())
		.bind(context.id().to_string())
		.bind(user_id.to_string())
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}

	#[tracing::instrument(skip(self), fields(context = %context))]
	pub async fn list_members(&self, context: &ContextRef) -> Result<Vec<Membership>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, context_type, context_id, user_id, role, capabilities, created_at
			FROM memberships
			WHERE context_type = ? AND context_id = ?
			ORDER BY created_at
			"#,
		)
		.bind(context.context_type().as_str())
		.bind(context.id().to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_membership).collect()
	}

	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn list_memberships_for_user(&self, user_id: &UserId) -> Result<Vec<Membership>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, context_type, context_id, user_id, role, capabilities, created_at
			FROM memberships
			WHERE user_id = ?
			ORDER BY created_at
			"#,
		)
		.bind(user_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_membership).collect()
	}

	async fn find_stored(
		&self,
		user_id: &UserId,
		context: &ContextRef,
	) -> Result<Option<StoredMembership>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT role, capabilities
			FROM memberships
			WHERE context_type = ? AND context_id = ? AND user_id = ?
			"#,
		)
		.bind(context.context_type().as_str())
		.bind(context.id().to_string())
		.bind(user_id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row
			.map(|r| {
				let role: String = r.get("role");
				Ok(StoredMembership::new(parse_role(&role)?, read_capabilities(&r)))
			})
			.transpose()
	}

	/// One read: the project's workspace joined with the user's membership there.
	async fn find_workspace_membership_for_project(
		&self,
		user_id: &UserId,
		project_id: &ProjectId,
	) -> Result<FallbackLookup, DbError> {
		let row = sqlx::query(
			r#"
			SELECT p.workspace_id, m.role, m.capabilities
			FROM projects p
			LEFT JOIN memberships m
				ON m.context_type = 'workspace'
				AND m.context_id = p.workspace_id
				AND m.user_id = ?
			WHERE p.id = ?
			"#,
		)
		.bind(user_id.to_string())
		.bind(project_id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		let Some(row) = row else {
			return Ok(FallbackLookup::ProjectMissing);
		};

		let workspace_id: String = row.get("workspace_id");
		let workspace_id = WorkspaceId::new(parse_uuid(&workspace_id, "workspace")?);
		let role: Option<String> = row.get("role");
		let membership = match role {
			Some(role) => Some(StoredMembership::new(
				parse_role(&role)?,
				read_capabilities(&row),
			)),
			None => None,
		};

		Ok(FallbackLookup::Workspace {
			workspace_id,
			membership,
		})
	}
}

/// Stand-in for a capability column that is not readable as text. It is not a
/// JSON array, so non-owner grants built from it are rejected.
const UNDECODABLE_CAPABILITIES: &str = "<undecodable>";

/// Reads the raw capability column without failing the row.
///
/// SQLite columns are dynamically typed, so the column may hold a BLOB or
/// bytes that are not UTF-8. Those rows must still resolve (to no access), so
/// the decode error is swapped for [`UNDECODABLE_CAPABILITIES`].
fn read_capabilities(row: &SqliteRow) -> Option<String> {
	match row.try_get::<Option<String>, _>("capabilities") {
		Ok(raw) => raw,
		Err(e) => {
			tracing::debug!(error = %e, "capability column is not text");
			Some(UNDECODABLE_CAPABILITIES.to_string())
		}
	}
}

fn parse_role(value: &str) -> Result<Role, DbError> {
	Role::from_str(value).map_err(|e| DbError::Internal(e.to_string()))
}

fn row_to_membership(row: &SqliteRow) -> Result<Membership, DbError> {
	let id: String = row.get("id");
	let context_type: String = row.get("context_type");
	let context_id: String = row.get("context_id");
	let user_id: String = row.get("user_id");
	let role: String = row.get("role");
	let created_at: String = row.get("created_at");

	let context_type =
		ContextType::from_str(&context_type).map_err(|e| DbError::Internal(e.to_string()))?;

	Ok(Membership {
		id: MembershipId::new(parse_uuid(&id, "membership")?),
		context: ContextRef::from_parts(parse_uuid(&context_id, "context")?, context_type),
		user_id: UserId::new(parse_uuid(&user_id, "user")?),
		role: parse_role(&role)?,
		capabilities: read_capabilities(row),
		created_at: parse_timestamp(&created_at)?,
	})
}

#[async_trait]
impl MembershipStore for MembershipRepository {
	async fn get_membership(
		&self,
		context: &ContextRef,
		user_id: &UserId,
	) -> Result<Option<Membership>, DbError> {
		self.get_membership(context, user_id).await
	}

	async fn add_member(
		&self,
		context: &ContextRef,
		user_id: &UserId,
		role: Role,
		capabilities: Option<CapabilitySet>,
	) -> Result<Membership, DbError> {
		self.add_member(context, user_id, role, capabilities).await
	}

	async fn update_member(
		&self,
		context: &ContextRef,
		user_id: &UserId,
		role: Option<Role>,
		capabilities: Option<CapabilitySet>,
	) -> Result<Membership, DbError> {
		self.update_member(context, user_id, role, capabilities).await
	}

	async fn remove_member(&self, context: &ContextRef, user_id: &UserId) -> Result<bool, DbError> {
		self.remove_member(context, user_id).await
	}

	async fn list_members(&self, context: &ContextRef) -> Result<Vec<Membership>, DbError> {
		self.list_members(context).await
	}

	async fn list_memberships_for_user(&self, user_id: &UserId) -> Result<Vec<Membership>, DbError> {
		self.list_memberships_for_user(user_id).await
	}
}

#[async_trait]
impl MembershipLookup for MembershipRepository {
	async fn find_membership(
		&self,
		user_id: &UserId,
		context: &ContextRef,
	) -> Result<Option<StoredMembership>, StoreError> {
		Ok(self.find_stored(user_id, context).await?)
	}

	async fn find_fallback_membership(
		&self,
		user_id: &UserId,
		project_id: &ProjectId,
	) -> Result<FallbackLookup, StoreError> {
		Ok(self
			.find_workspace_membership_for_project(user_id, project_id)
			.await?)
	}
}
