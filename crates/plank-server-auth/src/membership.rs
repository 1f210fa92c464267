// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Workspace, project and membership types.
//!
//! This module provides:
//! - [`Workspace`] - the top-level tenant boundary
//! - [`Project`] - a sub-scope owned by exactly one workspace
//! - [`Membership`] - links users to a workspace or project with a role
//! - [`StoredMembership`] - the role and raw capability column as persisted
//! - [`Grant`] - a validated membership: owner, or an explicit capability set

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capability::{CapabilityParseError, CapabilitySet};
use crate::types::{ContextRef, MembershipId, ProjectId, Role, UserId, WorkspaceId};

/// A workspace: the tenant boundary that owns projects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
	/// Unique identifier for this workspace.
	pub id: WorkspaceId,

	/// Display name of the workspace.
	pub name: String,

	/// URL-friendly identifier for the workspace.
	pub slug: String,

	/// When the workspace was created.
	pub created_at: DateTime<Utc>,

	/// When the workspace was last updated.
	pub updated_at: DateTime<Utc>,
}

impl Workspace {
	/// Creates a new workspace with the given name and slug.
	///
	/// Generates a new workspace ID and sets timestamps to now.
	pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
		let now = Utc::now();
		Self {
			id: WorkspaceId::generate(),
			name: name.into(),
			slug: slug.into(),
			created_at: now,
			updated_at: now,
		}
	}
}

/// A project within a workspace.
///
/// The owning workspace is fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
	pub id: ProjectId,
	pub workspace_id: WorkspaceId,
	pub name: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Project {
	pub fn new(workspace_id: WorkspaceId, name: impl Into<String>) -> Self {
		let now = Utc::now();
		Self {
			id: ProjectId::generate(),
			workspace_id,
			name: name.into(),
			created_at: now,
			updated_at: now,
		}
	}
}

/// The role and raw capability column of a membership, exactly as stored.
///
/// The capability column is kept undecoded so that malformed data reaches the
/// resolver, which degrades it to "no access" instead of failing the read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMembership {
	pub role: Role,
	pub capabilities: Option<String>,
}

impl StoredMembership {
	pub fn new(role: Role, capabilities: Option<String>) -> Self {
		Self { role, capabilities }
	}

	/// Validates the stored row into a [`Grant`].
	pub fn grant(&self) -> Result<Grant, CapabilityParseError> {
		Grant::from_stored(self.role, self.capabilities.as_deref())
	}
}

/// A validated membership grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
	/// Full capability set, independent of stored data.
	Owner,
	/// Any other role, carrying the explicit capabilities stored on the row.
	Scoped {
		role: Role,
		capabilities: CapabilitySet,
	},
}

impl Grant {
	/// Builds a grant from a stored role and capability column.
	///
	/// Owner rows never look at the column. A missing column on any other role
	/// is an empty set; a present but undecodable column is an error.
	pub fn from_stored(role: Role, raw: Option<&str>) -> Result<Self, CapabilityParseError> {
		if role.is_owner() {
			return Ok(Grant::Owner);
		}
		let capabilities = match raw {
			Some(raw) => CapabilitySet::parse_stored(raw)?,
			None => CapabilitySet::empty(),
		};
		Ok(Grant::Scoped { role, capabilities })
	}

	pub fn role(&self) -> Role {
		match self {
			Grant::Owner => Role::Owner,
			Grant::Scoped { role, .. } => *role,
		}
	}

	/// The effective capabilities of this grant.
	pub fn capabilities(&self) -> CapabilitySet {
		match self {
			Grant::Owner => CapabilitySet::full(),
			Grant::Scoped { capabilities, .. } => capabilities.clone(),
		}
	}
}

/// A user's membership in a workspace or project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
	/// Unique identifier for this membership record.
	pub id: MembershipId,

	/// The workspace or project this membership is for.
	pub context: ContextRef,

	/// The user who is a member.
	pub user_id: UserId,

	/// The user's role within the context.
	pub role: Role,

	/// Stored capability list (JSON array of tokens), undecoded.
	pub capabilities: Option<String>,

	/// When this membership was created.
	pub created_at: DateTime<Utc>,
}

impl Membership {
	/// Creates a new membership.
	///
	/// When `capabilities` is `None` the role's default set is written.
	pub fn new(
		context: ContextRef,
		user_id: UserId,
		role: Role,
		capabilities: Option<CapabilitySet>,
	) -> Self {
		let capabilities = capabilities.unwrap_or_else(|| CapabilitySet::defaults_for(role));
		Self {
			id: MembershipId::generate(),
			context,
			user_id,
			role,
			capabilities: Some(capabilities.to_stored()),
			created_at: Utc::now(),
		}
	}

	pub fn stored(&self) -> StoredMembership {
		StoredMembership::new(self.role, self.capabilities.clone())
	}
}
