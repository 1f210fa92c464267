// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions for capability resolution.
//!
//! This module defines the foundational types used throughout the authz system:
//!
//! - **ID newtypes**: Type-safe wrappers around UUIDs for different entity types
//!   ([`UserId`], [`WorkspaceId`], [`ProjectId`], [`MembershipId`]) preventing
//!   accidental mixing of a project id where a workspace id is expected
//! - **Roles**: The closed set of membership roles ([`Role`])
//! - **Contexts**: The scope a capability is evaluated over ([`ContextType`],
//!   [`ContextRef`])
//!
//! All ID types implement transparent serde serialization (as UUID strings) and
//! provide conversion to/from [`uuid::Uuid`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(UserId, "Unique identifier for a user.");
define_id_type!(WorkspaceId, "Unique identifier for a workspace (the tenant boundary).");
define_id_type!(ProjectId, "Unique identifier for a project.");
define_id_type!(MembershipId, "Unique identifier for a membership record.");

// =============================================================================
// Roles
// =============================================================================

/// Roles a membership can carry.
///
/// `Owner` is authoritative: it always resolves to the full capability set,
/// whatever is stored alongside it. Every other role is only as strong as the
/// capability list stored on the membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	Owner,
	Manager,
	Member,
	Viewer,
}

impl Role {
	/// Returns all available roles.
	pub fn all() -> &'static [Role] {
		&[Role::Owner, Role::Manager, Role::Member, Role::Viewer]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Role::Owner => "owner",
			Role::Manager => "manager",
			Role::Member => "member",
			Role::Viewer => "viewer",
		}
	}

	/// Returns true for the role whose capabilities are fixed at compile time.
	pub fn is_owner(&self) -> bool {
		matches!(self, Role::Owner)
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned when parsing an unknown role string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
	type Err = RoleParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"owner" => Ok(Role::Owner),
			"manager" => Ok(Role::Manager),
			"member" => Ok(Role::Member),
			"viewer" => Ok(Role::Viewer),
			other => Err(RoleParseError(other.to_string())),
		}
	}
}

// =============================================================================
// Contexts
// =============================================================================

/// The kind of scope a membership (or a resolution) applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
	#[default]
	Workspace,
	Project,
}

impl ContextType {
	pub fn as_str(&self) -> &'static str {
		match self {
			ContextType::Workspace => "workspace",
			ContextType::Project => "project",
		}
	}
}

impl fmt::Display for ContextType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned when parsing an unknown context type string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown context type: {0}")]
pub struct ContextTypeParseError(pub String);

impl FromStr for ContextType {
	type Err = ContextTypeParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"workspace" => Ok(ContextType::Workspace),
			"project" => Ok(ContextType::Project),
			other => Err(ContextTypeParseError(other.to_string())),
		}
	}
}

/// A typed reference to a workspace or a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ContextRef {
	Workspace(WorkspaceId),
	Project(ProjectId),
}

impl ContextRef {
	/// Builds a context from an untyped id and its context type.
	pub fn from_parts(id: Uuid, context_type: ContextType) -> Self {
		match context_type {
			ContextType::Workspace => ContextRef::Workspace(WorkspaceId::new(id)),
			ContextType::Project => ContextRef::Project(ProjectId::new(id)),
		}
	}

	pub fn context_type(&self) -> ContextType {
		match self {
			ContextRef::Workspace(_) => ContextType::Workspace,
			ContextRef::Project(_) => ContextType::Project,
		}
	}

	pub fn id(&self) -> Uuid {
		match self {
			ContextRef::Workspace(id) => id.into_inner(),
			ContextRef::Project(id) => id.into_inner(),
		}
	}
}

impl From<WorkspaceId> for ContextRef {
	fn from(id: WorkspaceId) -> Self {
		ContextRef::Workspace(id)
	}
}

impl From<ProjectId> for ContextRef {
	fn from(id: ProjectId) -> Self {
		ContextRef::Project(id)
	}
}

impl fmt::Display for ContextRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.context_type(), self.id())
	}
}
