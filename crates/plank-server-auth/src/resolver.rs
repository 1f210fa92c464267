// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Capability resolution engine.
//!
//! This module contains [`CapabilityResolver`], which answers "what may this
//! user do in this workspace or project?". Resolution is a bounded two-step
//! lookup:
//!
//! 1. **Direct membership**: the row for (user, context). An owner row always
//!    yields the full set; any other role yields its stored capability list.
//! 2. **Workspace fallback** (projects only): with no project row, the owning
//!    workspace's row is used instead. Workspaces never fall back further.
//!
//! Every "no access" outcome (no row, missing project, undecodable capability
//! column) is an empty [`CapabilitySet`]. Only store failures are errors.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{field, instrument, Span};

use crate::capability::{Capability, CapabilitySet};
use crate::membership::StoredMembership;
use crate::types::{ContextRef, ProjectId, Role, UserId, WorkspaceId};

/// Failure of the backing membership store.
///
/// The resolver never masks these: a store that cannot answer is not the same
/// as a user without access.
#[derive(Debug, thiserror::Error)]
#[error("membership store unavailable: {source}")]
pub struct StoreError {
	#[source]
	source: Box<dyn std::error::Error + Send + Sync>,
}

impl StoreError {
	pub fn new(source: impl std::error::Error + Send + Sync + 'static) -> Self {
		Self {
			source: Box::new(source),
		}
	}

	pub fn msg(message: impl Into<String>) -> Self {
		let message: String = message.into();
		Self {
			source: message.into(),
		}
	}
}

/// Errors surfaced by [`CapabilityResolver`].
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
	#[error(transparent)]
	Store(#[from] StoreError),
}

/// Outcome of the fallback read for a project without a direct membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackLookup {
	/// The project record does not exist, so there is no workspace to use.
	ProjectMissing,
	/// The owning workspace, and the user's membership there if any.
	Workspace {
		workspace_id: WorkspaceId,
		membership: Option<StoredMembership>,
	},
}

/// Read access to memberships, as needed by the resolver.
#[async_trait]
pub trait MembershipLookup: Send + Sync {
	/// Returns the user's membership row in exactly this context.
	async fn find_membership(
		&self,
		user_id: &UserId,
		context: &ContextRef,
	) -> Result<Option<StoredMembership>, StoreError>;

	/// Returns the owning workspace of `project_id` together with the user's
	/// membership in it, in a single read.
	async fn find_fallback_membership(
		&self,
		user_id: &UserId,
		project_id: &ProjectId,
	) -> Result<FallbackLookup, StoreError>;
}

#[async_trait]
impl<T: MembershipLookup + ?Sized> MembershipLookup for Arc<T> {
	async fn find_membership(
		&self,
		user_id: &UserId,
		context: &ContextRef,
	) -> Result<Option<StoredMembership>, StoreError> {
		(**self).find_membership(user_id, context).await
	}

	async fn find_fallback_membership(
		&self,
		user_id: &UserId,
		project_id: &ProjectId,
	) -> Result<FallbackLookup, StoreError> {
		(**self).find_fallback_membership(user_id, project_id).await
	}
}

/// Which step of the lookup produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPath {
	/// A membership in the requested context.
	Direct,
	/// No project membership; the owning workspace's membership was used.
	WorkspaceFallback(WorkspaceId),
	/// No membership anywhere in the chain. Carries the workspace that was
	/// checked when a project context fell back.
	NoMembership(Option<WorkspaceId>),
	/// A project context whose project record could not be found.
	ProjectMissing,
}

impl ResolutionPath {
	pub fn as_str(&self) -> &'static str {
		match self {
			ResolutionPath::Direct => "direct",
			ResolutionPath::WorkspaceFallback(_) => "workspace_fallback",
			ResolutionPath::NoMembership(_) => "no_membership",
			ResolutionPath::ProjectMissing => "project_missing",
		}
	}

	/// The workspace consulted by the fallback step, if the fallback ran and
	/// found a project.
	pub fn fallback_workspace(&self) -> Option<WorkspaceId> {
		match self {
			ResolutionPath::WorkspaceFallback(id) => Some(*id),
			ResolutionPath::NoMembership(id) => *id,
			ResolutionPath::Direct | ResolutionPath::ProjectMissing => None,
		}
	}
}

/// A resolved capability set plus how it was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
	pub capabilities: CapabilitySet,
	pub path: ResolutionPath,
	/// Role on the membership that was used, if any.
	pub role: Option<Role>,
}

impl Resolution {
	fn none(path: ResolutionPath) -> Self {
		Self {
			capabilities: CapabilitySet::empty(),
			path,
			role: None,
		}
	}
}

/// Resolves effective capabilities from stored memberships.
///
/// Stateless apart from the store handle; clone or share it freely.
#[derive(Debug, Clone)]
pub struct CapabilityResolver<S> {
	store: S,
}

impl<S: MembershipLookup> CapabilityResolver<S> {
	pub fn new(store: S) -> Self {
		Self { store }
	}

	pub fn store(&self) -> &S {
		&self.store
	}

	/// Returns the capabilities `user_id` holds in `context`.
	///
	/// # Errors
	///
	/// Returns [`ResolveError::Store`] only when the store itself fails.
	pub async fn resolve(
		&self,
		user_id: &UserId,
		context: ContextRef,
	) -> Result<CapabilitySet, ResolveError> {
		Ok(self.resolution(user_id, context).await?.capabilities)
	}

	/// Like [`resolve`](Self::resolve) but reports which lookup step answered.
	#[instrument(
		level = "debug",
		skip_all,
		fields(
			user_id = %user_id,
			context = %context,
			path = field::Empty,
			capabilities = field::Empty,
		)
	)]
	pub async fn resolution(
		&self,
		user_id: &UserId,
		context: ContextRef,
	) -> Result<Resolution, ResolveError> {
		let resolution = self.lookup(user_id, context).await?;

		let span = Span::current();
		span.record("path", resolution.path.as_str());
		span.record("capabilities", field::display(&resolution.capabilities));
		tracing::debug!("capabilities resolved");

		Ok(resolution)
	}

	/// Returns true if `user_id` holds `capability` in `context`.
	pub async fn has_capability(
		&self,
		user_id: &UserId,
		context: ContextRef,
		capability: Capability,
	) -> Result<bool, ResolveError> {
		Ok(self.resolve(user_id, context).await?.contains(capability))
	}

	async fn lookup(&self, user_id: &UserId, context: ContextRef) -> Result<Resolution, ResolveError> {
		if let Some(stored) = self.store.find_membership(user_id, &context).await? {
			return Ok(evaluate(&stored, &context, ResolutionPath::Direct));
		}

		let project_id = match context {
			ContextRef::Workspace(_) => return Ok(Resolution::none(ResolutionPath::NoMembership(None))),
			ContextRef::Project(project_id) => project_id,
		};

		match self
			.store
			.find_fallback_membership(user_id, &project_id)
			.await?
		{
			FallbackLookup::ProjectMissing => {
				tracing::debug!(project_id = %project_id, "project not found, no workspace to fall back to");
				Ok(Resolution::none(ResolutionPath::ProjectMissing))
			}
			FallbackLookup::Workspace {
				workspace_id,
				membership: Some(stored),
			} => Ok(evaluate(
				&stored,
				&ContextRef::Workspace(workspace_id),
				ResolutionPath::WorkspaceFallback(workspace_id),
			)),
			FallbackLookup::Workspace {
				workspace_id,
				membership: None,
			} => Ok(Resolution::none(ResolutionPath::NoMembership(Some(
				workspace_id,
			)))),
		}
	}
}

fn evaluate(stored: &StoredMembership, context: &ContextRef, path: ResolutionPath) -> Resolution {
	match stored.grant() {
		Ok(grant) => Resolution {
			capabilities: grant.capabilities(),
			path,
			role: Some(grant.role()),
		},
		Err(e) => {
			tracing::warn!(
				context = %context,
				role = %stored.role,
				error = %e,
				"malformed stored capabilities, treating as no access"
			);
			Resolution {
				capabilities: CapabilitySet::empty(),
				path,
				role: Some(stored.role),
			}
		}
	}
}
