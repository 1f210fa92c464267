// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Operations behind each CLI subcommand.
//!
//! Every function takes an [`App`] and returns a serializable result so the
//! binary only has to print it. Membership writes invalidate the matching
//! cache entries before returning.

use http::StatusCode;
use plank_server_auth::{
	authorize_cached, AuthorizeError, Capability, CapabilityParseError, CapabilitySet,
	ContextRef, Membership, Project, ResolveError, Role, UserId, Workspace, WorkspaceId,
};
use plank_server_db::DbError;
use serde::Serialize;

use crate::app::App;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
	#[error(transparent)]
	Db(#[from] DbError),

	#[error(transparent)]
	Resolve(#[from] ResolveError),

	#[error("Invalid capability list: {0}")]
	Capabilities(#[from] CapabilityParseError),
}

impl CommandError {
	pub fn status_code(&self) -> StatusCode {
		match self {
			CommandError::Db(DbError::NotFound(_)) => StatusCode::NOT_FOUND,
			CommandError::Db(DbError::Conflict(_)) => StatusCode::CONFLICT,
			CommandError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
			CommandError::Resolve(e) => e.status_code(),
			CommandError::Capabilities(_) => StatusCode::BAD_REQUEST,
		}
	}
}

/// Result of `resolve`.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveOutput {
	pub user_id: UserId,
	pub context: ContextRef,
	pub capabilities: CapabilitySet,
	pub path: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub role: Option<Role>,
}

/// Parses a comma separated list such as `view,edit`. Empty input is the
/// empty set; any unknown token rejects the whole list.
pub fn parse_capability_list(raw: &str) -> Result<CapabilitySet, CapabilityParseError> {
	raw
		.split(',')
		.map(str::trim)
		.filter(|t| !t.is_empty())
		.map(str::parse::<Capability>)
		.collect()
}

pub async fn resolve(
	app: &App,
	user_id: UserId,
	context: ContextRef,
) -> Result<ResolveOutput, CommandError> {
	let resolution = app.resolver.resolution(&user_id, context).await?;
	Ok(ResolveOutput {
		user_id,
		context,
		capabilities: resolution.capabilities,
		path: resolution.path.as_str(),
		role: resolution.role,
	})
}

/// Resolves through the cache and demands `required`.
pub async fn check(
	app: &App,
	user_id: UserId,
	context: ContextRef,
	required: Capability,
) -> Result<CapabilitySet, AuthorizeError> {
	authorize_cached(&app.cache, &app.resolver, &user_id, context, required).await
}

pub async fn create_workspace(app: &App, name: &str, slug: &str) -> Result<Workspace, CommandError> {
	let workspace = Workspace::new(name, slug);
	app.workspaces.create_workspace(&workspace).await?;
	Ok(workspace)
}

pub async fn create_project(
	app: &App,
	workspace_id: WorkspaceId,
	name: &str,
) -> Result<Project, CommandError> {
	let project = Project::new(workspace_id, name);
	app.projects.create_project(&project).await?;
	Ok(project)
}

pub async fn add_member(
	app: &App,
	context: ContextRef,
	user_id: UserId,
	role: Role,
	capabilities: Option<CapabilitySet>,
) -> Result<Membership, CommandError> {
	let membership = app
		.memberships
		.add_member(&context, &user_id, role, capabilities)
		.await?;
	app.cache.invalidate(&user_id, &context).await;
	Ok(membership)
}

pub async fn update_member(
	app: &App,
	context: ContextRef,
	user_id: UserId,
	role: Option<Role>,
	capabilities: Option<CapabilitySet>,
) -> Result<Membership, CommandError> {
	let membership = app
		.memberships
		.update_member(&context, &user_id, role, capabilities)
		.await?;
	app.cache.invalidate(&user_id, &context).await;
	Ok(membership)
}

/// Returns whether a membership existed.
pub async fn remove_member(
	app: &App,
	context: ContextRef,
	user_id: UserId,
) -> Result<bool, CommandError> {
	let removed = app.memberships.remove_member(&context, &user_id).await?;
	app.cache.invalidate(&user_id, &context).await;
	Ok(removed)
}
