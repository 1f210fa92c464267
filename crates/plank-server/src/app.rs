// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared handles for one process: repositories, resolver and cache.

use plank_server_auth::{CapabilityCache, CapabilityResolver};
use plank_server_config::{AuthzConfig, ServerConfig};
use plank_server_db::{
	create_pool, run_migrations, DbError, MembershipRepository, ProjectRepository,
	WorkspaceRepository,
};
use sqlx::sqlite::SqlitePool;

pub struct App {
	pub pool: SqlitePool,
	pub workspaces: WorkspaceRepository,
	pub projects: ProjectRepository,
	pub memberships: MembershipRepository,
	pub resolver: CapabilityResolver<MembershipRepository>,
	/// Lives as long as this `App`, which is one CLI invocation.
	pub cache: CapabilityCache,
}

impl App {
	/// Build on an existing pool. The schema must already exist.
	pub fn new(pool: SqlitePool, authz: &AuthzConfig) -> Self {
		let memberships = MembershipRepository::new(pool.clone());
		let cache = if authz.request_cache {
			CapabilityCache::new()
		} else {
			CapabilityCache::disabled()
		};

		Self {
			workspaces: WorkspaceRepository::new(pool.clone()),
			projects: ProjectRepository::new(pool.clone()),
			resolver: CapabilityResolver::new(memberships.clone()),
			memberships,
			cache,
			pool,
		}
	}

	/// Open the configured database and make sure the schema is current.
	#[tracing::instrument(skip_all, fields(database = %config.database.url))]
	pub async fn connect(config: &ServerConfig) -> Result<Self, DbError> {
		let pool = create_pool(&config.database.url).await?;
		run_migrations(&pool).await?;
		Ok(Self::new(pool, &config.authz))
	}
}
