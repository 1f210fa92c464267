// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use http::StatusCode;
use plank_server::App;
use plank_server_auth::{
	authorize, Capability, CapabilityResolver, CapabilitySet, ContextRef, FallbackLookup,
	MembershipId, MembershipLookup, Project, ProjectId, Role, StoreError, StoredMembership,
	UserId, Workspace,
};
use plank_server_config::AuthzConfig;
use plank_server_db::{testing::create_test_pool, MembershipRepository};

pub fn caps(list: &[Capability]) -> CapabilitySet {
	list.iter().copied().collect()
}

pub struct WorkspaceFixture {
	pub workspace: Workspace,
	pub project: Project,
	pub owner: UserId,
	pub manager: UserId,
	pub viewer: UserId,
	/// Direct project member with `[view]`, no workspace membership.
	pub project_member: UserId,
	/// Project owner whose stored list is only `[view]`.
	pub project_owner: UserId,
}

pub struct Fixtures {
	pub a: WorkspaceFixture,
	pub b: WorkspaceFixture,
	pub outsider: UserId,
}

pub struct TestApp {
	pub app: App,
	pub fixtures: Fixtures,
}

impl TestApp {
	pub async fn new() -> Self {
		Self::with_authz(AuthzConfig::default()).await
	}

	pub async fn with_authz(authz: AuthzConfig) -> Self {
		let app = App::new(create_test_pool().await, &authz);
		let a = seed_workspace(&app, "Workspace A", "workspace-a").await;
		let b = seed_workspace(&app, "Workspace B", "workspace-b").await;
		Self {
			app,
			fixtures: Fixtures {
				a,
				b,
				outsider: UserId::generate(),
			},
		}
	}

	pub async fn resolve(&self, user_id: &UserId, context: ContextRef) -> CapabilitySet {
		self.app.resolver.resolve(user_id, context).await.unwrap()
	}

	/// Writes a membership row directly, bypassing validation.
	pub async fn insert_raw_membership(
		&self,
		context: ContextRef,
		user_id: &UserId,
		role: &str,
		capabilities: Option<&str>,
	) {
		sqlx::query(
			r#"
			INSERT INTO memberships (id, context_type, context_id, user_id, role, capabilities, created_at)
			VALUES (?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(MembershipId::generate().to_string())
		.bind(context.context_type().as_str())
		.bind(context.id().to_string())
		.bind(user_id.to_string())
		.bind(role)
		.bind(capabilities)
		.bind(Utc::now().to_rfc3339())
		.execute(&self.app.pool)
		.await
		.unwrap();
	}
}

async fn seed_workspace(app: &App, name: &str, slug: &str) -> WorkspaceFixture {
	let workspace = Workspace::new(name, slug);
	app.workspaces.create_workspace(&workspace).await.unwrap();
	let project = Project::new(workspace.id, format!("{name} Project"));
	app.projects.create_project(&project).await.unwrap();

	let fixture = WorkspaceFixture {
		owner: UserId::generate(),
		manager: UserId::generate(),
		viewer: UserId::generate(),
		project_member: UserId::generate(),
		project_owner: UserId::generate(),
		workspace,
		project,
	};

	let ws: ContextRef = fixture.workspace.id.into();
	let proj: ContextRef = fixture.project.id.into();
	let members = &app.memberships;
	members
		.add_member(&ws, &fixture.owner, Role::Owner, None)
		.await
		.unwrap();
	members
		.add_member(
			&ws,
			&fixture.manager,
			Role::Manager,
			Some(caps(&[Capability::View, Capability::Create, Capability::Edit])),
		)
		.await
		.unwrap();
	members
		.add_member(&ws, &fixture.viewer, Role::Viewer, None)
		.await
		.unwrap();
	members
		.add_member(
			&proj,
			&fixture.project_member,
			Role::Member,
			Some(caps(&[Capability::View])),
		)
		.await
		.unwrap();
	members
		.add_member(
			&proj,
			&fixture.project_owner,
			Role::Owner,
			Some(caps(&[Capability::View])),
		)
		.await
		.unwrap();

	fixture
}

/// Wraps the real repository and counts each kind of read.
#[derive(Clone)]
pub struct CountingLookup {
	inner: MembershipRepository,
	pub direct: Arc<AtomicUsize>,
	pub fallback: Arc<AtomicUsize>,
}

impl CountingLookup {
	pub fn new(inner: MembershipRepository) -> Self {
		Self {
			inner,
			direct: Arc::new(AtomicUsize::new(0)),
			fallback: Arc::new(AtomicUsize::new(0)),
		}
	}

	pub fn reads(&self) -> (usize, usize) {
		(
			self.direct.load(Ordering::SeqCst),
			self.fallback.load(Ordering::SeqCst),
		)
	}
}

#[async_trait]
impl MembershipLookup for CountingLookup {
	async fn find_membership(
		&self,
		user_id: &UserId,
		context: &ContextRef,
	) -> Result<Option<StoredMembership>, StoreError> {
		self.direct.fetch_add(1, Ordering::SeqCst);
		self.inner.find_membership(user_id, context).await
	}

	async fn find_fallback_membership(
		&self,
		user_id: &UserId,
		project_id: &ProjectId,
	) -> Result<FallbackLookup, StoreError> {
		self.fallback.fetch_add(1, Ordering::SeqCst);
		self.inner.find_fallback_membership(user_id, project_id).await
	}
}

pub struct AuthzCase {
	pub name: &'static str,
	pub user: UserId,
	pub context: ContextRef,
	pub required: Capability,
	pub expected_status: StatusCode,
}

pub async fn run_authz_cases<S: MembershipLookup>(
	resolver: &CapabilityResolver<S>,
	cases: &[AuthzCase],
) {
	for case in cases {
		let status = match authorize(resolver, &case.user, case.context, case.required).await {
			Ok(_) => StatusCode::OK,
			Err(e) => e.status_code(),
		};
		assert_eq!(
			status, case.expected_status,
			"case '{}' expected {} got {}",
			case.name, case.expected_status, status
		);
	}
}
