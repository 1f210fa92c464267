// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use plank_server_auth::{
	Capability, CapabilityResolver, CapabilitySet, ContextRef, ProjectId, ResolutionPath, Role,
	UserId, WorkspaceId,
};

use super::support::{caps, CountingLookup, TestApp};

#[tokio::test]
async fn project_falls_back_to_workspace_manager() {
	let app = TestApp::new().await;
	let a = &app.fixtures.a;

	let resolution = app
		.app
		.resolver
		.resolution(&a.manager, a.project.id.into())
		.await
		.unwrap();
	assert_eq!(
		resolution.capabilities,
		caps(&[Capability::View, Capability::Create, Capability::Edit])
	);
	assert_eq!(
		resolution.path,
		ResolutionPath::WorkspaceFallback(a.workspace.id)
	);
	assert_eq!(resolution.role, Some(Role::Manager));
}

#[tokio::test]
async fn project_falls_back_to_workspace_owner() {
	let app = TestApp::new().await;
	let a = &app.fixtures.a;

	assert_eq!(
		app.resolve(&a.owner, a.project.id.into()).await,
		CapabilitySet::full()
	);
}

#[tokio::test]
async fn direct_project_membership_wins() {
	let app = TestApp::new().await;
	let a = &app.fixtures.a;
	app.app
		.memberships
		.add_member(&a.project.id.into(), &a.manager, Role::Viewer, None)
		.await
		.unwrap();

	let resolution = app
		.app
		.resolver
		.resolution(&a.manager, a.project.id.into())
		.await
		.unwrap();
	assert_eq!(resolution.capabilities, caps(&[Capability::View]));
	assert_eq!(resolution.path, ResolutionPath::Direct);
}

#[tokio::test]
async fn malformed_project_row_does_not_fall_back() {
	let app = TestApp::new().await;
	let a = &app.fixtures.a;
	app.insert_raw_membership(a.project.id.into(), &a.owner, "member", Some("[oops"))
		.await;

	assert!(app.resolve(&a.owner, a.project.id.into()).await.is_empty());
}

#[tokio::test]
async fn project_member_has_nothing_at_workspace() {
	let app = TestApp::new().await;
	let a = &app.fixtures.a;

	assert_eq!(
		app.resolve(&a.project_member, a.project.id.into()).await,
		caps(&[Capability::View])
	);
	assert!(app
		.resolve(&a.project_member, a.workspace.id.into())
		.await
		.is_empty());
}

#[tokio::test]
async fn missing_project_resolves_to_empty() {
	let app = TestApp::new().await;
	let a = &app.fixtures.a;

	let resolution = app
		.app
		.resolver
		.resolution(&a.owner, ProjectId::generate().into())
		.await
		.unwrap();
	assert!(resolution.capabilities.is_empty());
	assert_eq!(resolution.path, ResolutionPath::ProjectMissing);
}

#[tokio::test]
async fn missing_workspace_resolves_to_empty() {
	let app = TestApp::new().await;
	assert!(app
		.resolve(&app.fixtures.a.owner, WorkspaceId::generate().into())
		.await
		.is_empty());
}

#[tokio::test]
async fn deleted_workspace_takes_its_projects_with_it() {
	let app = TestApp::new().await;
	let a = &app.fixtures.a;
	assert!(app
		.app
		.workspaces
		.delete_workspace(&a.workspace.id)
		.await
		.unwrap());

	assert!(app.resolve(&a.owner, a.project.id.into()).await.is_empty());
	assert!(app
		.resolve(&a.project_member, a.project.id.into())
		.await
		.is_empty());
}

mod read_budget {
	use super::*;

	async fn counting(app: &TestApp) -> (CapabilityResolver<CountingLookup>, CountingLookup) {
		let lookup = CountingLookup::new(app.app.memberships.clone());
		(CapabilityResolver::new(lookup.clone()), lookup)
	}

	#[tokio::test]
	async fn workspace_context_reads_once() {
		let app = TestApp::new().await;
		let (resolver, lookup) = counting(&app).await;

		resolver
			.resolve(&app.fixtures.outsider, app.fixtures.a.workspace.id.into())
			.await
			.unwrap();
		assert_eq!(lookup.reads(), (1, 0));
	}

	#[tokio::test]
	async fn direct_project_hit_reads_once() {
		let app = TestApp::new().await;
		let (resolver, lookup) = counting(&app).await;
		let a = &app.fixtures.a;

		resolver
			.resolve(&a.project_member, a.project.id.into())
			.await
			.unwrap();
		assert_eq!(lookup.reads(), (1, 0));
	}

	#[tokio::test]
	async fn fallback_reads_twice_at_most() {
		let app = TestApp::new().await;
		let (resolver, lookup) = counting(&app).await;
		let a = &app.fixtures.a;

		for user in [a.manager, app.fixtures.outsider, UserId::generate()] {
			let ctx: ContextRef = a.project.id.into();
			resolver.resolve(&user, ctx).await.unwrap();
		}
		resolver
			.resolve(&a.manager, ProjectId::generate().into())
			.await
			.unwrap();

		assert_eq!(lookup.reads(), (4, 4));
	}
}
