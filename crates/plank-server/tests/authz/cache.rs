// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use plank_server::commands;
use plank_server_auth::{Capability, CapabilityCache, CapabilityResolver, ContextRef, Role};
use plank_server_config::AuthzConfig;

use super::support::{caps, CountingLookup, TestApp};

#[tokio::test]
async fn cached_result_skips_the_store() {
	let app = TestApp::new().await;
	let a = &app.fixtures.a;
	let lookup = CountingLookup::new(app.app.memberships.clone());
	let resolver = CapabilityResolver::new(lookup.clone());
	let cache = CapabilityCache::new();
	let ctx: ContextRef = a.project.id.into();

	let first = cache.resolve(&resolver, &a.manager, ctx).await.unwrap();
	let second = cache.resolve(&resolver, &a.manager, ctx).await.unwrap();

	assert_eq!(first, second);
	assert_eq!(lookup.reads(), (1, 1));
}

#[tokio::test]
async fn workspace_change_invalidates_fallback_entry() {
	let app = TestApp::new().await;
	let a = &app.fixtures.a;
	let project: ContextRef = a.project.id.into();
	let workspace: ContextRef = a.workspace.id.into();

	let before = app
		.app
		.cache
		.resolve(&app.app.resolver, &a.viewer, project)
		.await
		.unwrap();
	assert_eq!(before, caps(&[Capability::View]));

	commands::update_member(
		&app.app,
		workspace,
		a.viewer,
		Some(Role::Member),
		Some(caps(&[Capability::View, Capability::Edit])),
	)
	.await
	.unwrap();

	let after = app
		.app
		.cache
		.resolve(&app.app.resolver, &a.viewer, project)
		.await
		.unwrap();
	assert_eq!(after, caps(&[Capability::View, Capability::Edit]));
}

#[tokio::test]
async fn new_workspace_membership_invalidates_empty_fallback_entry() {
	let app = TestApp::new().await;
	let a = &app.fixtures.a;
	let outsider = app.fixtures.outsider;
	let project: ContextRef = a.project.id.into();

	assert!(app
		.app
		.cache
		.resolve(&app.app.resolver, &outsider, project)
		.await
		.unwrap()
		.is_empty());

	commands::add_member(&app.app, a.workspace.id.into(), outsider, Role::Viewer, None)
		.await
		.unwrap();

	assert_eq!(
		app.app
			.cache
			.resolve(&app.app.resolver, &outsider, project)
			.await
			.unwrap(),
		caps(&[Capability::View])
	);
}

#[tokio::test]
async fn disabled_cache_always_reads_through() {
	let app = TestApp::with_authz(AuthzConfig {
		request_cache: false,
	})
	.await;
	let a = &app.fixtures.a;
	assert!(!app.app.cache.is_enabled());

	app.app
		.cache
		.resolve(&app.app.resolver, &a.owner, a.workspace.id.into())
		.await
		.unwrap();
	assert!(app.app.cache.is_empty().await);
}
