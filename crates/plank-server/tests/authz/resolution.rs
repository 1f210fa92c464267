// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use plank_server_auth::{Capability, CapabilityResolver, CapabilitySet, ContextRef, UserId};
use proptest::prelude::*;

use super::support::{caps, TestApp};

#[tokio::test]
async fn workspace_owner_gets_full_set() {
	let app = TestApp::new().await;
	let a = &app.fixtures.a;

	let resolved = app.resolve(&a.owner, a.workspace.id.into()).await;
	assert_eq!(resolved, CapabilitySet::full());
	assert_eq!(resolved.len(), 6);
}

#[tokio::test]
async fn owner_full_set_ignores_stored_column() {
	let app = TestApp::new().await;
	let a = &app.fixtures.a;
	let user_id = UserId::generate();
	app.insert_raw_membership(a.workspace.id.into(), &user_id, "owner", Some("garbage"))
		.await;

	assert_eq!(
		app.resolve(&user_id, a.workspace.id.into()).await,
		CapabilitySet::full()
	);
}

#[tokio::test]
async fn project_owner_gets_full_set_despite_stored_list() {
	let app = TestApp::new().await;
	let a = &app.fixtures.a;

	assert_eq!(
		app.resolve(&a.project_owner, a.project.id.into()).await,
		CapabilitySet::full()
	);
}

#[tokio::test]
async fn non_owner_gets_exactly_stored_list() {
	let app = TestApp::new().await;
	let a = &app.fixtures.a;

	assert_eq!(
		app.resolve(&a.manager, a.workspace.id.into()).await,
		caps(&[Capability::View, Capability::Create, Capability::Edit])
	);
	assert_eq!(
		app.resolve(&a.viewer, a.workspace.id.into()).await,
		caps(&[Capability::View])
	);
}

#[tokio::test]
async fn no_membership_is_empty_not_error() {
	let app = TestApp::new().await;
	let a = &app.fixtures.a;

	let result = app
		.app
		.resolver
		.resolve(&app.fixtures.outsider, a.workspace.id.into())
		.await;
	assert!(result.unwrap().is_empty());
}

#[tokio::test]
async fn membership_elsewhere_does_not_leak() {
	let app = TestApp::new().await;
	let (a, b) = (&app.fixtures.a, &app.fixtures.b);

	assert!(app.resolve(&b.owner, a.workspace.id.into()).await.is_empty());
	assert!(app.resolve(&b.owner, a.project.id.into()).await.is_empty());
}

#[tokio::test]
async fn malformed_stored_list_resolves_to_empty() {
	let app = TestApp::new().await;
	let a = &app.fixtures.a;

	for (i, raw) in ["not json", r#"{"view": true}"#, r#"["view", "admin"]"#, r#"[1, 2]"#]
		.into_iter()
		.enumerate()
	{
		let user_id = UserId::generate();
		app.insert_raw_membership(a.workspace.id.into(), &user_id, "member", Some(raw))
			.await;
		assert!(
			app.resolve(&user_id, a.workspace.id.into()).await.is_empty(),
			"case {i}: {raw}"
		);
	}
}

#[tokio::test]
async fn missing_stored_list_resolves_to_empty() {
	let app = TestApp::new().await;
	let a = &app.fixtures.a;
	let user_id = UserId::generate();
	app.insert_raw_membership(a.workspace.id.into(), &user_id, "manager", None)
		.await;

	assert!(app.resolve(&user_id, a.workspace.id.into()).await.is_empty());
}

#[tokio::test]
async fn repeated_resolution_is_identical() {
	let app = TestApp::new().await;
	let a = &app.fixtures.a;

	for (user, ctx) in [
		(a.manager, ContextRef::from(a.workspace.id)),
		(a.viewer, ContextRef::from(a.project.id)),
		(a.project_member, ContextRef::from(a.project.id)),
		(app.fixtures.outsider, ContextRef::from(a.project.id)),
	] {
		let first = app.resolve(&user, ctx).await;
		let second = app.resolve(&user, ctx).await;
		assert_eq!(first, second);
	}
}

#[tokio::test]
async fn concurrent_resolution_agrees() {
	let app = TestApp::new().await;
	let resolver = Arc::new(CapabilityResolver::new(app.app.memberships.clone()));
	let user = app.fixtures.a.manager;
	let ctx: ContextRef = app.fixtures.a.project.id.into();

	let handles: Vec<_> = (0..8)
		.map(|_| {
			let resolver = Arc::clone(&resolver);
			tokio::spawn(async move { resolver.resolve(&user, ctx).await.unwrap() })
		})
		.collect();

	for handle in handles {
		assert_eq!(
			handle.await.unwrap(),
			caps(&[Capability::View, Capability::Create, Capability::Edit])
		);
	}
}

#[tokio::test]
async fn closed_store_is_an_error_not_a_denial() {
	let app = TestApp::new().await;
	let a = &app.fixtures.a;
	app.app.pool.close().await;

	let result = app.app.resolver.resolve(&a.owner, a.workspace.id.into()).await;
	assert!(result.is_err());
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(16))]

	#[test]
	fn stored_list_resolves_exactly(
		selected in proptest::sample::subsequence(Capability::all().to_vec(), 0..=Capability::all().len())
	) {
		let runtime = tokio::runtime::Runtime::new().unwrap();
		let (resolved, expected) = runtime.block_on(async {
			let app = TestApp::new().await;
			let a = &app.fixtures.a;
			let user_id = UserId::generate();
			let expected: CapabilitySet = selected.iter().copied().collect();
			app.app
				.memberships
				.add_member(&a.project.id.into(), &user_id, plank_server_auth::Role::Member, Some(expected.clone()))
				.await
				.unwrap();
			(app.resolve(&user_id, a.project.id.into()).await, expected)
		});
		prop_assert_eq!(resolved, expected);
	}
}
