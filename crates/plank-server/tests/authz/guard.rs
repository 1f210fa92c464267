// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use http::StatusCode;
use plank_server_auth::{authorize, AuthorizeError, Capability, ProjectId};

use super::support::{run_authz_cases, AuthzCase, TestApp};

#[tokio::test]
async fn test_capability_authorization() {
	let app = TestApp::new().await;
	let a = &app.fixtures.a;
	let b = &app.fixtures.b;

	let cases = vec![
		AuthzCase {
			name: "owner_can_manage_workspace_settings",
			user: a.owner,
			context: a.workspace.id.into(),
			required: Capability::ManageSettings,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "manager_can_edit_workspace",
			user: a.manager,
			context: a.workspace.id.into(),
			required: Capability::Edit,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "manager_with_explicit_list_cannot_delete",
			user: a.manager,
			context: a.workspace.id.into(),
			required: Capability::Delete,
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "viewer_cannot_create",
			user: a.viewer,
			context: a.workspace.id.into(),
			required: Capability::Create,
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "manager_can_edit_project_through_workspace",
			user: a.manager,
			context: a.project.id.into(),
			required: Capability::Edit,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "project_member_can_view_project",
			user: a.project_member,
			context: a.project.id.into(),
			required: Capability::View,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "project_member_cannot_view_workspace",
			user: a.project_member,
			context: a.workspace.id.into(),
			required: Capability::View,
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "project_owner_can_delete_project",
			user: a.project_owner,
			context: a.project.id.into(),
			required: Capability::Delete,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "other_workspace_owner_cannot_view",
			user: b.owner,
			context: a.project.id.into(),
			required: Capability::View,
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "outsider_cannot_view",
			user: app.fixtures.outsider,
			context: b.workspace.id.into(),
			required: Capability::View,
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "missing_project_is_forbidden",
			user: a.owner,
			context: ProjectId::generate().into(),
			required: Capability::View,
			expected_status: StatusCode::FORBIDDEN,
		},
	];

	run_authz_cases(&app.app.resolver, &cases).await;
}

#[tokio::test]
async fn store_failure_maps_to_internal_error() {
	let app = TestApp::new().await;
	let a = &app.fixtures.a;
	app.app.pool.close().await;

	let err = authorize(
		&app.app.resolver,
		&a.owner,
		a.workspace.id.into(),
		Capability::View,
	)
	.await
	.unwrap_err();

	assert!(matches!(err, AuthorizeError::Resolve(_)));
	assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}
