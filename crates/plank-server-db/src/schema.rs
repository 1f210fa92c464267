// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Schema creation for workspaces, projects and memberships.
//!
//! Memberships are polymorphic over `(context_type, context_id)`, so they carry
//! no foreign key; the uniqueness constraint is what guarantees at most one
//! membership per user per context.

use sqlx::sqlite::SqlitePool;

use crate::error::DbError;

const STATEMENTS: &[&str] = &[
	r#"
	CREATE TABLE IF NOT EXISTS workspaces (
		id TEXT PRIMARY KEY NOT NULL,
		name TEXT NOT NULL,
		slug TEXT UNIQUE NOT NULL,
		created_at TEXT NOT NULL,
		updated_at TEXT NOT NULL
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS projects (
		id TEXT PRIMARY KEY NOT NULL,
		workspace_id TEXT NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
		name TEXT NOT NULL,
		created_at TEXT NOT NULL,
		updated_at TEXT NOT NULL
	)
	"#,
	"CREATE INDEX IF NOT EXISTS idx_projects_workspace ON projects(workspace_id)",
	r#"
	CREATE TABLE IF NOT EXISTS memberships (
		id TEXT PRIMARY KEY NOT NULL,
		context_type TEXT NOT NULL CHECK (context_type IN ('workspace', 'project')),
		context_id TEXT NOT NULL,
		user_id TEXT NOT NULL,
		role TEXT NOT NULL CHECK (role IN ('owner', 'manager', 'member', 'viewer')),
		capabilities TEXT,
		created_at TEXT NOT NULL,
		UNIQUE (context_type, context_id, user_id)
	)
	"#,
	"CREATE INDEX IF NOT EXISTS idx_memberships_user ON memberships(user_id)",
];

/// Create all tables and indexes. Safe to run repeatedly.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	for statement in STATEMENTS {
		sqlx::query(statement).execute(pool).await?;
	}
	tracing::info!(statements = STATEMENTS.len(), "database schema ready");
	Ok(())
}
