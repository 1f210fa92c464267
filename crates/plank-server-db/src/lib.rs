// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! # plank-server-db
//!
//! Persistence for workspaces, projects and memberships using SQLite via sqlx.
//!
//! ## Repository Pattern
//!
//! Each table has a `*Repository` struct holding a `SqlitePool` with inherent
//! async methods, and a `*Store` trait that forwards to them:
//!
//! ```rust,ignore
//! let pool = create_pool("sqlite:./plank.db").await?;
//! run_migrations(&pool).await?;
//!
//! let memberships = MembershipRepository::new(pool.clone());
//! let resolver = CapabilityResolver::new(memberships);
//! ```
//!
//! [`MembershipRepository`] also implements
//! [`plank_server_auth::MembershipLookup`], so it plugs straight into the
//! resolver. Each lookup is a single query.
//!
//! ## Error Handling
//!
//! | Variant | When |
//! |---------|------|
//! | `NotFound` | A workspace, project or membership the caller named does not exist |
//! | `Conflict` | Duplicate slug or duplicate membership |
//! | `Internal` | Unparseable stored data (UUID, timestamp, role) |
//! | `Sqlx` | Everything else, propagated via `?` |

pub mod error;
pub mod membership;
pub mod pool;
pub mod project;
pub mod schema;
pub mod testing;
pub mod workspace;

pub use error::{DbError, Result};
pub use membership::{MembershipRepository, MembershipStore};
pub use pool::create_pool;
pub use project::{ProjectRepository, ProjectStore};
pub use schema::run_migrations;
pub use workspace::{WorkspaceRepository, WorkspaceStore};
