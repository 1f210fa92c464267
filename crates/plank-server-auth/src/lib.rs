// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Capability resolution for Plank.
//!
//! Given a user and a workspace or project, this crate computes the set of
//! actions the user may perform there:
//!
//! - [`CapabilityResolver`] - direct membership lookup with a single
//!   project → workspace fallback step
//! - [`MembershipLookup`] - the read seam implemented by the data layer
//! - [`CapabilityCache`] - explicit request-scoped memoization
//! - [`require_capability`] / [`authorize`] - handler-side checks with HTTP
//!   status mapping

pub mod cache;
pub mod capability;
pub mod guard;
pub mod membership;
pub mod resolver;
pub mod types;


pub use cache::CapabilityCache;
pub use capability::{Capability, CapabilityParseError, CapabilitySet};
pub use guard::{authorize, authorize_cached, require_capability, AccessDenied, AuthorizeError};
pub use membership::{Grant, Membership, Project, StoredMembership, Workspace};
pub use resolver::{
	CapabilityResolver, FallbackLookup, MembershipLookup, Resolution, ResolutionPath, ResolveError,
	StoreError,
};
pub use types::{
	ContextRef, ContextType, ContextTypeParseError, MembershipId, ProjectId, Role, RoleParseError,
	UserId, WorkspaceId,
};
