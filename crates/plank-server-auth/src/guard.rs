// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Handler-level capability checks.
//!
//! Route handlers resolve a [`CapabilitySet`] and then demand one token:
//!
//! ```ignore
//! let caps = resolver.resolve(&user_id, ContextRef::Project(project_id)).await?;
//! require_capability(&caps, Capability::Edit)?;
//! ```
//!
//! A missing token maps to `403 Forbidden`; a store failure during resolution
//! maps to `500 Internal Server Error`. Denials never describe which
//! capabilities the caller does hold.

use http::StatusCode;

use crate::cache::CapabilityCache;
use crate::capability::{Capability, CapabilitySet};
use crate::resolver::{CapabilityResolver, MembershipLookup, ResolveError};
use crate::types::{ContextRef, UserId};

/// The caller lacks a required capability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Insufficient permissions")]
pub struct AccessDenied {
	pub required: Capability,
}

impl AccessDenied {
	pub fn status_code(&self) -> StatusCode {
		StatusCode::FORBIDDEN
	}
}

impl ResolveError {
	/// Store faults are internal errors, never authorization denials.
	pub fn status_code(&self) -> StatusCode {
		match self {
			ResolveError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

/// Failure of [`authorize`]: either denied or unable to decide.
#[derive(Debug, thiserror::Error)]
pub enum AuthorizeError {
	#[error(transparent)]
	Denied(#[from] AccessDenied),

	#[error(transparent)]
	Resolve(#[from] ResolveError),
}

impl AuthorizeError {
	pub fn status_code(&self) -> StatusCode {
		match self {
			AuthorizeError::Denied(e) => e.status_code(),
			AuthorizeError::Resolve(e) => e.status_code(),
		}
	}
}

/// Checks that `capabilities` contains `required`.
pub fn require_capability(
	capabilities: &CapabilitySet,
	required: Capability,
) -> Result<(), AccessDenied> {
	if capabilities.contains(required) {
		Ok(())
	} else {
		Err(AccessDenied { required })
	}
}

/// Resolves and checks in one step, logging denials.
pub async fn authorize<S: MembershipLookup>(
	resolver: &CapabilityResolver<S>,
	user_id: &UserId,
	context: ContextRef,
	required: Capability,
) -> Result<CapabilitySet, AuthorizeError> {
	let capabilities = resolver.resolve(user_id, context).await?;
	demand(capabilities, user_id, context, required)
}

/// Like [`authorize`], but reuses a request-scoped resolution from `cache`.
pub async fn authorize_cached<S: MembershipLookup>(
	cache: &CapabilityCache,
	resolver: &CapabilityResolver<S>,
	user_id: &UserId,
	context: ContextRef,
	required: Capability,
) -> Result<CapabilitySet, AuthorizeError> {
	let capabilities = cache.resolve(resolver, user_id, context).await?;
	demand(capabilities, user_id, context, required)
}

fn demand(
	capabilities: CapabilitySet,
	user_id: &UserId,
	context: ContextRef,
	required: Capability,
) -> Result<CapabilitySet, AuthorizeError> {
	if let Err(denied) = require_capability(&capabilities, required) {
		tracing::info!(
			user_id = %user_id,
			context = %context,
			required = %required,
			"capability check denied"
		);
		return Err(denied.into());
	}
	Ok(capabilities)
}
