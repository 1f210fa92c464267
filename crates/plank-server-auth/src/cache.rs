// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request-scoped memoization of capability resolutions.
//!
//! A [`CapabilityCache`] lives for one request (or one session, at the
//! caller's choice) and is dropped with it. Entries are keyed by
//! `(user, context type, context id)` and are only removed through explicit
//! invalidation. Store errors are never cached.
//!
//! Invalidating a workspace membership also drops the same user's project
//! entries whose resolution consulted that workspace.

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::capability::CapabilitySet;
use crate::resolver::{CapabilityResolver, MembershipLookup, ResolutionPath, ResolveError};
use crate::types::{ContextRef, ContextType, UserId};

type CacheKey = (UserId, ContextType, Uuid);

#[derive(Debug, Clone)]
struct Entry {
	capabilities: CapabilitySet,
	path: ResolutionPath,
}

/// Per-request cache in front of a [`CapabilityResolver`].
#[derive(Debug)]
pub struct CapabilityCache {
	enabled: bool,
	entries: RwLock<HashMap<CacheKey, Entry>>,
}

impl Default for CapabilityCache {
	fn default() -> Self {
		Self::new()
	}
}

impl CapabilityCache {
	pub fn new() -> Self {
		Self {
			enabled: true,
			entries: RwLock::new(HashMap::new()),
		}
	}

	/// A cache that never stores anything; every call goes to the resolver.
	pub fn disabled() -> Self {
		Self {
			enabled: false,
			entries: RwLock::new(HashMap::new()),
		}
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	fn key(user_id: &UserId, context: &ContextRef) -> CacheKey {
		(*user_id, context.context_type(), context.id())
	}

	/// Returns the cached set, if present.
	pub async fn get(&self, user_id: &UserId, context: &ContextRef) -> Option<CapabilitySet> {
		self
			.entries
			.read()
			.await
			.get(&Self::key(user_id, context))
			.map(|e| e.capabilities.clone())
	}

	/// Returns the cached set or resolves and caches it.
	pub async fn resolve<S: MembershipLookup>(
		&self,
		resolver: &CapabilityResolver<S>,
		user_id: &UserId,
		context: ContextRef,
	) -> Result<CapabilitySet, ResolveError> {
		if !self.enabled {
			return resolver.resolve(user_id, context).await;
		}

		if let Some(hit) = self.get(user_id, &context).await {
			tracing::trace!(user_id = %user_id, context = %context, "capability cache hit");
			return Ok(hit);
		}

		let resolution = resolver.resolution(user_id, context).await?;
		self.entries.write().await.insert(
			Self::key(user_id, &context),
			Entry {
				capabilities: resolution.capabilities.clone(),
				path: resolution.path,
			},
		);
		Ok(resolution.capabilities)
	}

	/// Drops the entry for `(user_id, context)`.
	///
	/// For a workspace context this also drops the user's project entries whose
	/// fallback step consulted that workspace. Returns the number of entries removed.
	pub async fn invalidate(&self, user_id: &UserId, context: &ContextRef) -> usize {
		let mut entries = self.entries.write().await;
		let before = entries.len();
		entries.remove(&Self::key(user_id, context));
		if let ContextRef::Workspace(workspace_id) = context {
			entries.retain(|(uid, _, _), entry| {
				!(uid == user_id && entry.path.fallback_workspace() == Some(*workspace_id))
			});
		}
		before - entries.len()
	}

	/// Drops every entry for `user_id`. Returns the number of entries removed.
	pub async fn invalidate_user(&self, user_id: &UserId) -> usize {
		let mut entries = self.entries.write().await;
		let before = entries.len();
		entries.retain(|(uid, _, _), _| uid != user_id);
		before - entries.len()
	}

	pub async fn clear(&self) {
		self.entries.write().await.clear();
	}

	pub async fn len(&self) -> usize {
		self.entries.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.entries.read().await.is_empty()
	}
}
