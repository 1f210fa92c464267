// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization configuration.

use serde::Deserialize;

/// Authorization configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthzConfig {
	/// Memoize resolved capability sets for the lifetime of one request or
	/// command. Entries are never shared across requests.
	pub request_cache: bool,
}

impl Default for AuthzConfig {
	fn default() -> Self {
		Self {
			request_cache: true,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthzConfigLayer {
	#[serde(default)]
	pub request_cache: Option<bool>,
}

impl AuthzConfigLayer {
	pub fn merge(&mut self, other: AuthzConfigLayer) {
		if other.request_cache.is_some() {
			self.request_cache = other.request_cache;
		}
	}

	pub fn finalize(self) -> AuthzConfig {
		AuthzConfig {
			request_cache: self.request_cache.unwrap_or(true),
		}
	}
}
