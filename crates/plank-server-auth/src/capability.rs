// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Capability tokens and capability sets.
//!
//! A [`Capability`] is one permitted action drawn from a closed set. A
//! [`CapabilitySet`] is the ordered set the resolver hands back to callers;
//! tokens carry no hierarchy, so checks are plain set membership.
//!
//! Memberships persist their capability list as a JSON array of tokens
//! (`["view","edit"]`). [`CapabilitySet::parse_stored`] is strict: a single
//! unknown token rejects the whole list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::types::Role;

/// A permitted action within a workspace or project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
	View,
	Create,
	Edit,
	Delete,
	ManageMembers,
	ManageSettings,
}

impl Capability {
	/// Returns every capability, in resolution order.
	pub fn all() -> &'static [Capability] {
		&[
			Capability::View,
			Capability::Create,
			Capability::Edit,
			Capability::Delete,
			Capability::ManageMembers,
			Capability::ManageSettings,
		]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Capability::View => "view",
			Capability::Create => "create",
			Capability::Edit => "edit",
			Capability::Delete => "delete",
			Capability::ManageMembers => "manage_members",
			Capability::ManageSettings => "manage_settings",
		}
	}
}

impl fmt::Display for Capability {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Capability {
	type Err = CapabilityParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Capability::all()
			.iter()
			.copied()
			.find(|c| c.as_str() == s)
			.ok_or_else(|| CapabilityParseError::UnknownToken(s.to_string()))
	}
}

/// Errors from decoding capability data.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityParseError {
	#[error("unknown capability: {0}")]
	UnknownToken(String),

	#[error("malformed capability list: {0}")]
	Malformed(#[from] serde_json::Error),
}

/// An ordered set of capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
	/// The empty set: no access.
	pub fn empty() -> Self {
		Self(BTreeSet::new())
	}

	/// Every capability. This is what an owner always resolves to.
	pub fn full() -> Self {
		Capability::all().iter().copied().collect()
	}

	/// Capabilities written onto a new membership when the caller supplies no
	/// explicit list.
	pub fn defaults_for(role: Role) -> Self {
		use Capability::*;
		match role {
			Role::Owner => Self::full(),
			Role::Manager => [View, Create, Edit, Delete, ManageMembers].into_iter().collect(),
			Role::Member => [View, Create, Edit].into_iter().collect(),
			Role::Viewer => [View].into_iter().collect(),
		}
	}

	/// Decodes a stored capability list.
	///
	/// The list must be a JSON array of known tokens. Anything else is an
	/// error; partial lists are never returned.
	pub fn parse_stored(raw: &str) -> Result<Self, CapabilityParseError> {
		let tokens: Vec<String> = serde_json::from_str(raw)?;
		tokens
			.iter()
			.map(|t| t.parse::<Capability>())
			.collect::<Result<_, _>>()
	}

	/// Encodes the set in the stored JSON array form.
	pub fn to_stored(&self) -> String {
		let tokens: Vec<&str> = self.0.iter().map(Capability::as_str).collect();
		// A Vec<&str> always serializes.
		serde_json::to_string(&tokens).unwrap_or_else(|_| "[]".to_string())
	}

	pub fn contains(&self, capability: Capability) -> bool {
		self.0.contains(&capability)
	}

	pub fn insert(&mut self, capability: Capability) -> bool {
		self.0.insert(capability)
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
		self.0.iter().copied()
	}
}

impl FromIterator<Capability> for CapabilitySet {
	fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl IntoIterator for CapabilitySet {
	type Item = Capability;
	type IntoIter = std::collections::btree_set::IntoIter<Capability>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

impl fmt::Display for CapabilitySet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut first = true;
		for capability in &self.0 {
			if !first {
				f.write_str(",")?;
			}
			first = false;
			write!(f, "{capability}")?;
		}
		Ok(())
	}
}
