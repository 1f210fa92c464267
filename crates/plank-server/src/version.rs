// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Build information for plank-server.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Set by the release pipeline; absent in local builds.
pub const GIT_SHA: Option<&str> = option_env!("PLANK_GIT_SHA");

/// Format version info for display.
pub fn format_version_info() -> String {
	format!(
		"plank-server version: {}\n\
		 Git SHA:              {}\n\
		 Platform:             {}-{}",
		VERSION,
		GIT_SHA.unwrap_or("unknown"),
		std::env::consts::OS,
		std::env::consts::ARCH,
	)
}
