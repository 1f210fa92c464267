// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Plank server: wires configuration, persistence and capability resolution
//! together for the operator CLI.

pub mod app;
pub mod commands;
pub mod logging;
pub mod version;

pub use app::App;
pub use commands::{CommandError, ResolveOutput};
pub use plank_server_config::ServerConfig;
