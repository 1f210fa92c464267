// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Plank operator CLI.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use plank_server::commands::{self, parse_capability_list};
use plank_server::{logging, version, App};
use plank_server_auth::{AuthorizeError, Capability, ContextRef, ContextType, Role, UserId};
use serde::Serialize;
use uuid::Uuid;

/// Plank server - capability resolution for workspaces and projects.
#[derive(Parser, Debug)]
#[command(name = "plank-server", about = "Plank capability resolution", version)]
struct Args {
	/// Config file to load instead of /etc/plank/server.toml
	#[arg(long, global = true, env = "PLANK_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version and build information
	Version,
	/// Create or update the database schema
	Migrate,
	/// Print the capabilities a user holds in a workspace or project
	Resolve(TargetArgs),
	/// Exit 0 if the user holds a capability, 1 otherwise
	Check {
		#[command(flatten)]
		target: TargetArgs,
		#[arg(long)]
		capability: Capability,
	},
	/// Manage memberships
	Member {
		#[command(subcommand)]
		action: MemberCommand,
	},
	/// Manage workspaces
	Workspace {
		#[command(subcommand)]
		action: WorkspaceCommand,
	},
	/// Manage projects
	Project {
		#[command(subcommand)]
		action: ProjectCommand,
	},
}

#[derive(ClapArgs, Debug)]
struct TargetArgs {
	#[arg(long)]
	user: Uuid,
	#[arg(long)]
	context: Uuid,
	#[arg(long, default_value = "workspace")]
	context_type: ContextType,
}

impl TargetArgs {
	fn user_id(&self) -> UserId {
		UserId::new(self.user)
	}

	fn context_ref(&self) -> ContextRef {
		ContextRef::from_parts(self.context, self.context_type)
	}
}

#[derive(Subcommand, Debug)]
enum MemberCommand {
	/// Add a membership; omitting --capabilities stores the role defaults
	Add {
		#[command(flatten)]
		target: TargetArgs,
		#[arg(long)]
		role: Role,
		/// Comma separated tokens, e.g. `view,edit`
		#[arg(long)]
		capabilities: Option<String>,
	},
	/// Change role and/or capability list
	Update {
		#[command(flatten)]
		target: TargetArgs,
		#[arg(long)]
		role: Option<Role>,
		#[arg(long)]
		capabilities: Option<String>,
	},
	/// Remove a membership
	Remove {
		#[command(flatten)]
		target: TargetArgs,
	},
}

#[derive(Subcommand, Debug)]
enum WorkspaceCommand {
	Create {
		#[arg(long)]
		name: String,
		#[arg(long)]
		slug: String,
	},
}

#[derive(Subcommand, Debug)]
enum ProjectCommand {
	Create {
		#[arg(long)]
		workspace: Uuid,
		#[arg(long)]
		name: String,
	},
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
	let args = Args::parse();

	if let Command::Version = args.command {
		println!("{}", version::format_version_info());
		return Ok(ExitCode::SUCCESS);
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => plank_server_config::load_config_with_file(path),
		None => plank_server_config::load_config(),
	}
	.context("failed to load configuration")?;

	logging::init_tracing(&config.logging);

	let app = App::connect(&config)
		.await
		.with_context(|| format!("failed to open database {}", config.database.url))?;

	match args.command {
		// Printed before configuration is loaded.
		Command::Version => {}
		Command::Migrate => {
			tracing::info!(database = %config.database.url, "schema is up to date");
		}
		Command::Resolve(target) => {
			let output = commands::resolve(&app, target.user_id(), target.context_ref()).await?;
			print_json(&output)?;
		}
		Command::Check { target, capability } => {
			match commands::check(&app, target.user_id(), target.context_ref(), capability).await {
				Ok(_) => println!("allowed"),
				Err(AuthorizeError::Denied(e)) => {
					println!("forbidden ({}): {e}", e.status_code().as_u16());
					return Ok(ExitCode::FAILURE);
				}
				Err(e @ AuthorizeError::Resolve(_)) => {
					return Err(anyhow::Error::new(e).context(format!(
						"capability check failed ({})",
						http::StatusCode::INTERNAL_SERVER_ERROR.as_u16()
					)));
				}
			}
		}
		Command::Member { action } => match action {
			MemberCommand::Add {
				target,
				role,
				capabilities,
			} => {
				let capabilities = capabilities.as_deref().map(parse_capability_list).transpose()?;
				let membership = commands::add_member(
					&app,
					target.context_ref(),
					target.user_id(),
					role,
					capabilities,
				)
				.await?;
				print_json(&membership)?;
			}
			MemberCommand::Update {
				target,
				role,
				capabilities,
			} => {
				let capabilities = capabilities.as_deref().map(parse_capability_list).transpose()?;
				let membership = commands::update_member(
					&app,
					target.context_ref(),
					target.user_id(),
					role,
					capabilities,
				)
				.await?;
				print_json(&membership)?;
			}
			MemberCommand::Remove { target } => {
				let removed =
					commands::remove_member(&app, target.context_ref(), target.user_id()).await?;
				if !removed {
					println!("no membership found");
					return Ok(ExitCode::FAILURE);
				}
				println!("removed");
			}
		},
		Command::Workspace { action } => match action {
			WorkspaceCommand::Create { name, slug } => {
				let workspace = commands::create_workspace(&app, &name, &slug).await?;
				print_json(&workspace)?;
			}
		},
		Command::Project { action } => match action {
			ProjectCommand::Create { workspace, name } => {
				let project = commands::create_project(&app, workspace.into(), &name).await?;
				print_json(&project)?;
			}
		},
	}

	Ok(ExitCode::SUCCESS)
}
