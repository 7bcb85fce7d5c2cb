// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `loom-rememberme`: operate remember-me lineages from the command line.
//!
//! The credential file stands in for the client's cookie jar, so
//! `issue` followed by repeated `validate` calls exercises token rotation
//! exactly as a browser would.

mod commands;
mod config;
mod file_carrier;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use loom_server_rememberme::{create_pool, ensure_schema, SqliteTripletStore};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use config::{load_config, CliOverrides};

/// Loom remember-me - persistent login maintenance.
#[derive(Parser, Debug)]
#[command(
	name = "loom-rememberme",
	about = "Issue, validate and revoke Loom remember-me logins",
	version
)]
struct Args {
	/// TOML configuration file
	#[arg(long, global = true, env = "LOOM_REMEMBERME_CONFIG")]
	config: Option<PathBuf>,

	/// SQLite database URL
	#[arg(long, global = true, env = "LOOM_REMEMBERME_DATABASE_URL")]
	database: Option<String>,

	/// JSON file holding the client-side credential
	#[arg(long, global = true, env = "LOOM_REMEMBERME_CREDENTIAL_FILE")]
	credential_file: Option<PathBuf>,

	/// Name of the credential inside the carrier
	#[arg(long, global = true)]
	credential_name: Option<String>,

	/// Credential lifetime in seconds
	#[arg(long, global = true)]
	expiry_secs: Option<i64>,

	/// Purge every lineage of an identity when a replayed token is seen
	#[arg(long, global = true)]
	clean_on_invalid: Option<bool>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Start a new lineage and write its credential
	Issue(IdentityArgs),
	/// Log in from the stored credential, rotating its token
	Validate(IdentityArgs),
	/// End the lineage of the stored credential and drop it
	Revoke(IdentityArgs),
	/// List live lineages of an identity
	Sessions {
		identity: String,
	},
	/// Delete expired lineages
	Sweep,
}

#[derive(clap::Args, Debug)]
struct IdentityArgs {
	identity: String,

	/// Client fingerprint mixed into stored values
	#[arg(long)]
	salt: Option<String>,
}

impl From<&Args> for CliOverrides {
	fn from(args: &Args) -> Self {
		Self {
			database_url: args.database.clone(),
			credential_file: args.credential_file.clone(),
			credential_name: args.credential_name.clone(),
			expiry_secs: args.expiry_secs,
			clean_on_invalid: args.clean_on_invalid,
		}
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
		)
		.with_writer(std::io::stderr)
		.init();

	let args = Args::parse();
	let config = load_config(args.config.as_deref(), CliOverrides::from(&args))
		.context("loading configuration")?;

	tracing::debug!(
		database = %config.database_url,
		credential_file = %config.credential_file.display(),
		credential_name = %config.rememberme.credential_name,
		"configuration loaded"
	);

	let pool = create_pool(&config.database_url)
		.await
		.with_context(|| format!("opening database {}", config.database_url))?;
	ensure_schema(&pool).await.context("preparing database schema")?;
	let store = SqliteTripletStore::new(pool);

	match &args.command {
		Command::Issue(a) => {
			print_json(&commands::issue(&store, &config, &a.identity, a.salt.as_deref()).await?)
		}
		Command::Validate(a) => {
			print_json(&commands::validate(&store, &config, &a.identity, a.salt.as_deref()).await?)
		}
		Command::Revoke(a) => {
			print_json(&commands::revoke(&store, &config, &a.identity, a.salt.as_deref()).await?)
		}
		Command::Sessions { identity } => print_json(&commands::sessions(&store, identity).await?),
		Command::Sweep => print_json(&commands::sweep(&store).await?),
	}
}

fn print_json<T: Serialize>(report: &T) -> anyhow::Result<()> {
	println!("{}", serde_json::to_string_pretty(report)?);
	Ok(())
}
