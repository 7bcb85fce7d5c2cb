// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered CLI configuration.
//!
//! Precedence, lowest first: built-in defaults, the TOML file given with
//! `--config`, `LOOM_REMEMBERME_*` environment variables, command line flags.
//!
//! ```toml
//! database_url = "sqlite:/var/lib/loom/rememberme.db"
//! credential_file = "/var/lib/loom/credentials.json"
//!
//! [rememberme]
//! credential_name = "REMEMBERME"
//! expiry_secs = 2592000
//! clean_on_invalid = true
//! ```

use std::path::{Path, PathBuf};

use loom_rememberme_core::{RememberMeConfig, RememberMeConfigLayer};
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:rememberme.db";
pub const DEFAULT_CREDENTIAL_FILE: &str = "rememberme-credentials.json";

#[derive(Debug, thiserror::Error)]
pub enum CliConfigError {
	#[error("I/O error reading {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("TOML parse error in {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error(transparent)]
	RememberMe(#[from] loom_rememberme_core::ConfigError),
}

/// Contents of the TOML configuration file.
#[derive(Debug, Default, Deserialize)]
pub struct FileLayer {
	#[serde(default)]
	pub database_url: Option<String>,
	#[serde(default)]
	pub credential_file: Option<PathBuf>,
	#[serde(default)]
	pub rememberme: RememberMeConfigLayer,
}

impl FileLayer {
	pub fn load(path: &Path) -> Result<Self, CliConfigError> {
		debug!(path = %path.display(), "loading config file");
		let content = std::fs::read_to_string(path).map_err(|source| CliConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		toml::from_str(&content).map_err(|source| CliConfigError::TomlParse {
			path: path.to_path_buf(),
			source,
		})
	}
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
	pub database_url: Option<String>,
	pub credential_file: Option<PathBuf>,
	pub credential_name: Option<String>,
	pub expiry_secs: Option<i64>,
	pub clean_on_invalid: Option<bool>,
}

/// Fully resolved CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
	pub database_url: String,
	pub credential_file: PathBuf,
	pub rememberme: RememberMeConfig,
}

pub fn load_config(
	config_file: Option<&Path>,
	overrides: CliOverrides,
) -> Result<CliConfig, CliConfigError> {
	load_config_with_lookup(config_file, overrides, |key| std::env::var(key).ok())
}

fn load_config_with_lookup<F>(
	config_file: Option<&Path>,
	overrides: CliOverrides,
	lookup: F,
) -> Result<CliConfig, CliConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	let file = match config_file {
		Some(path) => FileLayer::load(path)?,
		None => FileLayer::default(),
	};

	let mut layer = file.rememberme;
	layer.merge(RememberMeConfigLayer::from_lookup(lookup)?);
	layer.merge(RememberMeConfigLayer {
		credential_name: overrides.credential_name,
		expiry_secs: overrides.expiry_secs,
		clean_on_invalid: overrides.clean_on_invalid,
	});

	Ok(CliConfig {
		database_url: overrides
			.database_url
			.or(file.database_url)
			.unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
		credential_file: overrides
			.credential_file
			.or(file.credential_file)
			.unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIAL_FILE)),
		rememberme: layer.finalize()?,
	})
}
