// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Engine configuration.
//!
//! [`RememberMeConfig`] is the resolved runtime configuration.
//! [`RememberMeConfigLayer`] is a partial view used to merge defaults, a TOML
//! file, environment variables and command line overrides, in that order.

use chrono::Duration;
use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;

/// Default name of the credential (the cookie name for HTTP carriers).
pub const DEFAULT_CREDENTIAL_NAME: &str = "REMEMBERME";

/// Default credential lifetime: one year.
pub const DEFAULT_EXPIRY_SECS: i64 = 31_556_926;

/// Longest lifetime accepted. Browsers cap cookie lifetimes at 400 days.
pub const MAX_EXPIRY_SECS: i64 = 400 * 24 * 60 * 60;

pub const CREDENTIAL_NAME_ENV_VAR: &str = "LOOM_REMEMBERME_CREDENTIAL_NAME";
pub const EXPIRY_SECS_ENV_VAR: &str = "LOOM_REMEMBERME_EXPIRY_SECS";
pub const CLEAN_ON_INVALID_ENV_VAR: &str = "LOOM_REMEMBERME_CLEAN_ON_INVALID";

/// Remember-me configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RememberMeConfig {
	/// Name under which the carrier stores the credential.
	pub credential_name: String,
	/// How long an issued or rotated credential stays valid on the client.
	pub expiry: Duration,
	/// Purge every lineage of an identity when a replayed token is seen.
	pub clean_on_invalid: bool,
}

impl Default for RememberMeConfig {
	fn default() -> Self {
		Self {
			credential_name: DEFAULT_CREDENTIAL_NAME.to_string(),
			expiry: Duration::seconds(DEFAULT_EXPIRY_SECS),
			clean_on_invalid: false,
		}
	}
}

impl RememberMeConfig {
	pub fn new() -> Self {
		Self::default()
	}

	/// Resolve defaults overlaid with environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		let mut layer = RememberMeConfigLayer::default();
		layer.merge(RememberMeConfigLayer::from_env()?);
		layer.finalize()
	}

	/// Set the credential name.
	pub fn with_credential_name(mut self, name: impl Into<String>) -> Self {
		self.credential_name = name.into();
		self
	}

	/// Set the credential lifetime.
	pub fn with_expiry(mut self, expiry: Duration) -> Self {
		self.expiry = expiry;
		self
	}

	/// Set the theft-response policy.
	pub fn with_clean_on_invalid(mut self, enabled: bool) -> Self {
		self.clean_on_invalid = enabled;
		self
	}

	/// Check that the values can drive the engine.
	pub fn validate(&self) -> Result<(), ConfigError> {
		validate_credential_name(&self.credential_name)?;
		validate_expiry_secs(self.expiry.num_seconds())
	}
}

/// Remember-me configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RememberMeConfigLayer {
	#[serde(default)]
	pub credential_name: Option<String>,
	#[serde(default)]
	pub expiry_secs: Option<i64>,
	#[serde(default)]
	pub clean_on_invalid: Option<bool>,
}

impl RememberMeConfigLayer {
	/// Read the layer from process environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Read the layer through an arbitrary variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let credential_name = lookup(CREDENTIAL_NAME_ENV_VAR).filter(|v| !v.is_empty());

		let expiry_secs = match lookup(EXPIRY_SECS_ENV_VAR).filter(|v| !v.is_empty()) {
			Some(raw) => Some(raw.trim().parse::<i64>().map_err(|e| {
				ConfigError::Env(format!("{EXPIRY_SECS_ENV_VAR}={raw:?}: {e}"))
			})?),
			None => None,
		};

		let clean_on_invalid = match lookup(CLEAN_ON_INVALID_ENV_VAR).filter(|v| !v.is_empty()) {
			Some(raw) => Some(parse_bool(&raw).ok_or_else(|| {
				ConfigError::Env(format!(
					"{CLEAN_ON_INVALID_ENV_VAR}={raw:?}: expected true/false"
				))
			})?),
			None => None,
		};

		debug!(
			credential_name = credential_name.is_some(),
			expiry_secs = expiry_secs.is_some(),
			clean_on_invalid = clean_on_invalid.is_some(),
			"loaded remember-me config from environment"
		);

		Ok(Self {
			credential_name,
			expiry_secs,
			clean_on_invalid,
		})
	}

	pub fn merge(&mut self, other: RememberMeConfigLayer) {
		if other.credential_name.is_some() {
			self.credential_name = other.credential_name;
		}
		if other.expiry_secs.is_some() {
			self.expiry_secs = other.expiry_secs;
		}
		if other.clean_on_invalid.is_some() {
			self.clean_on_invalid = other.clean_on_invalid;
		}
	}

	pub fn finalize(self) -> Result<RememberMeConfig, ConfigError> {
		let expiry_secs = self.expiry_secs.unwrap_or(DEFAULT_EXPIRY_SECS);
		validate_expiry_secs(expiry_secs)?;

		let config = RememberMeConfig {
			credential_name: self
				.credential_name
				.unwrap_or_else(|| DEFAULT_CREDENTIAL_NAME.to_string()),
			expiry: Duration::seconds(expiry_secs),
			clean_on_invalid: self.clean_on_invalid.unwrap_or(false),
		};
		config.validate()?;
		Ok(config)
	}
}

fn parse_bool(raw: &str) -> Option<bool> {
	match raw.trim().to_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" => Some(false),
		_ => None,
	}
}

pub(crate) fn validate_expiry_secs(secs: i64) -> Result<(), ConfigError> {
	if secs <= 0 {
		return Err(ConfigError::invalid_value(
			"expiry_secs",
			"must be greater than zero",
		));
	}
	if secs > MAX_EXPIRY_SECS {
		return Err(ConfigError::invalid_value(
			"expiry_secs",
			format!("must not exceed {MAX_EXPIRY_SECS}"),
		));
	}
	Ok(())
}

/// Credential names must be usable as an RFC 6265 cookie name.
fn validate_credential_name(name: &str) -> Result<(), ConfigError> {
	if name.is_empty() {
		return Err(ConfigError::invalid_value(
			"credential_name",
			"must not be empty",
		));
	}
	if let Some(c) = name
		.chars()
		.find(|c| !c.is_ascii_graphic() || "()<>@,;:\\\"/[]?={}".contains(*c))
	{
		return Err(ConfigError::invalid_value(
			"credential_name",
			format!("contains invalid character {c:?}"),
		));
	}
	Ok(())
}
