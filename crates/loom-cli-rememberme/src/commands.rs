// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Command implementations. Each returns a serializable report that `main`
//! prints as JSON.

use anyhow::Context;
use chrono::{DateTime, Utc};
use loom_rememberme_core::{RememberMe, TripletStore};
use loom_server_rememberme::{LineageInfo, SqliteTripletStore};
use serde::Serialize;

use crate::config::CliConfig;
use crate::file_carrier::FileCarrier;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct IssueReport {
	pub identity: String,
	pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ValidateReport {
	pub identity: String,
	pub remembered: bool,
	pub was_invalid: bool,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RevokeReport {
	pub identity: String,
	pub had_credential: bool,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SessionsReport {
	pub identity: String,
	pub lineages: Vec<LineageInfo>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SweepReport {
	pub removed: u64,
}

fn engine<S: TripletStore>(
	store: S,
	config: &CliConfig,
) -> anyhow::Result<RememberMe<S, FileCarrier>> {
	let carrier = FileCarrier::open(&config.credential_file).with_context(|| {
		format!(
			"opening credential file {}",
			config.credential_file.display()
		)
	})?;
	Ok(RememberMe::with_config(
		store,
		carrier,
		config.rememberme.clone(),
	))
}

pub async fn issue(
	store: &SqliteTripletStore,
	config: &CliConfig,
	identity: &str,
	salt: Option<&str>,
) -> anyhow::Result<IssueReport> {
	let mut engine = engine(store.clone(), config)?;
	engine
		.issue(identity, salt)
		.await
		.context("issuing remember-me credential")?;

	let expires_at = engine
		.carrier()
		.expires_at(&config.rememberme.credential_name)
		.context("issued credential missing from credential file")?;

	Ok(IssueReport {
		identity: identity.to_string(),
		expires_at,
	})
}

pub async fn validate(
	store: &SqliteTripletStore,
	config: &CliConfig,
	identity: &str,
	salt: Option<&str>,
) -> anyhow::Result<ValidateReport> {
	let mut engine = engine(store.clone(), config)?;
	let remembered = engine
		.validate(identity, salt)
		.await
		.context("validating remember-me credential")?;

	if engine.was_invalid() {
		tracing::warn!(identity = %identity, "replayed remember-me token rejected");
	}

	Ok(ValidateReport {
		identity: identity.to_string(),
		remembered,
		was_invalid: engine.was_invalid(),
	})
}

pub async fn revoke(
	store: &SqliteTripletStore,
	config: &CliConfig,
	identity: &str,
	salt: Option<&str>,
) -> anyhow::Result<RevokeReport> {
	let mut engine = engine(store.clone(), config)?;
	let had_credential = engine
		.claimed_identity()
		.context("reading remember-me credential")?
		.is_some();
	engine
		.revoke(identity, salt)
		.await
		.context("revoking remember-me credential")?;

	Ok(RevokeReport {
		identity: identity.to_string(),
		had_credential,
	})
}

pub async fn sessions(
	store: &SqliteTripletStore,
	identity: &str,
) -> anyhow::Result<SessionsReport> {
	let lineages = store
		.list_lineages(identity)
		.await
		.context("listing remember-me lineages")?;
	Ok(SessionsReport {
		identity: identity.to_string(),
		lineages,
	})
}

pub async fn sweep(store: &SqliteTripletStore) -> anyhow::Result<SweepReport> {
	let removed = store
		.clean_expired_triplets(Utc::now())
		.await
		.context("removing expired remember-me lineages")?;
	Ok(SweepReport { removed })
}
