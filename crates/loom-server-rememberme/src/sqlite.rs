// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite-backed triplet store.
//!
//! Tokens and session tags are stored as SHA-256 hashes, never in plaintext.
//! A row is keyed by `(identity, session_tag_hash)`; rotating a lineage
//! replaces its `token_hash` in place.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use loom_rememberme_core::{StoreError, TripletLookup, TripletStore};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::RememberMeDbError;
use crate::lineage::{hash_material, LineageInfo};

/// Repository for remember-me triplets.
#[derive(Clone)]
pub struct SqliteTripletStore {
	pool: SqlitePool,
}

impl SqliteTripletStore {
	/// Create a store over `pool`. The schema must already exist
	/// (see [`crate::ensure_schema`]).
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	#[tracing::instrument(skip_all, fields(identity = %identity))]
	pub async fn find(
		&self,
		identity: &str,
		token: &str,
		session_tag: &str,
	) -> Result<TripletLookup, RememberMeDbError> {
		let row = sqlx::query(
			r#"
			SELECT token_hash, expires_at
			FROM remember_me_triplets
			WHERE identity = ? AND session_tag_hash = ?
			"#,
		)
		.bind(identity)
		.bind(hash_material(session_tag))
		.fetch_optional(&self.pool)
		.await?;

		let Some(row) = row else {
			return Ok(TripletLookup::NotFound);
		};

		let token_hash: String = row.get("token_hash");
		let expires_at = parse_timestamp(row.get("expires_at"), "expires_at")?;

		let lookup = if expires_at <= Utc::now() {
			TripletLookup::NotFound
		} else if token_hash == hash_material(token) {
			TripletLookup::Found
		} else {
			TripletLookup::Invalid
		};
		tracing::debug!(%lookup, "triplet lookup");
		Ok(lookup)
	}

	/// Insert a lineage or rotate the token of an existing one.
	#[tracing::instrument(skip_all, fields(identity = %identity))]
	pub async fn store(
		&self,
		identity: &str,
		token: &str,
		session_tag: &str,
		expires_at: DateTime<Utc>,
	) -> Result<(), RememberMeDbError> {
		let now = to_db_timestamp(Utc::now());

		sqlx::query(
			r#"
			INSERT INTO remember_me_triplets (
				identity, session_tag_hash, token_hash, created_at, updated_at, expires_at
			) VALUES (?, ?, ?, ?, ?, ?)
			ON CONFLICT (identity, session_tag_hash) DO UPDATE SET
				token_hash = excluded.token_hash,
				updated_at = excluded.updated_at,
				expires_at = excluded.expires_at
			"#,
		)
		.bind(identity)
		.bind(hash_material(session_tag))
		.bind(hash_material(token))
		.bind(&now)
		.bind(&now)
		.bind(to_db_timestamp(expires_at))
		.execute(&self.pool)
		.await?;

		tracing::debug!("triplet stored");
		Ok(())
	}

	/// Remove one lineage. Returns whether a row was deleted.
	#[tracing::instrument(skip_all, fields(identity = %identity))]
	pub async fn clean(
		&self,
		identity: &str,
		session_tag: &str,
	) -> Result<bool, RememberMeDbError> {
		let result = sqlx::query(
			r#"
			DELETE FROM remember_me_triplets
			WHERE identity = ? AND session_tag_hash = ?
			"#,
		)
		.bind(identity)
		.bind(hash_material(session_tag))
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}

	/// Remove every lineage of `identity`. Returns the number of rows deleted.
	#[tracing::instrument(skip_all, fields(identity = %identity))]
	pub async fn clean_all(&self, identity: &str) -> Result<u64, RememberMeDbError> {
		let result = sqlx::query(
			r#"
			DELETE FROM remember_me_triplets
			WHERE identity = ?
			"#,
		)
		.bind(identity)
		.execute(&self.pool)
		.await?;

		let removed = result.rows_affected();
		tracing::debug!(removed, "all lineages removed for identity");
		Ok(removed)
	}

	/// Delete lineages that expired at or before `now`.
	#[tracing::instrument(skip(self))]
	pub async fn clean_expired_triplets(
		&self,
		now: DateTime<Utc>,
	) -> Result<u64, RememberMeDbError> {
		let result = sqlx::query(
			r#"
			DELETE FROM remember_me_triplets
			WHERE expires_at <= ?
			"#,
		)
		.bind(to_db_timestamp(now))
		.execute(&self.pool)
		.await?;

		let removed = result.rows_affected();
		tracing::debug!(removed, "expired lineages removed");
		Ok(removed)
	}

	/// Live lineages of `identity`, oldest first.
	#[tracing::instrument(skip_all, fields(identity = %identity))]
	pub async fn list_lineages(
		&self,
		identity: &str,
	) -> Result<Vec<LineageInfo>, RememberMeDbError> {
		let rows = sqlx::query(
			r#"
			SELECT identity, session_tag_hash, created_at, updated_at, expires_at
			FROM remember_me_triplets
			WHERE identity = ? AND expires_at > ?
			ORDER BY created_at ASC
			"#,
		)
		.bind(identity)
		.bind(to_db_timestamp(Utc::now()))
		.fetch_all(&self.pool)
		.await?;

		let mut lineages = Vec::with_capacity(rows.len());
		for row in rows {
			lineages.push(LineageInfo {
				identity: row.get("identity"),
				session_tag_hash: row.get("session_tag_hash"),
				created_at: parse_timestamp(row.get("created_at"), "created_at")?,
				updated_at: parse_timestamp(row.get("updated_at"), "updated_at")?,
				expires_at: parse_timestamp(row.get("expires_at"), "expires_at")?,
			});
		}
		Ok(lineages)
	}
}

#[async_trait]
impl TripletStore for SqliteTripletStore {
	async fn find_triplet(
		&self,
		identity: &str,
		token: &str,
		session_tag: &str,
	) -> Result<TripletLookup, StoreError> {
		Ok(self.find(identity, token, session_tag).await?)
	}

	async fn store_triplet(
		&self,
		identity: &str,
		token: &str,
		session_tag: &str,
		expires_at: DateTime<Utc>,
	) -> Result<(), StoreError> {
		Ok(self.store(identity, token, session_tag, expires_at).await?)
	}

	async fn clean_triplet(&self, identity: &str, session_tag: &str) -> Result<(), StoreError> {
		self.clean(identity, session_tag).await?;
		Ok(())
	}

	async fn clean_all_triplets(&self, identity: &str) -> Result<(), StoreError> {
		self.clean_all(identity).await?;
		Ok(())
	}
}

// Fixed width so that string comparison in SQL orders by time.
fn to_db_timestamp(at: DateTime<Utc>) -> String {
	at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: String, column: &str) -> Result<DateTime<Utc>, RememberMeDbError> {
	DateTime::parse_from_rfc3339(&value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| RememberMeDbError::InvalidData(format!("Invalid {column}: {e}")))
}
