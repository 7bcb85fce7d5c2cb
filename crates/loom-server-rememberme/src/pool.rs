// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{
	SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};

use crate::error::RememberMeDbError;

/// Validation and rotation are short writes; wait this long on a locked
/// database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const MAX_CONNECTIONS: u32 = 8;

/// Open the remember-me database in WAL mode, creating the file if needed.
///
/// # Errors
/// Returns `RememberMeDbError::Internal` for an unparsable URL and
/// `RememberMeDbError::Sqlx` when the database cannot be opened.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, RememberMeDbError> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| RememberMeDbError::Internal(format!("Invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.busy_timeout(BUSY_TIMEOUT)
		.create_if_missing(true);

	let pool = SqlitePoolOptions::new()
		.max_connections(MAX_CONNECTIONS)
		.connect_with(options)
		.await?;

	tracing::debug!(max_connections = MAX_CONNECTIONS, "remember-me database pool created");
	Ok(pool)
}

/// Create the remember-me tables if they do not exist yet.
#[tracing::instrument(skip(pool))]
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), RememberMeDbError> {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS remember_me_triplets (
			identity TEXT NOT NULL,
			session_tag_hash TEXT NOT NULL,
			token_hash TEXT NOT NULL,
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL,
			expires_at TEXT NOT NULL,
			PRIMARY KEY (identity, session_tag_hash)
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE INDEX IF NOT EXISTS idx_remember_me_triplets_expires_at
		ON remember_me_triplets (expires_at)
		"#,
	)
	.execute(pool)
	.await?;

	tracing::debug!("remember-me schema ready");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn creates_file_database() {
		let dir = tempfile::tempdir().unwrap();
		let url = format!("sqlite:{}", dir.path().join("rememberme.db").display());

		let pool = create_pool(&url).await.unwrap();
		ensure_schema(&pool).await.unwrap();
		// Idempotent.
		ensure_schema(&pool).await.unwrap();

		assert!(dir.path().join("rememberme.db").exists());
	}
}
