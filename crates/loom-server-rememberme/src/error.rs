// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the remember-me stores.

use loom_rememberme_core::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum RememberMeDbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Invalid data: {0}")]
	InvalidData(String),

	#[error("Internal: {0}")]
	Internal(String),
}

impl From<RememberMeDbError> for StoreError {
	fn from(err: RememberMeDbError) -> Self {
		match err {
			RememberMeDbError::Sqlx(sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed) => {
				StoreError::Unavailable(err.to_string())
			}
			other => StoreError::backend(other),
		}
	}
}

pub type Result<T> = std::result::Result<T, RememberMeDbError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pool_exhaustion_maps_to_unavailable() {
		let err: StoreError = RememberMeDbError::Sqlx(sqlx::Error::PoolTimedOut).into();
		assert!(matches!(err, StoreError::Unavailable(_)));
	}

	#[test]
	fn other_errors_map_to_backend() {
		let err: StoreError = RememberMeDbError::InvalidData("bad timestamp".into()).into();
		assert!(matches!(err, StoreError::Backend(_)));
		assert_eq!(
			err.to_string(),
			"triplet store backend error: Invalid data: bad timestamp"
		);
	}
}
