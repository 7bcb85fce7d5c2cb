// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the remember-me engine.
//!
//! Negative login outcomes (no credential, malformed credential, unknown or
//! replayed triplet) are never errors. Only collaborator faults and caller
//! mistakes surface here.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by a [`TripletStore`](crate::TripletStore) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
	/// The backing storage failed.
	#[error("triplet store backend error: {0}")]
	Backend(#[source] BoxError),

	/// The store cannot serve requests right now.
	#[error("triplet store unavailable: {0}")]
	Unavailable(String),
}

impl StoreError {
	/// Wrap any backend error.
	pub fn backend(err: impl Into<BoxError>) -> Self {
		Self::Backend(err.into())
	}
}

/// Errors raised by a [`CredentialCarrier`](crate::CredentialCarrier) implementation.
#[derive(Debug, Error)]
pub enum CarrierError {
	/// The value cannot be carried by this transport.
	#[error("invalid credential value for {name}: {message}")]
	InvalidValue { name: String, message: String },

	/// The underlying transport failed.
	#[error("credential carrier backend error: {0}")]
	Backend(#[source] BoxError),
}

impl CarrierError {
	/// Create an invalid value error.
	pub fn invalid_value(name: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			name: name.into(),
			message: message.into(),
		}
	}

	/// Wrap any backend error.
	pub fn backend(err: impl Into<BoxError>) -> Self {
		Self::Backend(err.into())
	}
}

/// Errors returned by [`RememberMe`](crate::RememberMe) operations.
#[derive(Debug, Error)]
pub enum RememberMeError {
	/// Store failure, passed through untouched.
	#[error(transparent)]
	Store(#[from] StoreError),

	/// Carrier failure, passed through untouched.
	#[error(transparent)]
	Carrier(#[from] CarrierError),

	/// The identity cannot be encoded into a credential.
	#[error("invalid identity: {0}")]
	InvalidIdentity(String),

	/// The engine configuration cannot produce a usable credential expiry.
	#[error(transparent)]
	Config(#[from] ConfigError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Invalid value
	#[error("Invalid value for {field}: {message}")]
	InvalidValue { field: String, message: String },

	/// Environment variable error
	#[error("Environment error: {0}")]
	Env(String),
}

impl ConfigError {
	/// Create an invalid value error
	pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			field: field.into(),
			message: message.into(),
		}
	}
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, RememberMeError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn store_error_is_transparent() {
		let err: RememberMeError = StoreError::Unavailable("pool closed".to_string()).into();
		assert_eq!(err.to_string(), "triplet store unavailable: pool closed");
		assert!(matches!(err, RememberMeError::Store(_)));
	}

	#[test]
	fn carrier_error_is_transparent() {
		let err: RememberMeError = CarrierError::invalid_value("REMEMBERME", "contains ';'").into();
		assert_eq!(
			err.to_string(),
			"invalid credential value for REMEMBERME: contains ';'"
		);
	}

	#[test]
	fn backend_keeps_source() {
		let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
		let err = StoreError::backend(io);
		let source = std::error::Error::source(&err).expect("source should be kept");
		assert_eq!(source.to_string(), "disk gone");
	}
}
