// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Triplet store contract.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Result of looking up a presented triplet.
///
/// The store decides what counts as invalid. The reference stores answer
/// [`Invalid`](TripletLookup::Invalid) when `(identity, session_tag)` is known
/// but the token is not the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripletLookup {
	/// The triplet is the current one for its lineage.
	Found,
	/// No lineage matches `(identity, session_tag)`.
	NotFound,
	/// The lineage exists but the token is stale: a replay or theft signal.
	Invalid,
}

impl fmt::Display for TripletLookup {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TripletLookup::Found => write!(f, "found"),
			TripletLookup::NotFound => write!(f, "not_found"),
			TripletLookup::Invalid => write!(f, "invalid"),
		}
	}
}

/// Persistence for remember-me triplets, keyed by `(identity, session_tag)`.
///
/// Token and session tag arguments are the salted forms; stores treat them as
/// opaque strings.
#[async_trait]
pub trait TripletStore: Send + Sync {
	async fn find_triplet(
		&self,
		identity: &str,
		token: &str,
		session_tag: &str,
	) -> Result<TripletLookup, StoreError>;

	/// Insert or replace the current token of a lineage.
	async fn store_triplet(
		&self,
		identity: &str,
		token: &str,
		session_tag: &str,
		expires_at: DateTime<Utc>,
	) -> Result<(), StoreError>;

	/// Remove one lineage.
	async fn clean_triplet(&self, identity: &str, session_tag: &str) -> Result<(), StoreError>;

	/// Remove every lineage of an identity.
	async fn clean_all_triplets(&self, identity: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: TripletStore + ?Sized> TripletStore for Arc<T> {
	async fn find_triplet(
		&self,
		identity: &str,
		token: &str,
		session_tag: &str,
	) -> Result<TripletLookup, StoreError> {
		(**self).find_triplet(identity, token, session_tag).await
	}

	async fn store_triplet(
		&self,
		identity: &str,
		token: &str,
		session_tag: &str,
		expires_at: DateTime<Utc>,
	) -> Result<(), StoreError> {
		(**self)
			.store_triplet(identity, token, session_tag, expires_at)
			.await
	}

	async fn clean_triplet(&self, identity: &str, session_tag: &str) -> Result<(), StoreError> {
		(**self).clean_triplet(identity, session_tag).await
	}

	async fn clean_all_triplets(&self, identity: &str) -> Result<(), StoreError> {
		(**self).clean_all_triplets(identity).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lookup_serializes_snake_case() {
		assert_eq!(
			serde_json::to_string(&TripletLookup::NotFound).unwrap(),
			"\"not_found\""
		);
		assert_eq!(
			serde_json::from_str::<TripletLookup>("\"invalid\"").unwrap(),
			TripletLookup::Invalid
		);
	}

	#[test]
	fn lookup_displays_snake_case() {
		assert_eq!(TripletLookup::Found.to_string(), "found");
		assert_eq!(TripletLookup::NotFound.to_string(), "not_found");
		assert_eq!(TripletLookup::Invalid.to_string(), "invalid");
	}
}
