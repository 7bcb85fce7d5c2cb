// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory triplet store for tests, development and single-process setups.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loom_rememberme_core::{StoreError, TripletLookup, TripletStore};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::lineage::{hash_material, LineageInfo};

#[derive(Debug, Clone)]
struct Entry {
	token: String,
	created_at: DateTime<Utc>,
	updated_at: DateTime<Utc>,
	expires_at: DateTime<Utc>,
}

/// Triplets keyed by identity, then session tag.
///
/// Each call takes the lock once, so single-key reads and writes are atomic.
#[derive(Debug, Default)]
pub struct MemoryTripletStore {
	lineages: RwLock<HashMap<String, HashMap<String, Entry>>>,
}

impl MemoryTripletStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Live lineages of `identity`, oldest first.
	pub async fn lineages(&self, identity: &str) -> Vec<LineageInfo> {
		let now = Utc::now();
		let lineages = self.lineages.read().await;
		let mut infos: Vec<LineageInfo> = lineages
			.get(identity)
			.into_iter()
			.flat_map(|tags| tags.iter())
			.filter(|(_, entry)| entry.expires_at > now)
			.map(|(session_tag, entry)| LineageInfo {
				identity: identity.to_string(),
				session_tag_hash: hash_material(session_tag),
				created_at: entry.created_at,
				updated_at: entry.updated_at,
				expires_at: entry.expires_at,
			})
			.collect();
		infos.sort_by_key(|info| info.created_at);
		infos
	}

	/// Drop lineages that expired at or before `now`. Returns how many went.
	#[instrument(skip(self))]
	pub async fn clean_expired_triplets(&self, now: DateTime<Utc>) -> u64 {
		let mut lineages = self.lineages.write().await;
		let mut removed = 0u64;
		lineages.retain(|_, tags| {
			let before = tags.len();
			tags.retain(|_, entry| entry.expires_at > now);
			removed += (before - tags.len()) as u64;
			!tags.is_empty()
		});
		debug!(removed, "expired remember-me lineages removed");
		removed
	}

	/// Total number of stored lineages, expired or not.
	pub async fn len(&self) -> usize {
		self.lineages.read().await.values().map(HashMap::len).sum()
	}

	pub async fn is_empty(&self) -> bool {
		self.len().await == 0
	}
}

#[async_trait]
impl TripletStore for MemoryTripletStore {
	#[instrument(skip_all, fields(identity = %identity))]
	async fn find_triplet(
		&self,
		identity: &str,
		token: &str,
		session_tag: &str,
	) -> Result<TripletLookup, StoreError> {
		let lineages = self.lineages.read().await;
		let lookup = match lineages.get(identity).and_then(|tags| tags.get(session_tag)) {
			Some(entry) if entry.expires_at <= Utc::now() => TripletLookup::NotFound,
			Some(entry) if entry.token == token => TripletLookup::Found,
			Some(_) => TripletLookup::Invalid,
			None => TripletLookup::NotFound,
		};
		debug!(%lookup, "triplet lookup");
		Ok(lookup)
	}

	#[instrument(skip_all, fields(identity = %identity))]
	async fn store_triplet(
		&self,
		identity: &str,
		token: &str,
		session_tag: &str,
		expires_at: DateTime<Utc>,
	) -> Result<(), StoreError> {
		let now = Utc::now();
		let mut lineages = self.lineages.write().await;
		let tags = lineages.entry(identity.to_string()).or_default();
		match tags.get_mut(session_tag) {
			Some(entry) => {
				entry.token = token.to_string();
				entry.updated_at = now;
				entry.expires_at = expires_at;
			}
			None => {
				tags.insert(
					session_tag.to_string(),
					Entry {
						token: token.to_string(),
						created_at: now,
						updated_at: now,
						expires_at,
					},
				);
			}
		}
		Ok(())
	}

	#[instrument(skip_all, fields(identity = %identity))]
	async fn clean_triplet(&self, identity: &str, session_tag: &str) -> Result<(), StoreError> {
		let mut lineages = self.lineages.write().await;
		if let Some(tags) = lineages.get_mut(identity) {
			tags.remove(session_tag);
			if tags.is_empty() {
				lineages.remove(identity);
			}
		}
		Ok(())
	}

	#[instrument(skip_all, fields(identity = %identity))]
	async fn clean_all_triplets(&self, identity: &str) -> Result<(), StoreError> {
		let removed = self
			.lineages
			.write()
			.await
			.remove(identity)
			.map(|tags| tags.len())
			.unwrap_or(0);
		debug!(removed, "all remember-me lineages removed for identity");
		Ok(())
	}
}
