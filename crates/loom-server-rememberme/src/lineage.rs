// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Lineage metadata shared by the store implementations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Public view of one stored lineage. Never carries token material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineageInfo {
	pub identity: String,
	/// SHA-256 hex of the (salted) session tag.
	pub session_tag_hash: String,
	pub created_at: DateTime<Utc>,
	/// Last issue or rotation.
	pub updated_at: DateTime<Utc>,
	pub expires_at: DateTime<Utc>,
}

impl LineageInfo {
	pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
		self.expires_at <= now
	}
}

/// SHA-256 hex digest of token or session tag material.
pub fn hash_material(value: &str) -> String {
	hex::encode(Sha256::digest(value.as_bytes()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;

	#[test]
	fn hash_is_stable_lowercase_hex() {
		let hash = hash_material("0e0530c1430da76495955eb06eb99d95");
		assert_eq!(hash.len(), 64);
		assert_eq!(hash, hash_material("0e0530c1430da76495955eb06eb99d95"));
		assert!(hash.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
	}

	#[test]
	fn salted_material_hashes_differently() {
		assert_ne!(
			hash_material("0e0530c1430da76495955eb06eb99d95"),
			hash_material("0e0530c1430da76495955eb06eb99d95Mozilla Firefox 4.0")
		);
	}

	#[test]
	fn expiry_boundary() {
		let now = Utc::now();
		let info = LineageInfo {
			identity: "1".to_string(),
			session_tag_hash: hash_material("tag"),
			created_at: now,
			updated_at: now,
			expires_at: now,
		};
		assert!(info.is_expired_at(now));
		assert!(!info.is_expired_at(now - Duration::seconds(1)));
	}
}
