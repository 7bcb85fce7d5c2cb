// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Salt composition.
//!
//! A salt is an opaque string appended to the token and session tag before
//! they reach the store. The credential handed to the client always carries
//! the bare values, so a stolen credential only resolves when presented with
//! the same salt (for example, the same client fingerprint).

use sha2::{Digest, Sha256};

/// Append `salt` to `value`.
///
/// `None` and the empty string leave the value unchanged.
pub fn salted(value: &str, salt: Option<&str>) -> String {
	match salt {
		Some(salt) if !salt.is_empty() => {
			let mut out = String::with_capacity(value.len() + salt.len());
			out.push_str(value);
			out.push_str(salt);
			out
		}
		_ => value.to_string(),
	}
}

/// Derive a fixed-length hex salt from client attributes.
///
/// Each component is hashed behind its big-endian `u64` byte length, so no
/// two distinct component lists share an input: `["ab", "c"]`, `["a", "bc"]`,
/// `["a", ""]` and `["a\0"]` all give different salts.
pub fn fingerprint<I, S>(components: I) -> String
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut hasher = Sha256::new();
	for component in components {
		let bytes = component.as_ref().as_bytes();
		hasher.update((bytes.len() as u64).to_be_bytes());
		hasher.update(bytes);
	}
	hex::encode(hasher.finalize())
}
