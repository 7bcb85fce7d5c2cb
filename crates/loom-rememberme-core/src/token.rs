// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Random token generation.

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

/// Bytes of entropy per token (128 bits).
pub const TOKEN_BYTES: usize = 16;

/// Minimum hex length accepted as a token on the wire.
pub const MIN_TOKEN_HEX_LEN: usize = TOKEN_BYTES * 2;

/// Generate a lowercase hex token from the OS CSPRNG.
///
/// Used for both rotating tokens and session tags.
pub fn generate_token() -> String {
	let mut bytes = Zeroizing::new([0u8; TOKEN_BYTES]);
	OsRng.fill_bytes(bytes.as_mut());
	hex::encode(bytes.as_ref())
}

/// Generate a token guaranteed to differ from `previous`.
pub fn generate_token_unlike(previous: &str) -> String {
	loop {
		let token = generate_token();
		if token != previous {
			return token;
		}
	}
}

/// Whether `value` looks like a token this crate produced.
pub fn is_token_format(value: &str) -> bool {
	value.len() >= MIN_TOKEN_HEX_LEN
		&& value
			.bytes()
			.all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashSet;

	#[test]
	fn generated_tokens_are_32_lowercase_hex() {
		for _ in 0..100 {
			let token = generate_token();
			assert_eq!(token.len(), 32);
			assert!(is_token_format(&token), "bad token: {token}");
		}
	}

	#[test]
	fn generated_tokens_are_unique() {
		let tokens: HashSet<String> = (0..1000).map(|_| generate_token()).collect();
		assert_eq!(tokens.len(), 1000);
	}

	#[test]
	fn unlike_differs_from_previous() {
		let previous = generate_token();
		assert_ne!(generate_token_unlike(&previous), previous);
	}

	#[test]
	fn format_check() {
		assert!(is_token_format("78b1e6d775cec5260001af137a79dbd5"));
		assert!(is_token_format(
			"78b1e6d775cec5260001af137a79dbd578b1e6d775cec5260001af137a79dbd5"
		));
		assert!(!is_token_format("78B1E6D775CEC5260001AF137A79DBD5"));
		assert!(!is_token_format("78b1e6d775cec5260001af137a79dbd"));
		assert!(!is_token_format("zzb1e6d775cec5260001af137a79dbd5"));
		assert!(!is_token_format(""));
	}
}

#[cfg(test)]
mod proptests {
	use super::*;
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn token_always_matches_wire_format(_seed in 0u64..1000) {
			let token = generate_token();
			prop_assert!(is_token_format(&token), "token should be lowercase hex: {}", token);
			prop_assert!(!token.contains(crate::DELIMITER));
		}
	}
}
