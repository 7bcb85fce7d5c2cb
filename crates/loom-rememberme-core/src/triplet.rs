// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential codec.
//!
//! A remember-me credential is a single string carrying three fields:
//!
//! ```text
//! <identity>|<token>|<session_tag>
//! ```
//!
//! There is no escaping. Tokens and session tags are hex so they never
//! contain the delimiter; identities are checked with [`validate_identity`]
//! before a credential is issued.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Separator between the three credential fields.
pub const DELIMITER: char = '|';

/// Reasons a raw credential cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
	/// The value does not split into exactly three fields.
	#[error("expected 3 fields, found {0}")]
	FieldCount(usize),

	/// One of the fields is empty.
	#[error("credential field `{0}` is empty")]
	EmptyField(&'static str),
}

/// The `(identity, token, session_tag)` credential unit.
///
/// Token material is zeroized on drop and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Triplet {
	identity: String,
	token: String,
	session_tag: String,
}

impl Triplet {
	pub fn new(
		identity: impl Into<String>,
		token: impl Into<String>,
		session_tag: impl Into<String>,
	) -> Self {
		Self {
			identity: identity.into(),
			token: token.into(),
			session_tag: session_tag.into(),
		}
	}

	/// Decode a raw credential value.
	pub fn parse(raw: &str) -> Result<Self, ParseError> {
		let fields: Vec<&str> = raw.split(DELIMITER).collect();
		let [identity, token, session_tag] = fields.as_slice() else {
			return Err(ParseError::FieldCount(fields.len()));
		};

		for (name, value) in [
			("identity", identity),
			("token", token),
			("session_tag", session_tag),
		] {
			if value.is_empty() {
				return Err(ParseError::EmptyField(name));
			}
		}

		Ok(Self::new(*identity, *token, *session_tag))
	}

	/// Encode into the wire format.
	pub fn encode(&self) -> String {
		serialize(&self.identity, &self.token, &self.session_tag)
	}

	pub fn identity(&self) -> &str {
		&self.identity
	}

	pub fn token(&self) -> &str {
		&self.token
	}

	pub fn session_tag(&self) -> &str {
		&self.session_tag
	}
}

impl FromStr for Triplet {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl fmt::Debug for Triplet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Triplet")
			.field("identity", &self.identity)
			.field("token", &"[REDACTED]")
			.field("session_tag", &"[REDACTED]")
			.finish()
	}
}

/// Join the three fields into a credential value.
pub fn serialize(identity: &str, token: &str, session_tag: &str) -> String {
	format!("{identity}{DELIMITER}{token}{DELIMITER}{session_tag}")
}

/// Check that an identity can round-trip through the codec.
///
/// Returns a human-readable reason when it cannot.
pub fn validate_identity(identity: &str) -> Result<(), String> {
	if identity.is_empty() {
		return Err("identity must not be empty".to_string());
	}
	if identity.contains(DELIMITER) {
		return Err(format!("identity must not contain '{DELIMITER}'"));
	}
	Ok(())
}
