// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client fingerprint salt.
//!
//! Binds a credential to the headers of the browser it was issued to, so a
//! copied cookie replayed from another client misses its lineage.

use http::HeaderMap;
use loom_rememberme_core::fingerprint;

/// Headers that make up the fingerprint, in order.
pub const FINGERPRINT_HEADERS: &[&str] = &["user-agent"];

/// Fingerprint of the request, or `None` when none of the headers are present.
///
/// Absent or non-UTF-8 headers contribute an empty component.
pub fn fingerprint_salt(headers: &HeaderMap) -> Option<String> {
	let components: Vec<&str> = FINGERPRINT_HEADERS
		.iter()
		.map(|name| {
			headers
				.get(*name)
				.and_then(|value| value.to_str().ok())
				.map(str::trim)
				.unwrap_or("")
		})
		.collect();

	if components.iter().all(|c| c.is_empty()) {
		return None;
	}
	Some(fingerprint(components))
}

#[cfg(test)]
mod tests {
	use super::*;
	use http::header::USER_AGENT;
	use http::HeaderValue;

	fn with_agent(agent: &'static str) -> HeaderMap {
		let mut headers = HeaderMap::new();
		headers.insert(USER_AGENT, HeaderValue::from_static(agent));
		headers
	}

	#[test]
	fn no_headers_means_no_salt() {
		assert_eq!(fingerprint_salt(&HeaderMap::new()), None);
	}

	#[test]
	fn blank_agent_means_no_salt() {
		assert_eq!(fingerprint_salt(&with_agent("   ")), None);
	}

	#[test]
	fn same_agent_same_salt() {
		let a = fingerprint_salt(&with_agent("Mozilla Firefox 4.0")).unwrap();
		let b = fingerprint_salt(&with_agent("Mozilla Firefox 4.0")).unwrap();
		assert_eq!(a, b);
		assert_eq!(a.len(), 64);
	}

	#[test]
	fn different_agents_differ() {
		assert_ne!(
			fingerprint_salt(&with_agent("Mozilla Firefox 4.0")),
			fingerprint_salt(&with_agent("curl/8.0"))
		);
	}

	#[test]
	fn salt_never_contains_raw_header() {
		let salt = fingerprint_salt(&with_agent("Mozilla Firefox 4.0")).unwrap();
		assert!(!salt.contains("Mozilla"));
	}
}
