// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cookie-based credential carrier.
//!
//! Build a [`CookieCarrier`] from the request headers, run the engine, then
//! copy the collected `Set-Cookie` headers onto the response with
//! [`CookieCarrier::apply_to`]. Reads made after a write see the written
//! value, so the carrier reflects what the client will hold once the
//! response lands.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use http::header::{COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue};
use loom_rememberme_core::{CarrierError, CredentialCarrier};
use tracing::debug;

/// `Expires` attribute format (IMF-fixdate).
const EXPIRES_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
	Strict,
	#[default]
	Lax,
	None,
}

impl fmt::Display for SameSite {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Strict => write!(f, "Strict"),
			Self::Lax => write!(f, "Lax"),
			Self::None => write!(f, "None"),
		}
	}
}

/// Attributes attached to every `Set-Cookie` the carrier emits.
///
/// Defaults to `Path=/; Secure; HttpOnly; SameSite=Lax`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttributes {
	pub path: String,
	pub domain: Option<String>,
	pub secure: bool,
	pub http_only: bool,
	pub same_site: SameSite,
}

impl Default for CookieAttributes {
	fn default() -> Self {
		Self {
			path: "/".to_string(),
			domain: None,
			secure: true,
			http_only: true,
			same_site: SameSite::Lax,
		}
	}
}

impl CookieAttributes {
	pub fn with_path(mut self, path: impl Into<String>) -> Self {
		self.path = path.into();
		self
	}

	pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
		self.domain = Some(domain.into());
		self
	}

	/// Set to `false` only for plain-HTTP development servers.
	pub fn with_secure(mut self, secure: bool) -> Self {
		self.secure = secure;
		self
	}

	pub fn with_http_only(mut self, http_only: bool) -> Self {
		self.http_only = http_only;
		self
	}

	pub fn with_same_site(mut self, same_site: SameSite) -> Self {
		self.same_site = same_site;
		self
	}
}

#[derive(Debug, Default)]
pub struct CookieCarrier {
	request: HashMap<String, String>,
	/// Writes made while handling this request; `None` means removed.
	written: HashMap<String, Option<String>>,
	set_cookies: Vec<HeaderValue>,
	attributes: CookieAttributes,
}

impl CookieCarrier {
	/// Parse every `Cookie` header of the request. The first occurrence of a
	/// name wins.
	pub fn from_headers(headers: &HeaderMap) -> Self {
		let mut request = HashMap::new();
		for header in headers.get_all(COOKIE) {
			let Ok(value) = header.to_str() else {
				continue;
			};
			for pair in value.split(';') {
				let Some((name, value)) = pair.trim().split_once('=') else {
					continue;
				};
				request
					.entry(name.trim().to_string())
					.or_insert_with(|| value.trim().to_string());
			}
		}

		Self {
			request,
			..Self::default()
		}
	}

	pub fn with_attributes(mut self, attributes: CookieAttributes) -> Self {
		self.attributes = attributes;
		self
	}

	pub fn attributes(&self) -> &CookieAttributes {
		&self.attributes
	}

	/// `Set-Cookie` values collected so far, in write order.
	pub fn set_cookie_headers(&self) -> &[HeaderValue] {
		&self.set_cookies
	}

	/// Append the collected `Set-Cookie` headers to a response.
	pub fn apply_to(&self, headers: &mut HeaderMap) {
		for value in &self.set_cookies {
			headers.append(SET_COOKIE, value.clone());
		}
	}

	pub fn into_set_cookie_headers(self) -> Vec<HeaderValue> {
		self.set_cookies
	}

	fn render(
		&self,
		name: &str,
		value: &str,
		expires_at: DateTime<Utc>,
		now: DateTime<Utc>,
	) -> Result<String, CarrierError> {
		if name.is_empty() || !name.bytes().all(is_token_byte) {
			return Err(CarrierError::invalid_value(
				name,
				"cookie name must be a non-empty HTTP token",
			));
		}
		if let Some(b) = value.bytes().find(|b| !is_cookie_octet(*b)) {
			return Err(CarrierError::invalid_value(
				name,
				format!("byte 0x{b:02x} is not allowed in a cookie value"),
			));
		}

		let max_age = (expires_at - now).num_seconds().max(0);
		let mut cookie = format!(
			"{name}={value}; Expires={}; Max-Age={max_age}; Path={}",
			expires_at.format(EXPIRES_FORMAT),
			self.attributes.path
		);
		if let Some(domain) = &self.attributes.domain {
			cookie.push_str("; Domain=");
			cookie.push_str(domain);
		}
		if self.attributes.secure {
			cookie.push_str("; Secure");
		}
		if self.attributes.http_only {
			cookie.push_str("; HttpOnly");
		}
		cookie.push_str("; SameSite=");
		cookie.push_str(&self.attributes.same_site.to_string());
		Ok(cookie)
	}
}

impl CredentialCarrier for CookieCarrier {
	fn read(&self, name: &str) -> Result<Option<String>, CarrierError> {
		if let Some(written) = self.written.get(name) {
			return Ok(written.clone());
		}
		Ok(self.request.get(name).cloned())
	}

	fn write(
		&mut self,
		name: &str,
		value: &str,
		expires_at: DateTime<Utc>,
	) -> Result<(), CarrierError> {
		let now = Utc::now();
		let cookie = self.render(name, value, expires_at, now)?;
		let header = HeaderValue::from_str(&cookie)
			.map_err(|e| CarrierError::invalid_value(name, e.to_string()))?;

		let expired = expires_at <= now;
		self.written
			.insert(name.to_string(), (!expired).then(|| value.to_string()));
		self.set_cookies.push(header);

		debug!(cookie = %name, expired, "set-cookie queued");
		Ok(())
	}
}

// RFC 6265 cookie-octet.
fn is_cookie_octet(b: u8) -> bool {
	matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

// RFC 7230 tchar.
fn is_token_byte(b: u8) -> bool {
	b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}


#[cfg(test)]
mod proptests {
	use super::*;
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn written_credential_reads_back_from_set_cookie(
			identity in "[a-zA-Z0-9@._-]{1,32}",
			token in "[a-f0-9]{32}",
			session_tag in "[a-f0-9]{32}",
		) {
			let value = format!("{identity}|{token}|{session_tag}");
			let mut carrier = CookieCarrier::default();
			carrier
				.write("REMEMBERME", &value, Utc::now() + chrono::Duration::days(1))
				.unwrap();

			// Feed the Set-Cookie name=value pair back as a request cookie.
			let set_cookie = carrier.set_cookie_headers()[0].to_str().unwrap().to_string();
			let pair = set_cookie.split(';').next().unwrap().to_string();
			let mut headers = HeaderMap::new();
			headers.insert(COOKIE, HeaderValue::from_str(&pair).unwrap());

			let next = CookieCarrier::from_headers(&headers);
			prop_assert_eq!(next.read("REMEMBERME").unwrap(), Some(value));
		}
	}
}
