// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential carrier contract.
//!
//! A carrier moves the credential string between the engine and the client:
//! an HTTP cookie, a file on disk, a header, local storage. Writing a value
//! whose expiry is already in the past tells the carrier to discard it.

use chrono::{DateTime, Utc};

use crate::error::CarrierError;

pub trait CredentialCarrier: Send {
	/// Current value stored under `name`, if any.
	fn read(&self, name: &str) -> Result<Option<String>, CarrierError>;

	/// Store `value` under `name` until `expires_at`.
	fn write(&mut self, name: &str, value: &str, expires_at: DateTime<Utc>)
		-> Result<(), CarrierError>;
}

impl<T: CredentialCarrier + ?Sized> CredentialCarrier for &mut T {
	fn read(&self, name: &str) -> Result<Option<String>, CarrierError> {
		(**self).read(name)
	}

	fn write(
		&mut self,
		name: &str,
		value: &str,
		expires_at: DateTime<Utc>,
	) -> Result<(), CarrierError> {
		(**self).write(name, value, expires_at)
	}
}

impl<T: CredentialCarrier + ?Sized> CredentialCarrier for Box<T> {
	fn read(&self, name: &str) -> Result<Option<String>, CarrierError> {
		(**self).read(name)
	}

	fn write(
		&mut self,
		name: &str,
		value: &str,
		expires_at: DateTime<Utc>,
	) -> Result<(), CarrierError> {
		(**self).write(name, value, expires_at)
	}
}
