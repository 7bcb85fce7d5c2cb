// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Recording fakes for the store and carrier contracts.
//!
//! Enabled for this crate's tests and, through the `testing` feature, for
//! downstream crates.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::carrier::CredentialCarrier;
use crate::error::{CarrierError, StoreError};
use crate::store::{TripletLookup, TripletStore};

/// A call received by [`RecordingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
	Find {
		identity: String,
		token: String,
		session_tag: String,
	},
	Store {
		identity: String,
		token: String,
		session_tag: String,
		expires_at: DateTime<Utc>,
	},
	Clean {
		identity: String,
		session_tag: String,
	},
	CleanAll {
		identity: String,
	},
}

/// Store that answers every lookup with a fixed result and records calls.
#[derive(Debug)]
pub struct RecordingStore {
	lookup: TripletLookup,
	calls: Mutex<Vec<StoreCall>>,
	failure: Mutex<Option<String>>,
}

impl RecordingStore {
	pub fn answering(lookup: TripletLookup) -> Self {
		Self {
			lookup,
			calls: Mutex::new(Vec::new()),
			failure: Mutex::new(None),
		}
	}

	/// Make every following call fail with [`StoreError::Unavailable`].
	pub fn fail_with(&self, message: impl Into<String>) {
		*lock(&self.failure) = Some(message.into());
	}

	/// Calls received so far, oldest first.
	pub fn calls(&self) -> Vec<StoreCall> {
		lock(&self.calls).clone()
	}

	fn record(&self, call: StoreCall) -> Result<(), StoreError> {
		if let Some(message) = lock(&self.failure).clone() {
			return Err(StoreError::Unavailable(message));
		}
		lock(&self.calls).push(call);
		Ok(())
	}
}

#[async_trait]
impl TripletStore for RecordingStore {
	async fn find_triplet(
		&self,
		identity: &str,
		token: &str,
		session_tag: &str,
	) -> Result<TripletLookup, StoreError> {
		self.record(StoreCall::Find {
			identity: identity.to_string(),
			token: token.to_string(),
			session_tag: session_tag.to_string(),
		})?;
		Ok(self.lookup)
	}

	async fn store_triplet(
		&self,
		identity: &str,
		token: &str,
		session_tag: &str,
		expires_at: DateTime<Utc>,
	) -> Result<(), StoreError> {
		self.record(StoreCall::Store {
			identity: identity.to_string(),
			token: token.to_string(),
			session_tag: session_tag.to_string(),
			expires_at,
		})
	}

	async fn clean_triplet(&self, identity: &str, session_tag: &str) -> Result<(), StoreError> {
		self.record(StoreCall::Clean {
			identity: identity.to_string(),
			session_tag: session_tag.to_string(),
		})
	}

	async fn clean_all_triplets(&self, identity: &str) -> Result<(), StoreError> {
		self.record(StoreCall::CleanAll {
			identity: identity.to_string(),
		})
	}
}

/// A write received by [`RecordingCarrier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierWrite {
	pub name: String,
	pub value: String,
	pub expires_at: DateTime<Utc>,
}

/// In-memory carrier that records writes.
///
/// Reads see the latest write; a write with a past expiry removes the value.
#[derive(Debug, Default)]
pub struct RecordingCarrier {
	values: HashMap<String, String>,
	writes: Vec<CarrierWrite>,
	write_failure: Option<String>,
}

impl RecordingCarrier {
	pub fn new() -> Self {
		Self::default()
	}

	/// Place a value as if the client had sent it. Not recorded as a write.
	pub fn seed(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.values.insert(name.into(), value.into());
	}

	/// Make every following write fail.
	pub fn fail_writes(&mut self, message: impl Into<String>) {
		self.write_failure = Some(message.into());
	}

	pub fn writes(&self) -> &[CarrierWrite] {
		&self.writes
	}
}

impl CredentialCarrier for RecordingCarrier {
	fn read(&self, name: &str) -> Result<Option<String>, CarrierError> {
		Ok(self.values.get(name).cloned())
	}

	fn write(
		&mut self,
		name: &str,
		value: &str,
		expires_at: DateTime<Utc>,
	) -> Result<(), CarrierError> {
		if let Some(message) = &self.write_failure {
			return Err(CarrierError::backend(message.clone()));
		}

		self.writes.push(CarrierWrite {
			name: name.to_string(),
			value: value.to_string(),
			expires_at,
		});
		if expires_at <= Utc::now() {
			self.values.remove(name);
		} else {
			self.values.insert(name.to_string(), value.to_string());
		}
		Ok(())
	}
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|e| e.into_inner())
}
