// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The remember-me login engine.
//!
//! # Flow
//!
//! ```text
//! carrier.read ─► parse ─► store.find_triplet
//!   ├─ Found    ─► store new token, write rotated credential ─► true
//!   ├─ NotFound ─► (nothing)                                  ─► false
//!   └─ Invalid  ─► expire credential, maybe purge identity    ─► false
//! ```
//!
//! A successful login rotates the token but keeps the session tag, so a
//! token that was already rotated away and shows up again means two parties
//! hold the same credential. The engine cannot tell the thief from the owner,
//! so it drops the presented credential and, when
//! [`clean_on_invalid`](RememberMeConfig::clean_on_invalid) is set, every
//! lineage of the identity.
//!
//! # Concurrency
//!
//! Two requests presenting the same token before either rotation lands both
//! see `Found` and both rotate; the last store write wins and the other
//! client's next visit reads as a replay. Stores that need to avoid this must
//! serialize rotation per `(identity, session_tag)`.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, instrument, warn};

use crate::carrier::CredentialCarrier;
use crate::config::{validate_expiry_secs, RememberMeConfig};
use crate::error::{ConfigError, RememberMeError, Result};
use crate::salt::salted;
use crate::store::{TripletLookup, TripletStore};
use crate::token::{generate_token, generate_token_unlike};
use crate::triplet::{serialize, validate_identity, Triplet};

/// Rotating-triplet login engine.
///
/// Owns the carrier for the current client and shares the store. Build one
/// per request.
pub struct RememberMe<S, C> {
	store: S,
	carrier: C,
	config: RememberMeConfig,
	was_invalid: bool,
}

impl<S, C> RememberMe<S, C>
where
	S: TripletStore,
	C: CredentialCarrier,
{
	/// Create an engine with the default configuration.
	pub fn new(store: S, carrier: C) -> Self {
		Self::with_config(store, carrier, RememberMeConfig::default())
	}

	pub fn with_config(store: S, carrier: C, config: RememberMeConfig) -> Self {
		Self {
			store,
			carrier,
			config,
			was_invalid: false,
		}
	}

	/// Log `identity` in from the carried credential, rotating its token.
	///
	/// Returns `Ok(false)` when there is no usable credential, when it belongs
	/// to another identity, when the store does not know it, or when it was a
	/// replay (see [`was_invalid`](Self::was_invalid)). Only collaborator
	/// failures are errors.
	#[instrument(
		name = "rememberme.validate",
		skip_all,
		fields(identity = %identity, salted = salt.is_some_and(|s| !s.is_empty()), lookup)
	)]
	pub async fn validate(&mut self, identity: &str, salt: Option<&str>) -> Result<bool> {
		let Some(triplet) = self.read_credential()? else {
			return Ok(false);
		};

		if triplet.identity() != identity {
			debug!(
				credential_identity = %triplet.identity(),
				"credential belongs to a different identity"
			);
			return Ok(false);
		}

		let lookup_token = salted(triplet.token(), salt);
		let lookup_tag = salted(triplet.session_tag(), salt);

		let lookup = self
			.store
			.find_triplet(identity, &lookup_token, &lookup_tag)
			.await?;
		tracing::Span::current().record("lookup", tracing::field::display(lookup));

		match lookup {
			TripletLookup::Found => {
				let token = generate_token_unlike(triplet.token());
				let expires_at = self.expires_at()?;

				self.store
					.store_triplet(identity, &salted(&token, salt), &lookup_tag, expires_at)
					.await?;
				self.carrier.write(
					&self.config.credential_name,
					&serialize(identity, &token, triplet.session_tag()),
					expires_at,
				)?;

				debug!(expires_at = %expires_at, "remember-me token rotated");
				Ok(true)
			}
			TripletLookup::NotFound => {
				debug!("no remember-me lineage for credential");
				Ok(false)
			}
			TripletLookup::Invalid => {
				self.was_invalid = true;
				warn!(
					clean_on_invalid = self.config.clean_on_invalid,
					"stale remember-me token presented, possible credential theft"
				);

				self.expire_credential()?;
				if self.config.clean_on_invalid {
					self.store.clean_all_triplets(identity).await?;
				}
				Ok(false)
			}
		}
	}

	/// Start a new lineage for `identity` and hand its credential to the carrier.
	#[instrument(
		name = "rememberme.issue",
		skip_all,
		fields(identity = %identity, salted = salt.is_some_and(|s| !s.is_empty()))
	)]
	pub async fn issue(&mut self, identity: &str, salt: Option<&str>) -> Result<()> {
		validate_identity(identity).map_err(RememberMeError::InvalidIdentity)?;

		let token = generate_token();
		let session_tag = generate_token();
		let expires_at = self.expires_at()?;

		self.store
			.store_triplet(
				identity,
				&salted(&token, salt),
				&salted(&session_tag, salt),
				expires_at,
			)
			.await?;
		self.carrier.write(
			&self.config.credential_name,
			&serialize(identity, &token, &session_tag),
			expires_at,
		)?;

		debug!(expires_at = %expires_at, "remember-me credential issued");
		Ok(())
	}

	/// End the lineage named by the carried credential.
	///
	/// Sibling lineages of the same identity are left alone. The carrier is
	/// told to drop the credential even when it could not be parsed.
	#[instrument(
		name = "rememberme.revoke",
		skip_all,
		fields(identity = %identity, had_credential)
	)]
	pub async fn revoke(&mut self, identity: &str, salt: Option<&str>) -> Result<()> {
		let triplet = self.read_credential()?;
		tracing::Span::current().record("had_credential", triplet.is_some());

		self.expire_credential()?;

		if let Some(triplet) = triplet {
			self.store
				.clean_triplet(identity, &salted(triplet.session_tag(), salt))
				.await?;
			debug!("remember-me lineage revoked");
		}
		Ok(())
	}

	/// Whether the carried credential is current for `identity`.
	///
	/// Read-only: no rotation, no theft response, `was_invalid` untouched.
	#[instrument(name = "rememberme.is_remembered", skip_all, fields(identity = %identity))]
	pub async fn is_remembered(&self, identity: &str, salt: Option<&str>) -> Result<bool> {
		let Some(triplet) = self.read_credential()? else {
			return Ok(false);
		};
		if triplet.identity() != identity {
			return Ok(false);
		}

		let lookup = self
			.store
			.find_triplet(
				identity,
				&salted(triplet.token(), salt),
				&salted(triplet.session_tag(), salt),
			)
			.await?;
		Ok(lookup == TripletLookup::Found)
	}

	/// Identity named by the carried credential, if it parses.
	///
	/// The value is unauthenticated until [`validate`](Self::validate) agrees.
	pub fn claimed_identity(&self) -> Result<Option<String>> {
		Ok(self
			.read_credential()?
			.map(|triplet| triplet.identity().to_string()))
	}

	/// Whether a replayed token was seen since this engine was built.
	pub fn was_invalid(&self) -> bool {
		self.was_invalid
	}

	pub fn credential_name(&self) -> &str {
		&self.config.credential_name
	}

	pub fn set_credential_name(&mut self, name: impl Into<String>) {
		self.config.credential_name = name.into();
	}

	pub fn expiry(&self) -> Duration {
		self.config.expiry
	}

	/// Values outside `1..=MAX_EXPIRY_SECS` seconds make `issue` and a
	/// successful `validate` fail with [`RememberMeError::Config`].
	pub fn set_expiry(&mut self, expiry: Duration) {
		self.config.expiry = expiry;
	}

	pub fn clean_on_invalid(&self) -> bool {
		self.config.clean_on_invalid
	}

	pub fn set_clean_on_invalid(&mut self, enabled: bool) {
		self.config.clean_on_invalid = enabled;
	}

	pub fn config(&self) -> &RememberMeConfig {
		&self.config
	}

	pub fn store(&self) -> &S {
		&self.store
	}

	pub fn carrier(&self) -> &C {
		&self.carrier
	}

	pub fn carrier_mut(&mut self) -> &mut C {
		&mut self.carrier
	}

	/// Take the carrier back, e.g. to flush cookies into a response.
	pub fn into_carrier(self) -> C {
		self.carrier
	}

	/// Read and decode the credential; malformed values read as absent.
	fn read_credential(&self) -> Result<Option<Triplet>> {
		let Some(raw) = self.carrier.read(&self.config.credential_name)? else {
			debug!("no remember-me credential present");
			return Ok(None);
		};

		match Triplet::parse(&raw) {
			Ok(triplet) => Ok(Some(triplet)),
			Err(e) => {
				debug!(error = %e, "ignoring malformed remember-me credential");
				Ok(None)
			}
		}
	}

	fn expire_credential(&mut self) -> Result<()> {
		self.carrier
			.write(&self.config.credential_name, "", DateTime::<Utc>::UNIX_EPOCH)?;
		Ok(())
	}

	/// Expiry for a credential written now.
	///
	/// The config can be changed through [`set_expiry`](Self::set_expiry)
	/// without validation, so the bounds are checked on every use.
	fn expires_at(&self) -> Result<DateTime<Utc>> {
		validate_expiry_secs(self.config.expiry.num_seconds())?;
		Utc::now()
			.checked_add_signed(self.config.expiry)
			.ok_or_else(|| {
				ConfigError::invalid_value("expiry_secs", "overflows the representable date range")
					.into()
			})
	}
}


#[cfg(test)]
mod proptests {
	use super::*;
	use crate::testing::{RecordingCarrier, RecordingStore};
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn rotation_keeps_identity_and_tag(
			identity in "[a-zA-Z0-9@._-]{1,32}",
			token in "[a-f0-9]{32}",
			session_tag in "[a-f0-9]{32}",
		) {
			let mut carrier = RecordingCarrier::new();
			carrier.seed("REMEMBERME", serialize(&identity, &token, &session_tag));
			let store = RecordingStore::answering(TripletLookup::Found);
			let mut engine = RememberMe::new(store, carrier);

			let ok = tokio_test::block_on(engine.validate(&identity, None)).unwrap();
			prop_assert!(ok);

			let write = engine.carrier().writes().last().cloned().unwrap();
			let rotated = Triplet::parse(&write.value).unwrap();
			prop_assert_eq!(rotated.identity(), identity.as_str());
			prop_assert_eq!(rotated.session_tag(), session_tag.as_str());
			prop_assert_ne!(rotated.token(), token.as_str());
		}

		#[test]
		fn garbage_never_touches_collaborators(raw in "[^|]{0,64}") {
			let mut carrier = RecordingCarrier::new();
			carrier.seed("REMEMBERME", raw);
			let store = RecordingStore::answering(TripletLookup::Invalid);
			let mut engine = RememberMe::new(store, carrier);

			let ok = tokio_test::block_on(engine.validate("1", None)).unwrap();
			prop_assert!(!ok);
			prop_assert!(engine.store().calls().is_empty());
			prop_assert!(engine.carrier().writes().is_empty());
			prop_assert!(!engine.was_invalid());
		}
	}
}
