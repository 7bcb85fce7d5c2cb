// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persistent ("remember me") logins with rotating triplets.
//!
//! Each remembered login is a lineage identified by `(identity, session_tag)`
//! whose token is replaced on every successful use:
//!
//! - [`Triplet`] and the codec in [`triplet`] handle the
//!   `identity|token|session_tag` credential string
//! - [`TripletStore`] is the persistence contract, answering lookups with a
//!   [`TripletLookup`]
//! - [`CredentialCarrier`] moves the credential to and from the client
//! - [`RememberMe`] is the engine tying them together: [`validate`],
//!   [`issue`] and [`revoke`]
//!
//! # Security Notes
//!
//! - Tokens and session tags are 128-bit values from the OS CSPRNG
//! - A token seen again after rotation flags the lineage as stolen; the
//!   engine drops the credential and can purge every lineage of the identity
//! - Token values are never logged
//!
//! [`validate`]: RememberMe::validate
//! [`issue`]: RememberMe::issue
//! [`revoke`]: RememberMe::revoke

pub mod carrier;
pub mod config;
pub mod engine;
pub mod error;
pub mod salt;
pub mod store;
pub mod token;
pub mod triplet;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use carrier::CredentialCarrier;
pub use config::{
	RememberMeConfig, RememberMeConfigLayer, DEFAULT_CREDENTIAL_NAME, DEFAULT_EXPIRY_SECS,
	MAX_EXPIRY_SECS,
};
pub use engine::RememberMe;
pub use error::{CarrierError, ConfigError, RememberMeError, Result, StoreError};
pub use salt::{fingerprint, salted};
pub use store::{TripletLookup, TripletStore};
pub use token::{generate_token, is_token_format};
pub use triplet::{ParseError, Triplet, DELIMITER};
