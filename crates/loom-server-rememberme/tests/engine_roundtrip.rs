// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Engine flows against the real stores.

use std::sync::Arc;

use loom_rememberme_core::testing::RecordingCarrier;
use loom_rememberme_core::{
	CredentialCarrier, RememberMe, RememberMeConfig, Triplet, TripletLookup, TripletStore,
	DEFAULT_CREDENTIAL_NAME,
};
use loom_server_rememberme::{ensure_schema, MemoryTripletStore, SqliteTripletStore};
use sqlx::sqlite::SqlitePoolOptions;

async fn sqlite_store() -> SqliteTripletStore {
	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.connect("sqlite::memory:")
		.await
		.unwrap();
	ensure_schema(&pool).await.unwrap();
	SqliteTripletStore::new(pool)
}

fn current_credential<C: CredentialCarrier>(carrier: &C) -> Option<String> {
	carrier.read(DEFAULT_CREDENTIAL_NAME).unwrap()
}

// ============================================================================
// SQLite
// ============================================================================

#[tokio::test]
async fn issue_then_validate_rotates_token() {
	let store = sqlite_store().await;
	let mut engine = RememberMe::new(store.clone(), RecordingCarrier::new());

	engine.issue("1", None).await.unwrap();
	let issued = Triplet::parse(&current_credential(engine.carrier()).unwrap()).unwrap();

	assert!(engine.validate("1", None).await.unwrap());
	assert!(!engine.was_invalid());

	let rotated = Triplet::parse(&current_credential(engine.carrier()).unwrap()).unwrap();
	assert_eq!(rotated.identity(), "1");
	assert_eq!(rotated.session_tag(), issued.session_tag());
	assert_ne!(rotated.token(), issued.token());

	assert_eq!(store.list_lineages("1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn replayed_token_is_flagged_and_purges_when_enabled() {
	let store = sqlite_store().await;
	let config = RememberMeConfig::default().with_clean_on_invalid(true);

	// A second device of the same user.
	let mut other_device =
		RememberMe::with_config(store.clone(), RecordingCarrier::new(), config.clone());
	other_device.issue("1", None).await.unwrap();

	let mut victim =
		RememberMe::with_config(store.clone(), RecordingCarrier::new(), config.clone());
	victim.issue("1", None).await.unwrap();
	let stolen = current_credential(victim.carrier()).unwrap();

	// Victim logs in first, rotating the token the attacker copied.
	assert!(victim.validate("1", None).await.unwrap());

	let mut attacker_carrier = RecordingCarrier::new();
	attacker_carrier.seed(DEFAULT_CREDENTIAL_NAME, stolen);
	let mut attacker = RememberMe::with_config(store.clone(), attacker_carrier, config);

	assert!(!attacker.validate("1", None).await.unwrap());
	assert!(attacker.was_invalid());
	assert_eq!(current_credential(attacker.carrier()), None);

	assert!(store.list_lineages("1").await.unwrap().is_empty());
	assert!(!victim.validate("1", None).await.unwrap());
	assert!(!other_device.validate("1", None).await.unwrap());
}

#[tokio::test]
async fn replayed_token_keeps_lineages_by_default() {
	let store = sqlite_store().await;
	let mut victim = RememberMe::new(store.clone(), RecordingCarrier::new());
	victim.issue("1", None).await.unwrap();
	let stolen = current_credential(victim.carrier()).unwrap();
	assert!(victim.validate("1", None).await.unwrap());

	let mut attacker_carrier = RecordingCarrier::new();
	attacker_carrier.seed(DEFAULT_CREDENTIAL_NAME, stolen);
	let mut attacker = RememberMe::new(store.clone(), attacker_carrier);

	assert!(!attacker.validate("1", None).await.unwrap());
	assert!(attacker.was_invalid());
	assert_eq!(store.list_lineages("1").await.unwrap().len(), 1);
	assert!(victim.validate("1", None).await.unwrap());
}

#[tokio::test]
async fn revoke_removes_only_its_lineage() {
	let store = sqlite_store().await;
	let mut laptop = RememberMe::new(store.clone(), RecordingCarrier::new());
	let mut phone = RememberMe::new(store.clone(), RecordingCarrier::new());
	laptop.issue("1", None).await.unwrap();
	phone.issue("1", None).await.unwrap();

	laptop.revoke("1", None).await.unwrap();

	assert_eq!(current_credential(laptop.carrier()), None);
	assert_eq!(store.list_lineages("1").await.unwrap().len(), 1);
	assert!(phone.validate("1", None).await.unwrap());
}

#[tokio::test]
async fn salt_binds_credential_to_client() {
	let store = sqlite_store().await;
	let mut engine = RememberMe::new(store.clone(), RecordingCarrier::new());
	engine.issue("1", Some("Mozilla Firefox 4.0")).await.unwrap();

	assert!(!engine.is_remembered("1", Some("curl/8.0")).await.unwrap());
	assert!(engine.is_remembered("1", Some("Mozilla Firefox 4.0")).await.unwrap());

	assert!(!engine.validate("1", Some("curl/8.0")).await.unwrap());
	assert!(!engine.was_invalid());
	assert!(engine.validate("1", Some("Mozilla Firefox 4.0")).await.unwrap());
}

// ============================================================================
// Memory
// ============================================================================

#[tokio::test]
async fn memory_store_supports_full_lifecycle() {
	let store = Arc::new(MemoryTripletStore::new());
	let mut engine = RememberMe::new(Arc::clone(&store), RecordingCarrier::new());

	engine.issue("alice@example.com", None).await.unwrap();
	let issued = Triplet::parse(&current_credential(engine.carrier()).unwrap()).unwrap();
	assert_eq!(
		store
			.find_triplet("alice@example.com", issued.token(), issued.session_tag())
			.await
			.unwrap(),
		TripletLookup::Found
	);

	assert!(engine.validate("alice@example.com", None).await.unwrap());
	assert_eq!(
		store
			.find_triplet("alice@example.com", issued.token(), issued.session_tag())
			.await
			.unwrap(),
		TripletLookup::Invalid
	);

	engine.revoke("alice@example.com", None).await.unwrap();
	assert!(store.is_empty().await);
}
