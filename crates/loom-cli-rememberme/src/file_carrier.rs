// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential carrier backed by a JSON file.
//!
//! Plays the part of the client's cookie jar for command line use. The file
//! maps credential names to `{ "value", "expires_at" }` and is rewritten
//! atomically on every write.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use loom_rememberme_core::{CarrierError, CredentialCarrier};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedCredential {
	pub value: String,
	pub expires_at: DateTime<Utc>,
}

/// On-disk carrier format.
pub type PersistedCarrier = HashMap<String, PersistedCredential>;

#[derive(Debug)]
pub struct FileCarrier {
	path: PathBuf,
	entries: PersistedCarrier,
}

impl FileCarrier {
	/// Open the carrier at `path`. A missing file is an empty carrier.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, CarrierError> {
		let path = path.into();
		let entries = if path.exists() {
			let contents = std::fs::read_to_string(&path).map_err(CarrierError::backend)?;
			serde_json::from_str(&contents).map_err(CarrierError::backend)?
		} else {
			HashMap::new()
		};
		Ok(Self { path, entries })
	}

	/// Expiry of the live credential stored under `name`, if any.
	pub fn expires_at(&self, name: &str) -> Option<DateTime<Utc>> {
		self.entries
			.get(name)
			.map(|entry| entry.expires_at)
			.filter(|expires_at| *expires_at > Utc::now())
	}

	fn persist(&self) -> Result<(), CarrierError> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			std::fs::create_dir_all(parent).map_err(CarrierError::backend)?;
		}

		let contents = serde_json::to_string_pretty(&self.entries).map_err(CarrierError::backend)?;
		let temp_path = self.path.with_extension("tmp");
		std::fs::write(&temp_path, contents).map_err(CarrierError::backend)?;

		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			let perms = std::fs::Permissions::from_mode(0o600);
			if let Err(e) = std::fs::set_permissions(&temp_path, perms) {
				warn!(path = ?temp_path, error = %e, "Failed to set file permissions to 0600");
			}
		}

		std::fs::rename(&temp_path, &self.path).map_err(CarrierError::backend)?;
		debug!(path = ?self.path, "credential file written");
		Ok(())
	}
}

impl CredentialCarrier for FileCarrier {
	fn read(&self, name: &str) -> Result<Option<String>, CarrierError> {
		Ok(self
			.entries
			.get(name)
			.filter(|entry| entry.expires_at > Utc::now())
			.map(|entry| entry.value.clone()))
	}

	fn write(
		&mut self,
		name: &str,
		value: &str,
		expires_at: DateTime<Utc>,
	) -> Result<(), CarrierError> {
		if expires_at <= Utc::now() {
			self.entries.remove(name);
		} else {
			self.entries.insert(
				name.to_string(),
				PersistedCredential {
					value: value.to_string(),
					expires_at,
				},
			);
		}
		self.persist()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;

	const CREDENTIAL: &str = "1|78b1e6d775cec5260001af137a79dbd5|0e0530c1430da76495955eb06eb99d95";

	#[test]
	fn missing_file_reads_as_empty() {
		let dir = tempfile::tempdir().unwrap();
		let carrier = FileCarrier::open(dir.path().join("creds.json")).unwrap();
		assert_eq!(carrier.read("REMEMBERME").unwrap(), None);
	}

	#[test]
	fn write_survives_reopen() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested").join("creds.json");

		let mut carrier = FileCarrier::open(&path).unwrap();
		carrier
			.write("REMEMBERME", CREDENTIAL, Utc::now() + Duration::days(1))
			.unwrap();

		let reopened = FileCarrier::open(&path).unwrap();
		assert_eq!(
			reopened.read("REMEMBERME").unwrap().as_deref(),
			Some(CREDENTIAL)
		);
		assert!(!path.with_extension("tmp").exists());
	}

	#[test]
	fn expiry_reflects_last_write() {
		let dir = tempfile::tempdir().unwrap();
		let mut carrier = FileCarrier::open(dir.path().join("creds.json")).unwrap();
		assert_eq!(carrier.expires_at("REMEMBERME"), None);

		let expires_at = Utc::now() + Duration::days(1);
		carrier.write("REMEMBERME", CREDENTIAL, expires_at).unwrap();
		assert_eq!(carrier.expires_at("REMEMBERME"), Some(expires_at));

		carrier
			.write("REMEMBERME", "", DateTime::<Utc>::UNIX_EPOCH)
			.unwrap();
		assert_eq!(carrier.expires_at("REMEMBERME"), None);
	}

	#[test]
	fn expired_write_removes_entry() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("creds.json");

		let mut carrier = FileCarrier::open(&path).unwrap();
		carrier
			.write("REMEMBERME", CREDENTIAL, Utc::now() + Duration::days(1))
			.unwrap();
		carrier
			.write("REMEMBERME", "", DateTime::<Utc>::UNIX_EPOCH)
			.unwrap();

		let stored: PersistedCarrier =
			serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
		assert!(stored.is_empty());
	}

	#[test]
	fn stale_entry_is_ignored() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("creds.json");
		let stale: PersistedCarrier = HashMap::from([(
			"REMEMBERME".to_string(),
			PersistedCredential {
				value: CREDENTIAL.to_string(),
				expires_at: Utc::now() - Duration::minutes(1),
			},
		)]);
		std::fs::write(&path, serde_json::to_string(&stale).unwrap()).unwrap();

		let carrier = FileCarrier::open(&path).unwrap();
		assert_eq!(carrier.read("REMEMBERME").unwrap(), None);
	}

	#[test]
	fn corrupt_file_is_backend_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("creds.json");
		std::fs::write(&path, "not json").unwrap();

		let err = FileCarrier::open(&path).unwrap_err();
		assert!(matches!(err, CarrierError::Backend(_)));
	}

	#[cfg(unix)]
	#[test]
	fn file_is_private() {
		use std::os::unix::fs::PermissionsExt;

		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("creds.json");
		let mut carrier = FileCarrier::open(&path).unwrap();
		carrier
			.write("REMEMBERME", CREDENTIAL, Utc::now() + Duration::days(1))
			.unwrap();

		let mode = std::fs::metadata(&path).unwrap().permissions().mode();
		assert_eq!(mode & 0o777, 0o600);
	}
}
