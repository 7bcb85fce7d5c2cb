// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Triplet stores for Loom remember-me logins.
//!
//! - [`MemoryTripletStore`] keeps lineages in process memory
//! - [`SqliteTripletStore`] persists them in SQLite, hashing key material
//!
//! Both treat expired lineages as absent, so an expired credential
//! validates as `NotFound` rather than as a theft signal.

pub mod error;
pub mod lineage;
pub mod memory;
pub mod pool;
pub mod sqlite;

pub use error::{RememberMeDbError, Result};
pub use lineage::{hash_material, LineageInfo};
pub use memory::MemoryTripletStore;
pub use pool::{create_pool, ensure_schema};
pub use sqlite::SqliteTripletStore;
