// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP glue for Loom remember-me logins.
//!
//! [`CookieCarrier`] carries the credential in a cookie: it reads the request
//! `Cookie` headers and collects `Set-Cookie` headers for the response.
//! [`fingerprint_salt`] derives a per-client salt from request headers.

pub mod cookie;
pub mod fingerprint;

pub use cookie::{CookieAttributes, CookieCarrier, SameSite};
pub use fingerprint::{fingerprint_salt, FINGERPRINT_HEADERS};
