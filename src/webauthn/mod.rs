//! # WebAuthn Module
//!
//! Server side of the passkey handshakes.
//!
//! ## Submodules
//! - `types`: Request/response bodies for the API
//! - `registration`: Creating new passkey credentials
//! - `authentication`: Logging in with existing passkeys
//!
//! ## Flow Overview
//!
//! ### Registration
//! 1. Client requests options → `registration::start_registration()`
//! 2. Client calls `navigator.credentials.create()` with them
//! 3. Client posts the attestation → `registration::finish_registration()`
//!
//! ### Login
//! 1. Client requests options → `authentication::start_authentication()`
//! 2. Client calls `navigator.credentials.get()`; the authenticator signs the challenge
//! 3. Client posts the assertion → `authentication::finish_authentication()`
//! 4. On success the handler stores the user id in the session

pub mod authentication;
pub mod registration;
pub mod types;
