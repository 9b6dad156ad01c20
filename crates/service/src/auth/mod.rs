//! Auth module: credential verification and session tokens.
//!
//! The admin account check sits behind [`credentials::CredentialVerifier`] so
//! the HTTP layer never touches a concrete user store.

pub mod domain;
pub mod errors;
pub mod credentials;
pub mod service;

pub use credentials::{CredentialVerifier, StaticCredentials};
pub use service::AuthService;
