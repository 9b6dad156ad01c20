//! Service layer for the JSON admin panel.
//! - `storage`: the JSON-file record store and its backups.
//! - `auth`: credential verification and session tokens.
//! - Clear error types in `errors`.

pub mod errors;
pub mod auth;
pub mod runtime;
pub mod storage;
